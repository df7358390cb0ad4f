use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{SmtError, SmtResult};
use crate::model::tokenizer::TrainingPair;

/// Column separator of a corpus line: `requirement<TAB>defect`.
pub const CORPUS_SEPARATOR: char = '\t';

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Parses corpus lines into training pairs.
///
/// # Format
/// - One pair per line, requirement text and defect text separated by a tab
/// - Blank lines and lines starting with `#` are skipped
/// - Text after the first tab is the defect side (further tabs stay in it)
///
/// # Errors
/// Returns `MalformedCorpus` with the 1-based line number when a non-blank
/// line has no tab.
pub fn parse_pairs<S: AsRef<str>>(lines: &[S]) -> SmtResult<Vec<TrainingPair>> {
	let mut pairs = Vec::with_capacity(lines.len());
	for (index, line) in lines.iter().enumerate() {
		let line = line.as_ref();
		let trimmed = line.trim();
		if trimmed.is_empty() || trimmed.starts_with('#') {
			continue;
		}
		match line.split_once(CORPUS_SEPARATOR) {
			Some((requirement, defect)) => pairs.push(TrainingPair::new(requirement.trim(), defect.trim())),
			None => {
				return Err(SmtError::MalformedCorpus {
					line: index + 1,
					reason: "missing tab between requirement and defect".to_owned(),
				});
			}
		}
	}
	Ok(pairs)
}

/// Reads a corpus file into training pairs. See [`parse_pairs`] for the format.
pub fn read_pairs<P: AsRef<Path>>(filename: P) -> SmtResult<Vec<TrainingPair>> {
	let lines = read_file(filename)?;
	parse_pairs(&lines)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/corpus.tsv` + `"bin"` → `data/corpus.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Writes `bytes` to `path` atomically.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a half-written model.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let parent = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(parent)?;

	let mut temp_file = NamedTempFile::new_in(parent)?;
	temp_file.write_all(bytes)?;
	temp_file.flush()?;
	temp_file.persist(path).map_err(|e| e.error)?;
	Ok(())
}
