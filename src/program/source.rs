//! Intcode program text.
//!
//! The format is the usual puzzle-input layout:
//! - integers separated by commas and/or whitespace
//! - `#` starts a comment that runs to the end of the line
//! - blank lines are ignored

use std::path::Path;
use std::io::Write;
use thiserror::Error;

/// Words written per line by [`save_program`].
const WORDS_PER_LINE: usize = 16;

/// Parse program text into words.
pub fn parse_program(text: &str) -> Result<Vec<i64>, ProgramError> {
    let mut words = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let code = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        };

        for token in code.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let word = token.parse::<i64>().map_err(|_| ProgramError::ParseError {
                line: line_num + 1,
                token: token.to_string(),
            })?;
            words.push(word);
        }
    }

    Ok(words)
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<i64>, ProgramError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    parse_program(&text)
}

/// Save a program file to disk.
pub fn save_program<P: AsRef<Path>>(path: P, program: &[i64]) -> Result<(), ProgramError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;

    writeln!(file, "# Intcode program")
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    writeln!(file, "# {} words", program.len())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;

    for chunk in program.chunks(WORDS_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(|w| w.to_string()).collect();
        writeln!(file, "{},", line.join(","))
            .map_err(|e| ProgramError::IoError(e.to_string()))?;
    }

    Ok(())
}

/// Errors that can occur while reading program text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {token:?} is not an integer")]
    ParseError { line: usize, token: String },
}
