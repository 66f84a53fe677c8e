//! The program loader for LS-8.
//!
//! Programs are plain text, one byte per line written as a binary literal. Everything from `#` to the
//! end of a line is a comment, and blank lines are skipped.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use nom_locate::LocatedSpan;
use thiserror::Error;

use crate::plat::MEMORY_SIZE;

pub mod lexer;

pub type Span<'a> = LocatedSpan<&'a str>;

/// An error for the loader module of LS-8.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed program line at ({line}:{column}): {text:?}")]
    MalformedLine {
        line: usize,
        column: usize,
        text: String,
    },
    #[error("program of {0} bytes does not fit in memory (max {})", MEMORY_SIZE)]
    ProgramTooLarge(usize),
}

/// Parses program text into a memory image starting at address 0.
pub fn parse_program(program: &str) -> Result<Vec<u8>, LoadError> {
    let bytes = lexer::lex_program(program)?;
    if bytes.len() > MEMORY_SIZE {
        return Err(LoadError::ProgramTooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Reads and parses the program file at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read program file {}", path.display()))?;
    let bytes =
        parse_program(&text).with_context(|| format!("failed to load {}", path.display()))?;
    log::info!("loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_too_large() {
        let prog = "00000001\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(
            parse_program(&prog).unwrap_err(),
            LoadError::ProgramTooLarge(MEMORY_SIZE + 1)
        );
        let prog = "00000001\n".repeat(MEMORY_SIZE);
        assert_eq!(parse_program(&prog).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file("/definitely/not/a/program.ls8").unwrap_err();
        assert!(err.to_string().contains("failed to read program file"));
    }

    #[test]
    fn test_load_demo_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/print8.ls8");
        assert_eq!(
            load_file(path).unwrap(),
            [0x82, 0x00, 0x08, 0x47, 0x00, 0x01]
        );
    }
}
