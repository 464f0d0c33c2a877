use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::level::{Level, ParseError, parse_header};

/// Error type for level-collection loading.
#[derive(Debug, Error)]
pub enum LevelsError {
    /// IO error when reading from file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// One of the levels in the file failed to parse (1-indexed)
    #[error("level {index}: {source}")]
    Level { index: usize, source: ParseError },
}

/// A collection of levels read from a single file.
///
/// The file holds any number of levels in the usual text format (size
/// header followed by that many rows). Blank lines and lines starting with
/// `;` separate and annotate levels, as in XSB level packs.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Level>,
}

impl Levels {
    pub fn from_text(contents: &str) -> Result<Self, LevelsError> {
        let mut levels = Vec::new();
        let mut lines = contents.lines();

        while let Some(line) = lines.next() {
            // Skip comments and separators between levels; blank lines
            // *inside* a level body are rows and consumed below.
            if line.trim().is_empty() || line.trim_start().starts_with(';') {
                continue;
            }

            let index = levels.len() + 1;
            let (_, height) =
                parse_header(line).map_err(|source| LevelsError::Level { index, source })?;

            let mut text = String::from(line);
            for _ in 0..height {
                match lines.next() {
                    Some(row) => {
                        text.push('\n');
                        text.push_str(row);
                    }
                    // Missing trailing rows stay empty
                    None => break,
                }
            }

            let level =
                Level::from_text(&text).map_err(|source| LevelsError::Level { index, source })?;
            levels.push(level);
        }

        debug!(count = levels.len(), "level collection loaded");
        Ok(Levels { levels })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Get the nth level (0-indexed) for mutation.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Level> {
        self.levels.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }
}
