use crate::assets::ASSET_DIR;
use itertools::Itertools;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const EMBEDDED_WORDS: &str = "words.txt";

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("word list needs at least two distinct words, found {0}")]
    TooFewWords(usize),
    #[error("embedded word list is missing or not UTF-8")]
    MissingEmbedded,
}

/// Candidate target words: one per line, whitespace stripped, blank lines
/// skipped. Always holds at least two distinct words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn parse(text: &str) -> Result<Self, WordListError> {
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let distinct = words.iter().unique().count();
        if distinct < 2 {
            return Err(WordListError::TooFewWords(distinct));
        }
        Ok(Self { words })
    }

    pub fn from_file(path: &Path) -> Result<Self, WordListError> {
        let text = fs::read_to_string(path).map_err(|source| WordListError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// The list compiled into the binary.
    pub fn embedded() -> Result<Self, WordListError> {
        let text = ASSET_DIR
            .get_file(EMBEDDED_WORDS)
            .and_then(|f| f.contents_utf8())
            .ok_or(WordListError::MissingEmbedded)?;
        Self::parse(text)
    }

    /// `path` when given, the embedded list otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, WordListError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
