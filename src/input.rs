//! Candidate-handle acquisition and normalization.
//!
//! Raw input is newline-separated bytes from a file or stdin. Lines are
//! trimmed and empty lines dropped; duplicates are kept as-is. The resulting
//! list is immutable for the lifetime of a run and cheap to share across
//! worker tasks.

use crate::scan::plan::Range;
use anyhow::{bail, Context, Result};
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

/// Ordered, immutable list of candidate handles.
#[derive(Debug, Clone)]
pub struct NameList {
    names: Arc<[String]>,
}

impl NameList {
    /// Builds the list from newline-separated text, trimming whitespace and
    /// dropping empty lines.
    pub fn from_lines(data: &str) -> Self {
        let names: Vec<String> = data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        Self {
            names: names.into(),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_lines(&String::from_utf8_lossy(data))
    }

    /// Reads handles from a file. Unreadable input is fatal to the run.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read handle list {}", path.display()))?;
        Ok(Self::from_bytes(&data))
    }

    /// Reads handles piped on stdin. An interactive terminal with nothing
    /// piped is an input error rather than a silent empty run.
    pub fn from_stdin() -> Result<Self> {
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            bail!("pass a file path or pipe handles on stdin");
        }

        let mut data = Vec::new();
        stdin
            .read_to_end(&mut data)
            .context("failed to read handles from stdin")?;
        Ok(Self::from_bytes(&data))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// The handles owned by one worker's range. An out-of-bounds range yields
    /// an empty slice rather than panicking.
    pub fn slice(&self, range: Range) -> &[String] {
        self.names.get(range.start..range.end).unwrap_or(&[])
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self {
            names: names.into(),
        }
    }
}

impl<'a> IntoIterator for &'a NameList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
