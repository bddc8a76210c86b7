//! External record and reference providers.
//!
//! The pipeline pulls record lines through an iterator; dropping the iterator
//! is how it stops a source early once the record cap is reached.

use std::collections::HashMap;

use thiserror::Error;

use crate::region::Region;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown sequence: {0}")]
    UnknownSequence(String),

    #[error("Interval {start}-{stop} is outside {chr} (length {len})")]
    OutOfRange { chr: String, start: u64, stop: u64, len: u64 },

    #[error("{0}")]
    Other(String),
}

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<String, SourceError>> + 'a>;

/// Yields raw tab-delimited alignment lines overlapping a region.
pub trait AlignmentSource {
    fn records<'a>(&'a self, region: &Region) -> Result<RecordIter<'a>, SourceError>;
}

/// Returns uppercase reference bases for `chr:start-stop` (1-based, inclusive).
///
/// An interval running off the end of the contig yields the bases that exist.
pub trait ReferenceSource: Send + Sync {
    fn fetch(&self, chr: &str, start: u64, stop: u64) -> Result<String, SourceError>;
}

/// Alignment lines held in memory, filtered by contig when read.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlignments {
    lines: Vec<String>,
}

impl MemoryAlignments {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect() }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl AlignmentSource for MemoryAlignments {
    fn records<'a>(&'a self, region: &Region) -> Result<RecordIter<'a>, SourceError> {
        let chr = region.chr.clone();
        Ok(Box::new(
            self.lines
                .iter()
                .filter(move |line| line.split('\t').nth(2) == Some(chr.as_str()))
                .map(|line| Ok(line.clone())),
        ))
    }
}

/// Reference sequences held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReference {
    sequences: HashMap<String, String>,
}

impl MemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, chr: impl Into<String>, bases: impl AsRef<str>) -> Self {
        self.sequences.insert(chr.into(), bases.as_ref().to_ascii_uppercase());
        self
    }
}

impl ReferenceSource for MemoryReference {
    fn fetch(&self, chr: &str, start: u64, stop: u64) -> Result<String, SourceError> {
        let seq = self.sequences.get(chr).ok_or_else(|| SourceError::UnknownSequence(chr.to_string()))?;
        slice_reference(chr, seq, start, stop)
    }
}

/// Cut `start..=stop` (1-based) out of a whole contig. A `stop` past the end
/// of the contig is cut short; only a `start` outside it is an error.
pub fn slice_reference(chr: &str, seq: &str, start: u64, stop: u64) -> Result<String, SourceError> {
    let len = seq.len() as u64;
    if start == 0 || start > stop || start > len {
        return Err(SourceError::OutOfRange { chr: chr.to_string(), start, stop, len });
    }
    Ok(seq[(start - 1) as usize..stop.min(len) as usize].to_string())
}
