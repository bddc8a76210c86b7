use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coords::CoordinateMapper;
use crate::error::{PileupError, PileupResult};
use crate::lod::DetailFlags;

/// A region as it arrives with a request, before validation.
///
/// Every field the caller may omit is an `Option`; `validate` is the only
/// place these are checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    #[serde(default)]
    pub chr: Option<String>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub pixel_width: Option<u32>,
    #[serde(default)]
    pub reversed: bool,
    #[serde(default)]
    pub x_offset: Option<u32>,
}

impl RegionSpec {
    pub fn new(chr: impl Into<String>, start: i64, stop: i64, pixel_width: u32) -> Self {
        Self {
            chr: Some(chr.into()),
            start: Some(start),
            stop: Some(stop),
            pixel_width: Some(pixel_width),
            reversed: false,
            x_offset: None,
        }
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn at_offset(mut self, x_offset: u32) -> Self {
        self.x_offset = Some(x_offset);
        self
    }

    /// Check the fields and build a `Region`. `default_offset` is used when no
    /// explicit `x_offset` was given (regions are then laid out left to right).
    pub fn validate(&self, index: usize, default_offset: u32) -> PileupResult<Region> {
        let chr = match self.chr.as_deref().map(str::trim) {
            Some(chr) if !chr.is_empty() => chr.to_string(),
            _ => {
                return Err(PileupError::validation(format!(
                    "region {index} is missing its chromosome"
                )))
            }
        };
        let (start, stop) = match (self.start, self.stop) {
            (Some(start), Some(stop)) => (start, stop),
            _ => {
                return Err(PileupError::validation(format!(
                    "region {index} ({chr}) has missing or non-integer bounds"
                )))
            }
        };
        if start < 1 {
            return Err(PileupError::validation(format!(
                "region {index} ({chr}) start must be positive, got {start}"
            )));
        }
        if stop < start {
            return Err(PileupError::validation(format!(
                "region {index} ({chr}) start ({start}) must not exceed stop ({stop})"
            )));
        }
        let pixel_width = match self.pixel_width {
            Some(w) if w > 0 => w,
            _ => {
                return Err(PileupError::validation(format!(
                    "region {index} ({chr}) needs a positive pixel width"
                )))
            }
        };

        Ok(Region::new(
            chr,
            start as u64,
            stop as u64,
            self.x_offset.unwrap_or(default_offset),
            pixel_width,
            self.reversed,
        ))
    }
}

impl FromStr for RegionSpec {
    type Err = PileupError;

    /// Parse `chr:start-stop`; the pixel width is left unset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PileupError::validation(format!("invalid region '{s}': expected 'chr:start-stop'"));
        let (chr, rest) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (start_str, stop_str) = rest.split_once('-').ok_or_else(invalid)?;
        let parse = |v: &str| -> Result<i64, PileupError> {
            v.trim().replace(',', "").parse::<i64>().map_err(|_| {
                PileupError::validation(format!("invalid coordinate '{v}' in region '{s}'"))
            })
        };
        Ok(Self {
            chr: Some(chr.to_string()),
            start: Some(parse(start_str)?),
            stop: Some(parse(stop_str)?),
            ..Default::default()
        })
    }
}

/// A validated genomic region and the pixel band it occupies on the canvas.
///
/// Coordinates are 1-based. The visible window is `[start, stop)`: the band's
/// `pixel_width` columns hold `stop - start` bases, so `stop` itself maps to
/// the band's right edge and is not drawn. A region with `start == stop`
/// still shows its one base.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub chr: String,
    pub start: u64,
    pub stop: u64,
    pub x_offset: u32,
    pub pixel_width: u32,
    pub reversed: bool,
    pub bp_per_pixel: f64,
    pub detail: DetailFlags,
    /// Uppercase reference bases covering the visible window, when fetched
    pub reference: Option<String>,
}

impl Region {
    pub fn new(chr: impl Into<String>, start: u64, stop: u64, x_offset: u32, pixel_width: u32, reversed: bool) -> Self {
        let span = stop.saturating_sub(start).max(1);
        Self {
            chr: chr.into(),
            start,
            stop,
            x_offset,
            pixel_width,
            reversed,
            bp_per_pixel: span as f64 / pixel_width.max(1) as f64,
            detail: DetailFlags::default(),
            reference: None,
        }
    }

    /// Pixels per nucleotide.
    pub fn nt_width(&self) -> f64 {
        1.0 / self.bp_per_pixel
    }

    /// Exclusive end of the visible window.
    pub fn end(&self) -> u64 {
        self.stop.max(self.start + 1)
    }

    pub fn contains(&self, pos: i64) -> bool {
        pos >= self.start as i64 && pos < self.end() as i64
    }

    /// Does `[ref_start, ref_start + ref_len)` touch the visible window?
    pub fn intersects(&self, ref_start: i64, ref_len: u32) -> bool {
        let end = ref_start + ref_len.max(1) as i64;
        ref_start < self.end() as i64 && end > self.start as i64
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self)
    }

    pub fn with_detail(mut self, detail: DetailFlags) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_reference(mut self, reference: String) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Reference base at an absolute position, if cached and in range.
    pub fn reference_base(&self, pos: i64) -> Option<u8> {
        if !self.contains(pos) {
            return None;
        }
        let reference = self.reference.as_ref()?;
        reference.as_bytes().get((pos - self.start as i64) as usize).copied()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.stop)
    }
}
