use serde::{Deserialize, Serialize};

/// Visual category of a box derived from one CIGAR operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxOp {
    Match,
    Mismatch,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    Pad,
}

impl BoxOp {
    /// Operations whose boxes carry read bases.
    pub fn consumes_sequence(&self) -> bool {
        matches!(self, BoxOp::Match | BoxOp::Mismatch | BoxOp::Insertion | BoxOp::SoftClip)
    }

    /// Operations drawn as filled rectangles.
    pub fn is_filled(&self) -> bool {
        matches!(self, BoxOp::Match | BoxOp::Mismatch | BoxOp::SoftClip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl From<bool> for Strand {
    fn from(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl From<Strand> for bool {
    fn from(strand: Strand) -> Self {
        matches!(strand, Strand::Forward)
    }
}

/// A box as produced by the CIGAR walk.
///
/// `seq_offset` points into the owning segment's read sequence and is only
/// set for operations that consume it. It is dropped when the box becomes a
/// `RenderBox`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBox {
    pub op: BoxOp,
    /// Reference coordinate (1-based); may be < 1 for a leading soft clip
    pub ref_start: i64,
    pub ref_len: u32,
    pub seq_offset: Option<usize>,
    /// Read bases covered; differs from `ref_len` for insertions
    pub read_len: u32,
}

impl ParsedBox {
    pub fn ref_end(&self) -> i64 {
        self.ref_start + self.ref_len as i64
    }
}

/// A render-ready box with its bases and qualities resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBox {
    pub op: BoxOp,
    pub ref_start: i64,
    pub ref_len: u32,
    /// Inserted or aligned bases, when the read carries a sequence
    pub bases: Option<Vec<u8>>,
    /// Phred qualities (already offset-decoded), when the read carries them
    pub qualities: Option<Vec<u8>>,
    pub read_len: u32,
}

impl RenderBox {
    pub fn ref_end(&self) -> i64 {
        self.ref_start + self.ref_len as i64
    }

    pub fn mean_quality(&self) -> Option<u8> {
        let quals = self.qualities.as_ref().filter(|q| !q.is_empty())?;
        let sum: u32 = quals.iter().map(|&q| q as u32).sum();
        Some((sum / quals.len() as u32) as u8)
    }
}

/// Per-read facts shared by the parsed and render-ready segment forms.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMeta {
    pub query_name: String,
    pub is_forward: bool,
    pub region_index: usize,
    pub pixel_x1: f64,
    pub pixel_x2: f64,
    pub is_first_in_pair: bool,
    pub is_last_in_pair: bool,
    /// Mate contig when it differs from the region's contig
    pub mate_chr: Option<String>,
}

impl SegmentMeta {
    pub fn strand(&self) -> Strand {
        Strand::from(self.is_forward)
    }
}

/// One parsed alignment record: visible boxes plus the raw read data the
/// boxes' `seq_offset`s refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSegment {
    pub meta: SegmentMeta,
    pub boxes: Vec<ParsedBox>,
    pub sequence: Option<Vec<u8>>,
    pub qualities: Option<Vec<u8>>,
}

/// A render-ready segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub meta: SegmentMeta,
    /// CIGAR boxes ordered by `ref_start`
    pub boxes: Vec<RenderBox>,
    /// Length-1 boxes synthesised by reference comparison, drawn after `boxes`
    pub mismatches: Vec<RenderBox>,
    /// Sub-row inside the template's row, assigned by overlap resolution
    pub sub_row: usize,
}

/// Anything with a horizontal pixel extent that can be packed into rows.
pub trait PixelSpan {
    fn pixel_x1(&self) -> f64;
    fn pixel_x2(&self) -> f64;
}

impl PixelSpan for ParsedSegment {
    fn pixel_x1(&self) -> f64 {
        self.meta.pixel_x1
    }
    fn pixel_x2(&self) -> f64 {
        self.meta.pixel_x2
    }
}

impl PixelSpan for Segment {
    fn pixel_x1(&self) -> f64 {
        self.meta.pixel_x1
    }
    fn pixel_x2(&self) -> f64 {
        self.meta.pixel_x2
    }
}

/// The unit being stacked: one read, or all segments sharing a query name.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<S> {
    pub query_name: String,
    pub segments: Vec<S>,
    pub pixel_x1: f64,
    pub pixel_x2: f64,
    pub stack_index: usize,
}

impl<S: PixelSpan> Template<S> {
    pub fn new(query_name: impl Into<String>, first: S) -> Self {
        let (x1, x2) = (first.pixel_x1(), first.pixel_x2());
        Self {
            query_name: query_name.into(),
            segments: vec![first],
            pixel_x1: x1,
            pixel_x2: x2,
            stack_index: 0,
        }
    }

    /// Add a segment and widen the template span to cover it.
    pub fn push(&mut self, segment: S) {
        self.pixel_x1 = self.pixel_x1.min(segment.pixel_x1());
        self.pixel_x2 = self.pixel_x2.max(segment.pixel_x2());
        self.segments.push(segment);
    }
}

impl<S> PixelSpan for Template<S> {
    fn pixel_x1(&self) -> f64 {
        self.pixel_x1
    }
    fn pixel_x2(&self) -> f64 {
        self.pixel_x2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectorStyle {
    /// Mates spatially separated
    Dashed,
    /// Mates meet at base level
    Solid,
}

/// A horizontal line joining segments of one template.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub x1: f64,
    pub x2: f64,
    pub style: ConnectorStyle,
    /// Drawn between `sub_row` and `sub_row + 1` for `Solid`, inside it for `Dashed`
    pub sub_row: usize,
}

/// A template with final segments, vertical placement and connectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTemplate {
    pub query_name: String,
    pub segments: Vec<Segment>,
    pub pixel_x1: f64,
    pub pixel_x2: f64,
    pub stack_index: usize,
    pub y: u32,
    /// Base row height times the number of sub-rows
    pub row_height: u32,
    pub sub_rows: usize,
    pub connectors: Vec<Connector>,
}

/// A status notice drawn above the pileup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    pub height: u32,
    pub text: String,
}
