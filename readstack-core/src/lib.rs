//! readstack core library
//!
//! Alignment record parsing, template stacking, row sizing and per-template
//! detail for read pileups. Produces a `Layout` that a renderer draws.

pub mod error;
pub mod params;
pub mod region;
pub mod coords;
pub mod types;
pub mod lod;
pub mod cigar;
pub mod template;
pub mod stack;
pub mod overlap;
pub mod mismatch;
pub mod source;
pub mod request;
pub mod layout;
pub mod output;

// Re-export commonly used types
pub use error::{PileupError, PileupResult};
pub use params::{DetailThresholds, LayoutParams};
pub use region::{Region, RegionSpec};
pub use coords::CoordinateMapper;
pub use types::{BoxOp, Connector, ConnectorStyle, MessageRow, PlacedTemplate, RenderBox, Segment, Strand};
pub use lod::{DetailFlags, RowSize, RowSizer};
pub use cigar::RecordParser;
pub use stack::{StackPacker, StackWindow};
pub use source::{AlignmentSource, MemoryAlignments, MemoryReference, ReferenceSource, SourceError};
pub use request::{PileupRequest, ValidatedRequest};
pub use layout::{Layout, LayoutBuilder};
pub use output::{PileupOutput, TemplateBox};

/// Version information for the readstack core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
