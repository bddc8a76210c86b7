//! The layout pipeline.
//!
//! Pulls records for every region, parses and groups them into templates,
//! packs the templates into stacks, sizes the rows and resolves per-template
//! detail. The resulting `Layout` holds everything a renderer needs and
//! nothing it has to recompute.

use rayon::prelude::*;

use crate::cigar::RecordParser;
use crate::error::{PileupError, PileupResult};
use crate::lod::{DetailFlags, RowSize, RowSizer};
use crate::mismatch::finish_segment;
use crate::overlap::{OverlapResolver, Resolution};
use crate::region::Region;
use crate::request::{RequestContext, ValidatedRequest};
use crate::source::{AlignmentSource, ReferenceSource};
use crate::stack::{stack_spacing, StackPacker, StackWindow};
use crate::template::assemble;
use crate::types::{MessageRow, ParsedSegment, PlacedTemplate};

/// A fully computed pileup layout.
#[derive(Debug, Clone)]
pub struct Layout {
    pub regions: Vec<Region>,
    /// Templates ordered by stack, then by left edge
    pub templates: Vec<PlacedTemplate>,
    /// Height of each stack: the tallest template row placed in it
    pub stack_heights: Vec<u32>,
    /// Top pixel row of each stack
    pub stack_offsets: Vec<u32>,
    pub row: RowSize,
    pub message_rows: Vec<MessageRow>,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub paired: bool,
    pub truncated: bool,
    pub window: Option<StackWindow>,
    /// Segments parsed before grouping
    pub segment_count: usize,
    pub sample_label: String,
    pub max_selectable_templates: usize,
    pub thin_row_height: u32,
}

impl Layout {
    pub fn stack_count(&self) -> usize {
        self.stack_heights.len()
    }

    pub fn message_height(&self) -> u32 {
        self.message_rows.iter().map(|m| m.height).sum()
    }

    /// Per-template selection boxes are reported when paging, or when there
    /// are few enough templates for a client to use them.
    pub fn reports_template_boxes(&self) -> bool {
        self.window.is_some() || self.templates.len() <= self.max_selectable_templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

pub struct LayoutBuilder<'a> {
    alignments: &'a dyn AlignmentSource,
    reference: &'a dyn ReferenceSource,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(alignments: &'a dyn AlignmentSource, reference: &'a dyn ReferenceSource) -> Self {
        Self { alignments, reference }
    }

    pub fn build(&self, request: &ValidatedRequest) -> PileupResult<Layout> {
        let params = &request.params;
        let mut regions = request.regions.clone();
        let mut ctx = RequestContext::new(request.max_records);

        let parsed = self.collect_segments(&regions, request, &mut ctx)?;
        let segment_count = parsed.len();

        let mut templates = assemble(parsed, request.paired);
        let spacing = stack_spacing(&regions, params);
        let packer = StackPacker::new(spacing);
        let mut stacks = packer.pack_templates(&mut templates);

        if let Some(window) = request.window {
            let before = templates.len();
            (templates, stacks) = window.apply(templates);
            log::debug!("stack window {window} kept {} of {before} templates", templates.len());
        }

        let row = RowSizer::from_params(params).size(stacks.len());
        for region in &mut regions {
            region.detail = DetailFlags::for_region(region, row.height, &params.detail);
        }

        let mut in_use = vec![false; regions.len()];
        for segment in templates.iter().flat_map(|t| &t.segments) {
            in_use[segment.meta.region_index] = true;
        }
        self.attach_references(&mut regions, &in_use)?;

        let resolver = OverlapResolver::new(&regions, params, request.paired, spacing);
        let mut placed: Vec<PlacedTemplate> = templates
            .into_iter()
            .map(|template| {
                let mut segments: Vec<_> = template
                    .segments
                    .into_iter()
                    .map(|s| {
                        let region = &regions[s.meta.region_index];
                        finish_segment(s, region)
                    })
                    .collect();
                let resolution = if request.paired {
                    resolver.resolve(&mut segments, &regions)
                } else {
                    Resolution::single_row()
                };
                let sub_rows = resolution.sub_rows.max(1);
                PlacedTemplate {
                    query_name: template.query_name,
                    segments,
                    pixel_x1: template.pixel_x1,
                    pixel_x2: template.pixel_x2,
                    stack_index: template.stack_index,
                    y: 0,
                    row_height: row.height * sub_rows as u32,
                    sub_rows,
                    connectors: resolution.connectors,
                }
            })
            .collect();
        placed.sort_by(|a, b| a.stack_index.cmp(&b.stack_index).then(a.pixel_x1.total_cmp(&b.pixel_x1)));

        let mut message_rows = Vec::new();
        if ctx.is_truncated() {
            log::warn!("record cap of {} reached, rendering a partial pileup", request.max_records);
            message_rows.push(MessageRow {
                height: params.message_row_height,
                text: format!("Too many reads: showing the first {}", ctx.records_seen()),
            });
        }
        let message_height: u32 = message_rows.iter().map(|m| m.height).sum();

        let mut stack_heights = vec![row.height; stacks.len()];
        for template in &placed {
            let height = &mut stack_heights[template.stack_index];
            *height = (*height).max(template.row_height);
        }

        let mut stack_offsets = Vec::with_capacity(stack_heights.len());
        let mut y = message_height + row.spacing;
        for height in &stack_heights {
            stack_offsets.push(y);
            y += height + row.spacing;
        }
        for template in &mut placed {
            template.y = stack_offsets[template.stack_index];
        }

        let canvas_height = if stack_heights.is_empty() { message_height } else { y };

        log::info!(
            "laid out {} templates ({} segments) in {} stacks, row {}px + {}px, canvas {}x{}",
            placed.len(),
            segment_count,
            stack_heights.len(),
            row.height,
            row.spacing,
            request.canvas_width(),
            canvas_height
        );

        Ok(Layout {
            regions,
            templates: placed,
            stack_heights,
            stack_offsets,
            row,
            message_rows,
            canvas_width: request.canvas_width(),
            canvas_height,
            paired: request.paired,
            truncated: ctx.is_truncated(),
            window: request.window,
            segment_count,
            sample_label: request.sample_label.clone(),
            max_selectable_templates: params.max_selectable_templates,
            thin_row_height: params.detail.thin_row_height,
        })
    }

    /// Pull and parse records region by region until the sources run dry or
    /// the request's record cap is hit.
    fn collect_segments(
        &self,
        regions: &[Region],
        request: &ValidatedRequest,
        ctx: &mut RequestContext,
    ) -> PileupResult<Vec<ParsedSegment>> {
        let parser = RecordParser::new(request.keep_all_boxes, request.params.min_insertion_px);
        let mut segments = Vec::new();

        'regions: for (index, region) in regions.iter().enumerate() {
            let records = self
                .alignments
                .records(region)
                .map_err(|e| PileupError::alignment_source(format!("{region}: {e}")))?;

            for record in records {
                let line = record.map_err(|e| PileupError::alignment_source(format!("{region}: {e}")))?;
                if !ctx.admit() {
                    // Dropping the iterator stops the source.
                    break 'regions;
                }
                if let Some(segment) = parser.parse(&line, region, index) {
                    segments.push(segment);
                }
            }
            log::debug!("{region}: {} records seen so far", ctx.records_seen());
        }

        Ok(segments)
    }

    /// Fetch reference slices for every region that compares reads against
    /// the reference, concurrently.
    fn attach_references(&self, regions: &mut [Region], in_use: &[bool]) -> PileupResult<()> {
        let reference = self.reference;
        let fetched: Vec<Option<String>> = regions
            .par_iter()
            .zip(in_use.par_iter())
            .map(|(region, &used)| {
                if !used || !region.detail.check_mismatch {
                    return Ok(None);
                }
                reference
                    .fetch(&region.chr, region.start, region.end() - 1)
                    .map(|bases| Some(bases.to_ascii_uppercase()))
                    .map_err(|e| PileupError::reference_source(&region.chr, region.start, region.stop, e.to_string()))
            })
            .collect::<PileupResult<_>>()?;

        for (region, bases) in regions.iter_mut().zip(fetched) {
            region.reference = bases;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionSpec;
    use crate::request::PileupRequest;
    use crate::source::{MemoryAlignments, MemoryReference, SourceError};
    use crate::types::{BoxOp, ConnectorStyle};

    fn read(name: &str, flag: u16, pos: i64, cigar: &str, len: usize) -> String {
        format!("{name}\t{flag}\tchr1\t{pos}\t60\t{cigar}\t=\t0\t0\t{}\t{}", "A".repeat(len), "I".repeat(len))
    }

    fn build(request: PileupRequest, lines: Vec<String>, reference: &MemoryReference) -> PileupResult<Layout> {
        let alignments = MemoryAlignments::new(lines);
        let validated = request.validate()?;
        LayoutBuilder::new(&alignments, reference).build(&validated)
    }

    fn region_request() -> PileupRequest {
        PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 2000, 500)])
    }

    #[test]
    fn test_stacking_example() {
        let lines = vec![read("a", 0, 1000, "50M", 50), read("b", 0, 1005, "50M", 50), read("c", 0, 1100, "50M", 50)];
        let layout = build(region_request(), lines, &MemoryReference::new()).unwrap();
        let stack_of = |name: &str| layout.templates.iter().find(|t| t.query_name == name).unwrap().stack_index;
        assert_eq!(stack_of("a"), 0);
        assert_eq!(stack_of("b"), 1);
        assert_eq!(stack_of("c"), 0);
        assert_eq!(layout.stack_count(), 2);
        // 1 + 15 + 1 + 15 + 1
        assert_eq!(layout.canvas_height, 33);
        assert_eq!(layout.stack_offsets, vec![1, 17]);
        assert!(layout.message_rows.is_empty());
    }

    #[test]
    fn test_empty_view_has_message_only_height() {
        let layout = build(region_request(), vec![], &MemoryReference::new()).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.canvas_height, 0);
        assert_eq!(layout.canvas_width, 500);
    }

    #[test]
    fn test_truncation_adds_one_message_row() {
        let lines: Vec<String> = (0..10).map(|i| read(&format!("r{i}"), 0, 1000 + i * 60, "50M", 50)).collect();
        let layout = build(region_request().with_max_records(4), lines, &MemoryReference::new()).unwrap();
        assert!(layout.truncated);
        assert_eq!(layout.segment_count, 4);
        assert_eq!(layout.message_rows.len(), 1);
        assert_eq!(layout.canvas_height, 12 + 1 + 15 + 1);
        assert_eq!(layout.templates[0].y, 13);
    }

    #[test]
    fn test_mismatches_need_reference_and_resolution() {
        let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 9, 80)]);
        let line = "r1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGA\tIIIIIIII".to_string();
        let reference = MemoryReference::new().with_sequence("chr1", "ACGTACGT");
        let layout = build(request, vec![line], &reference).unwrap();
        let segment = &layout.templates[0].segments[0];
        assert!(layout.regions[0].detail.check_mismatch);
        assert_eq!(layout.regions[0].reference.as_deref(), Some("ACGTACGT"));
        assert_eq!(segment.mismatches.len(), 1);
        assert_eq!(segment.mismatches[0].ref_start, 8);
        assert_eq!(segment.boxes[0].op, BoxOp::Match);
    }

    #[test]
    fn test_stop_base_is_outside_the_window() {
        // chr1:1-8 shows bases 1..=7; the mismatch at 8 belongs to the next view
        let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 8, 80)]);
        let line = "r1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGA\tIIIIIIII".to_string();
        let reference = MemoryReference::new().with_sequence("chr1", "ACGTACGT");
        let layout = build(request, vec![line], &reference).unwrap();
        assert_eq!(layout.regions[0].reference.as_deref(), Some("ACGTACG"));
        assert!(layout.templates[0].segments[0].mismatches.is_empty());
    }

    #[test]
    fn test_region_past_contig_end_still_checks_mismatches() {
        let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 20, 200)]);
        let line = "r1\t0\tchr1\t1\t60\t10M\t*\t0\t0\tACGTACGTAA\tIIIIIIIIII".to_string();
        let reference = MemoryReference::new().with_sequence("chr1", "ACGTACGTAC");
        let layout = build(request, vec![line], &reference).unwrap();
        assert_eq!(layout.regions[0].reference.as_deref(), Some("ACGTACGTAC"));
        let mismatches = &layout.templates[0].segments[0].mismatches;
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].ref_start, 10);
    }

    #[test]
    fn test_reference_failure_is_distinct() {
        let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 8, 80)]);
        let line = read("r1", 0, 1, "8M", 8);
        let err = build(request, vec![line], &MemoryReference::new()).unwrap_err();
        assert!(matches!(err, PileupError::ReferenceSource { .. }));
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_alignment_failure_is_distinct() {
        struct Broken;
        impl AlignmentSource for Broken {
            fn records<'a>(&'a self, _: &Region) -> Result<crate::source::RecordIter<'a>, SourceError> {
                Err(SourceError::Other("index missing".into()))
            }
        }
        let validated = region_request().validate().unwrap();
        let err = LayoutBuilder::new(&Broken, &MemoryReference::new()).build(&validated).unwrap_err();
        assert!(matches!(err, PileupError::AlignmentSource { .. }));
    }

    #[test]
    fn test_paired_overlap_doubles_stack() {
        let lines = vec![
            read("p", 0x1 | 0x40, 1000, "100M", 100),
            read("p", 0x1 | 0x80 | 0x10, 1050, "100M", 100),
            read("q", 0x1 | 0x40, 1010, "20M", 20),
        ];
        let layout = build(region_request().paired(true), lines, &MemoryReference::new()).unwrap();
        let pair = layout.templates.iter().find(|t| t.query_name == "p").unwrap();
        assert_eq!(pair.segments.len(), 2);
        assert_eq!(pair.sub_rows, 2);
        assert_eq!(pair.row_height, 30);
        assert_eq!(layout.stack_heights[pair.stack_index], 30);
        assert_eq!(layout.canvas_height, 1 + 30 + 1 + 15 + 1);
    }

    #[test]
    fn test_paired_gap_gets_dashed_connector() {
        let lines = vec![read("p", 0x1 | 0x40, 1000, "50M", 50), read("p", 0x1 | 0x80, 1400, "50M", 50)];
        let layout = build(region_request().paired(true), lines, &MemoryReference::new()).unwrap();
        let pair = &layout.templates[0];
        assert_eq!(pair.sub_rows, 1);
        assert_eq!(pair.connectors.len(), 1);
        assert_eq!(pair.connectors[0].style, ConnectorStyle::Dashed);
    }
}
