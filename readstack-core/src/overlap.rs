//! Mate overlap handling for paired templates.
//!
//! When reads are thin on screen, overlapping mates would hide each other, so
//! the later mate moves to a second sub-row and the template doubles in
//! height. Mates that do not overlap share a row, joined by a dashed gap line.

use crate::params::LayoutParams;
use crate::region::Region;
use crate::stack::StackPacker;
use crate::types::{Connector, ConnectorStyle, PixelSpan, Segment};

/// Sub-row count and connectors chosen for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub sub_rows: usize,
    pub connectors: Vec<Connector>,
}

impl Resolution {
    pub fn single_row() -> Self {
        Self { sub_rows: 1, connectors: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapResolver {
    active: bool,
    spacing: f64,
    adjacency_min_nt_width: f64,
}

impl OverlapResolver {
    /// Overlap splitting is active in paired mode when every region is
    /// coarser than `overlap_max_nt_width`.
    pub fn new(regions: &[Region], params: &LayoutParams, paired: bool, spacing: f64) -> Self {
        let coarse = regions.iter().all(|r| r.nt_width() < params.detail.overlap_max_nt_width);
        Self {
            active: paired && coarse,
            spacing,
            adjacency_min_nt_width: params.detail.adjacency_min_nt_width,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Assign sub-rows to the segments of one paired template.
    pub fn resolve(&self, segments: &mut [Segment], regions: &[Region]) -> Resolution {
        match segments.len() {
            0 | 1 => Resolution::single_row(),
            2 => self.resolve_pair(segments, regions),
            _ if self.active => self.mini_stack(segments),
            _ => Resolution::single_row(),
        }
    }

    fn resolve_pair(&self, segments: &mut [Segment], regions: &[Region]) -> Resolution {
        let (first, second) = if segments[0].pixel_x1() <= segments[1].pixel_x1() { (0, 1) } else { (1, 0) };
        let a_x2 = segments[first].pixel_x2();
        let b_x1 = segments[second].pixel_x1();

        if self.active && a_x2 > b_x1 {
            segments[second].sub_row = 1;
            let connectors = self.adjacency(&segments[first], &segments[second], regions).into_iter().collect();
            return Resolution { sub_rows: 2, connectors };
        }

        let mut resolution = Resolution::single_row();
        if b_x1 > a_x2 {
            resolution.connectors.push(Connector { x1: a_x2, x2: b_x1, style: ConnectorStyle::Dashed, sub_row: 0 });
        }
        resolution
    }

    /// Solid line over the reference stretch where two stacked mates meet,
    /// when the region is zoomed in far enough to see single bases.
    fn adjacency(&self, a: &Segment, b: &Segment, regions: &[Region]) -> Option<Connector> {
        if a.meta.region_index != b.meta.region_index {
            return None;
        }
        let region = regions.get(a.meta.region_index)?;
        if region.nt_width() < self.adjacency_min_nt_width {
            return None;
        }

        // Reference order, which is the reverse of pixel order on reversed regions.
        let start_of = |s: &Segment| s.boxes.iter().map(|b| b.ref_start).min();
        let (left, right) = if start_of(a) <= start_of(b) { (a, b) } else { (b, a) };
        let left_end = left.boxes.iter().map(|b| b.ref_end()).max()?;
        let right_start = right.boxes.iter().map(|b| b.ref_start).min()?;
        if left_end < right_start {
            return None;
        }

        let (x1, x2) = region.mapper().span(right_start, (left_end - right_start) as u32);
        Some(Connector { x1, x2, style: ConnectorStyle::Solid, sub_row: 0 })
    }

    fn mini_stack(&self, segments: &mut [Segment]) -> Resolution {
        let packing = StackPacker::new(self.spacing).pack(&*segments);
        for (segment, row) in segments.iter_mut().zip(&packing.assignments) {
            segment.sub_row = *row;
        }
        Resolution { sub_rows: packing.stacks.len().max(1), connectors: Vec::new() }
    }
}
