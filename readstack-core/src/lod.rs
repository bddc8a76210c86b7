/*!
# Row sizing and level of detail

Row geometry is derived from how many stacks have to fit in the canvas
height budget. As the per-stack share shrinks, the 1px gap between rows goes
first, and only then does the row height drop below the readable minimum.

Each region then gets three independent detail flags from its resolution
and the chosen row height:
- quality shading
- base letters
- comparison against the reference
*/

use serde::Serialize;

use crate::params::{DetailThresholds, LayoutParams};
use crate::region::Region;

/// Resolution-dependent rendering toggles for one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetailFlags {
    pub show_quality: bool,
    pub show_letters: bool,
    pub check_mismatch: bool,
}

impl DetailFlags {
    pub fn for_region(region: &Region, row_height: u32, thresholds: &DetailThresholds) -> Self {
        Self::for_nt_width(region.nt_width(), row_height, thresholds)
    }

    pub fn for_nt_width(nt_width: f64, row_height: u32, thresholds: &DetailThresholds) -> Self {
        Self {
            show_quality: nt_width >= thresholds.quality_min_nt_width,
            show_letters: nt_width >= thresholds.letters_min_nt_width
                && row_height >= thresholds.letters_min_row_height,
            check_mismatch: nt_width >= thresholds.mismatch_min_nt_width,
        }
    }
}

/// Pixel height of one stack row and the gap between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowSize {
    pub height: u32,
    pub spacing: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RowSizer {
    max_row_height: u32,
    min_readable_row_height: u32,
    budget: u32,
}

impl RowSizer {
    pub fn new(max_row_height: u32, min_readable_row_height: u32, budget: u32) -> Self {
        let max_row_height = max_row_height.max(1);
        Self {
            max_row_height,
            min_readable_row_height: min_readable_row_height.clamp(1, max_row_height),
            budget,
        }
    }

    pub fn from_params(params: &LayoutParams) -> Self {
        Self::new(params.max_row_height, params.min_readable_row_height, params.canvas_height_budget)
    }

    /// Row geometry for `stack_count` stacks.
    pub fn size(&self, stack_count: usize) -> RowSize {
        if stack_count == 0 {
            return RowSize { height: self.max_row_height, spacing: 1 };
        }

        let per_stack = self.budget as f64 / stack_count as f64;
        let max = self.max_row_height as f64;
        let readable = self.min_readable_row_height as f64;

        if per_stack >= max + 1.0 {
            RowSize { height: self.max_row_height, spacing: 1 }
        } else if per_stack >= readable + 1.0 {
            RowSize { height: per_stack.floor() as u32 - 1, spacing: 1 }
        } else if per_stack >= readable {
            RowSize { height: self.min_readable_row_height, spacing: 0 }
        } else {
            RowSize { height: (per_stack.floor() as u32).max(1), spacing: 0 }
        }
    }
}
