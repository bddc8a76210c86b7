//! Layout tunables shared by the stacking, sizing and rendering stages.

use serde::{Deserialize, Serialize};

/// Resolution thresholds that switch level-of-detail features on and off.
///
/// All `*_nt_width` values are in pixels per nucleotide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailThresholds {
    /// Per-base quality shading is drawn at or above this nt width
    #[serde(default = "default_quality_min_nt_width")]
    pub quality_min_nt_width: f64,

    /// Letters need at least this nt width ...
    #[serde(default = "default_letters_min_nt_width")]
    pub letters_min_nt_width: f64,

    /// ... and at least this row height
    #[serde(default = "default_letters_min_row_height")]
    pub letters_min_row_height: u32,

    /// Reads are compared with the reference at or above this nt width
    #[serde(default = "default_mismatch_min_nt_width")]
    pub mismatch_min_nt_width: f64,

    /// Mate overlap is resolved only when every region is below this nt width
    #[serde(default = "default_overlap_max_nt_width")]
    pub overlap_max_nt_width: f64,

    /// Base-level adjacency between mates is highlighted at or above this nt width
    #[serde(default = "default_adjacency_min_nt_width")]
    pub adjacency_min_nt_width: f64,

    /// Rows at or below this height draw skips in the muted colour
    #[serde(default = "default_thin_row_height")]
    pub thin_row_height: u32,
}

/// Request-independent layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Minimum horizontal gap between templates in one stack, in pixels
    #[serde(default = "default_spacing_px")]
    pub spacing_px: f64,

    /// Minimum horizontal gap between templates in one stack, in bases
    #[serde(default = "default_spacing_bp")]
    pub spacing_bp: f64,

    #[serde(default = "default_max_row_height")]
    pub max_row_height: u32,

    /// Row height below which inter-row spacing is already gone
    #[serde(default = "default_min_readable_row_height")]
    pub min_readable_row_height: u32,

    /// Target maximum canvas height the rows are sized against
    #[serde(default = "default_canvas_height_budget")]
    pub canvas_height_budget: u32,

    /// Insertions narrower than this on screen are dropped
    #[serde(default = "default_min_insertion_px")]
    pub min_insertion_px: f64,

    /// Selection boxes are reported up to this many templates
    #[serde(default = "default_max_selectable_templates")]
    pub max_selectable_templates: usize,

    #[serde(default = "default_message_row_height")]
    pub message_row_height: u32,

    #[serde(default)]
    pub detail: DetailThresholds,
}

fn default_quality_min_nt_width() -> f64 { 0.25 }
fn default_letters_min_nt_width() -> f64 { 7.0 }
fn default_letters_min_row_height() -> u32 { 9 }
fn default_mismatch_min_nt_width() -> f64 { 1.0 }
fn default_overlap_max_nt_width() -> f64 { 4.0 }
fn default_adjacency_min_nt_width() -> f64 { 1.0 }
fn default_thin_row_height() -> u32 { 4 }
fn default_spacing_px() -> f64 { 2.0 }
fn default_spacing_bp() -> f64 { 4.0 }
fn default_max_row_height() -> u32 { 15 }
fn default_min_readable_row_height() -> u32 { 5 }
fn default_canvas_height_budget() -> u32 { 1200 }
fn default_min_insertion_px() -> f64 { 1.0 }
fn default_max_selectable_templates() -> usize { 5000 }
fn default_message_row_height() -> u32 { 12 }

impl Default for DetailThresholds {
    fn default() -> Self {
        Self {
            quality_min_nt_width: default_quality_min_nt_width(),
            letters_min_nt_width: default_letters_min_nt_width(),
            letters_min_row_height: default_letters_min_row_height(),
            mismatch_min_nt_width: default_mismatch_min_nt_width(),
            overlap_max_nt_width: default_overlap_max_nt_width(),
            adjacency_min_nt_width: default_adjacency_min_nt_width(),
            thin_row_height: default_thin_row_height(),
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            spacing_px: default_spacing_px(),
            spacing_bp: default_spacing_bp(),
            max_row_height: default_max_row_height(),
            min_readable_row_height: default_min_readable_row_height(),
            canvas_height_budget: default_canvas_height_budget(),
            min_insertion_px: default_min_insertion_px(),
            max_selectable_templates: default_max_selectable_templates(),
            message_row_height: default_message_row_height(),
            detail: DetailThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = LayoutParams::default();
        assert_eq!(params.max_row_height, 15);
        assert_eq!(params.spacing_px, 2.0);
        assert!(params.detail.letters_min_row_height > params.min_readable_row_height);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: LayoutParams = serde_json::from_str(r#"{"spacing_px": 3.0}"#).unwrap();
        assert_eq!(params.spacing_px, 3.0);
        assert_eq!(params.canvas_height_budget, 1200);
        assert_eq!(params.detail, DetailThresholds::default());
    }
}
