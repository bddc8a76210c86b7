use serde::Serialize;

use crate::layout::Layout;
use crate::types::PlacedTemplate;

/// Selection box of one template on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateBox {
    pub query_name: String,
    pub stack: usize,
    pub x1: f64,
    pub x2: f64,
    pub y1: u32,
    pub y2: u32,
    /// Pair flags are only meaningful for a single read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
    pub is_forward: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mate_chr: Option<String>,
}

impl TemplateBox {
    fn from_template(template: &PlacedTemplate, paired: bool) -> Self {
        let first = template.segments.first();
        let single = if paired { None } else { first };
        Self {
            query_name: template.query_name.clone(),
            stack: template.stack_index,
            x1: template.pixel_x1,
            x2: template.pixel_x2,
            y1: template.y,
            y2: template.y + template.row_height,
            is_first: single.map(|s| s.meta.is_first_in_pair),
            is_last: single.map(|s| s.meta.is_last_in_pair),
            is_forward: first.map_or(true, |s| s.meta.is_forward),
            mate_chr: template.segments.iter().find_map(|s| s.meta.mate_chr.clone()),
        }
    }
}

/// Result of one pileup request. The encoded image is kept out of the JSON
/// metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PileupOutput {
    #[serde(skip)]
    pub image: Vec<u8>,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub row_height: u32,
    pub stack_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,
    pub message_row_heights: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_template_boxes: Option<Vec<TemplateBox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_stack_available: Option<bool>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sample_label: String,
}

impl PileupOutput {
    pub fn from_layout(layout: &Layout, image: Vec<u8>) -> Self {
        let per_template_boxes = layout.reports_template_boxes().then(|| {
            layout.templates.iter().map(|t| TemplateBox::from_template(t, layout.paired)).collect()
        });
        let (template_count, segment_count) = if layout.paired {
            (Some(layout.templates.len()), None)
        } else {
            (None, Some(layout.segment_count))
        };

        Self {
            image,
            canvas_width: layout.canvas_width,
            canvas_height: layout.canvas_height,
            row_height: layout.row.height,
            stack_count: layout.stack_count(),
            template_count,
            segment_count,
            message_row_heights: layout.message_height(),
            per_template_boxes,
            partial_stack_available: (layout.truncated && layout.window.is_none()).then_some(true),
            sample_label: layout.sample_label.clone(),
        }
    }
}
