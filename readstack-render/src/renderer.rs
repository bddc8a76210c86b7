/*!
# Pileup renderer

Draws a computed `Layout` onto a `RasterSurface`:

1. Region separators.
2. Templates in stack order: boxes, reference mismatches, letters,
   mate markers and connectors.
3. Insertion markers on top of everything.
4. Message rows above the pileup.
*/

use readstack_core::{BoxOp, ConnectorStyle, Layout, PlacedTemplate, Region, RenderBox, Segment, Strand};

use crate::color::ColorScales;
use crate::font;
use crate::surface::{GradientStop, RasterSurface};

/// Width of the tick marking a mate on another contig
const MATE_MARKER_WIDTH: f64 = 2.0;
/// Left padding of message text
const MESSAGE_PADDING: f64 = 4.0;

pub struct Renderer {
    scales: ColorScales,
}

/// Vertical placement of one segment's row.
#[derive(Debug, Clone, Copy)]
struct RowBand {
    top: f64,
    height: f64,
}

impl RowBand {
    fn middle(&self) -> f64 {
        (self.top + self.height / 2.0).floor()
    }
}

impl Renderer {
    pub fn new(scales: ColorScales) -> Self {
        Self { scales }
    }

    pub fn render(&self, layout: &Layout, surface: &mut dyn RasterSurface) {
        self.draw_separators(layout, surface);

        for template in &layout.templates {
            self.draw_template(layout, template, surface);
        }
        for template in &layout.templates {
            self.draw_insertions(layout, template, surface);
        }

        self.draw_messages(layout, surface);
        log::debug!(
            "rendered {} templates onto {}x{} canvas",
            layout.templates.len(),
            surface.width(),
            surface.height()
        );
    }

    /// Thin vertical lines at the left edge of every region after the first.
    fn draw_separators(&self, layout: &Layout, surface: &mut dyn RasterSurface) {
        let top = layout.message_height() as f64;
        let bottom = layout.canvas_height.max(1) as f64 - 1.0;
        for region in layout.regions.iter().skip(1) {
            let x = region.x_offset as f64;
            surface.line(x, top, x, bottom, self.scales.theme().separator);
        }
    }

    fn band(layout: &Layout, template: &PlacedTemplate, segment: &Segment) -> RowBand {
        let height = layout.row.height as f64;
        RowBand { top: template.y as f64 + segment.sub_row as f64 * height, height }
    }

    fn draw_template(&self, layout: &Layout, template: &PlacedTemplate, surface: &mut dyn RasterSurface) {
        for segment in &template.segments {
            let Some(region) = layout.regions.get(segment.meta.region_index) else {
                continue;
            };
            let band = Self::band(layout, template, segment);
            let strand = segment.meta.strand();

            for b in &segment.boxes {
                match b.op {
                    BoxOp::Match | BoxOp::Mismatch | BoxOp::SoftClip => {
                        self.draw_filled(region, band, strand, b, surface);
                    }
                    BoxOp::Deletion | BoxOp::Skip => self.draw_gap(layout, region, band, b, surface),
                    BoxOp::Pad => {
                        let x = region.mapper().x_at(b.ref_start);
                        surface.line(x, band.top, x, band.top + band.height - 1.0, self.scales.theme().muted);
                    }
                    BoxOp::Insertion => {}
                }
            }

            for m in &segment.mismatches {
                self.draw_filled(region, band, strand, m, surface);
            }

            if segment.meta.mate_chr.is_some() {
                let x = if segment.meta.is_forward {
                    segment.meta.pixel_x2 - MATE_MARKER_WIDTH
                } else {
                    segment.meta.pixel_x1
                };
                surface.fill_rect(x, band.top, MATE_MARKER_WIDTH, band.height, self.scales.theme().mate_marker);
            }
        }

        let height = layout.row.height as f64;
        for connector in &template.connectors {
            match connector.style {
                ConnectorStyle::Dashed => {
                    let y = (template.y as f64 + connector.sub_row as f64 * height + height / 2.0).floor();
                    surface.dashed_line(connector.x1, connector.x2, y, self.scales.theme().connector);
                }
                ConnectorStyle::Solid => {
                    // On the seam between the two mates' rows.
                    let y = template.y as f64 + (connector.sub_row + 1) as f64 * height - 1.0;
                    let width = (connector.x2 - connector.x1).max(1.0);
                    surface.fill_rect(connector.x1, y, width, 2.0, self.scales.theme().adjacency);
                }
            }
        }
    }

    /// A filled box: quality gradient when shading is on, flat colour
    /// otherwise, then letters when they fit.
    fn draw_filled(&self, region: &Region, band: RowBand, strand: Strand, b: &RenderBox, surface: &mut dyn RasterSurface) {
        let mapper = region.mapper();
        let Some((x1, x2)) = mapper.visible_span(b.ref_start, b.ref_len) else {
            return;
        };
        let detail = region.detail;
        let base_at = |i: usize| b.bases.as_ref().and_then(|s| s.get(i)).copied();
        let qual_at = |i: usize| b.qualities.as_ref().and_then(|q| q.get(i)).copied();

        match (&b.qualities, detail.show_quality) {
            (Some(quals), true) if quals.len() > 1 => {
                let visible = (x2 - x1).max(f64::EPSILON);
                let mut stops: Vec<GradientStop> = (0..quals.len())
                    .map(|i| {
                        let (bx1, bx2) = mapper.span(b.ref_start + i as i64, 1);
                        GradientStop {
                            offset: ((bx1 + bx2) / 2.0 - x1) / visible,
                            color: self.scales.base_color(b.op, strand, base_at(i), qual_at(i)),
                        }
                    })
                    .collect();
                // Reversed regions list bases right to left.
                stops.sort_by(|s, t| s.offset.total_cmp(&t.offset));
                surface.gradient_rect(x1, band.top, x2 - x1, band.height, &stops);
            }
            (Some(_), true) => {
                let color = self.scales.base_color(b.op, strand, base_at(0), qual_at(0));
                surface.fill_rect(x1, band.top, x2 - x1, band.height, color);
            }
            _ => {
                let color = self.scales.base_color(b.op, strand, base_at(0), None);
                surface.fill_rect(x1, band.top, x2 - x1, band.height, color);
            }
        }

        if detail.show_letters {
            if let Some(bases) = &b.bases {
                self.draw_letters(region, band, b.ref_start, bases, surface);
            }
        }
    }

    fn draw_letters(&self, region: &Region, band: RowBand, ref_start: i64, bases: &[u8], surface: &mut dyn RasterSurface) {
        let mapper = region.mapper();
        let y = band.top + ((band.height - font::GLYPH_HEIGHT as f64) / 2.0).floor();
        for (i, base) in bases.iter().enumerate() {
            let pos = ref_start + i as i64;
            if !region.contains(pos) {
                continue;
            }
            let (bx1, bx2) = mapper.span(pos, 1);
            let x = ((bx1 + bx2) / 2.0 - font::GLYPH_WIDTH as f64 / 2.0).round();
            let letter = [base.to_ascii_uppercase()];
            let text = std::str::from_utf8(&letter).unwrap_or("?");
            surface.text(x, y, text, self.scales.theme().letter);
        }
    }

    /// Deletions and skips are a horizontal line through the middle of the row.
    fn draw_gap(&self, layout: &Layout, region: &Region, band: RowBand, b: &RenderBox, surface: &mut dyn RasterSurface) {
        let Some((x1, x2)) = region.mapper().visible_span(b.ref_start, b.ref_len) else {
            return;
        };
        let theme = self.scales.theme();
        let color = match b.op {
            BoxOp::Deletion => theme.deletion,
            _ if layout.row.height <= layout.thin_row_height => theme.muted,
            _ => theme.skip,
        };
        let y = band.middle();
        surface.line(x1, y, x2, y, color);
    }

    /// Insertion markers: a bar at the insertion point, and when the row is
    /// tall enough a label with the inserted base or the inserted length.
    fn draw_insertions(&self, layout: &Layout, template: &PlacedTemplate, surface: &mut dyn RasterSurface) {
        for segment in &template.segments {
            let Some(region) = layout.regions.get(segment.meta.region_index) else {
                continue;
            };
            let band = Self::band(layout, template, segment);
            for b in segment.boxes.iter().filter(|b| b.op == BoxOp::Insertion) {
                if !region.contains(b.ref_start) {
                    continue;
                }
                let x = region.mapper().x_at(b.ref_start);
                let color = self.scales.insertion(b.mean_quality());
                let label = insertion_label(b);
                let label_width = font::text_width(&label) as f64 + 2.0;

                if band.height >= font::GLYPH_HEIGHT as f64 && region.nt_width() * b.read_len as f64 >= label_width {
                    let left = (x - label_width / 2.0).round();
                    surface.fill_rect(left, band.top, label_width, band.height, color);
                    let y = band.top + ((band.height - font::GLYPH_HEIGHT as f64) / 2.0).floor();
                    surface.text(left + 1.0, y, &label, self.scales.theme().letter);
                } else {
                    surface.fill_rect(x - 1.0, band.top, 2.0, band.height, color);
                }
            }
        }
    }

    fn draw_messages(&self, layout: &Layout, surface: &mut dyn RasterSurface) {
        let theme = self.scales.theme();
        let width = surface.width() as f64;
        let mut top = 0.0;
        for message in &layout.message_rows {
            let height = message.height as f64;
            surface.fill_rect(0.0, top, width, height, theme.message_background);
            let y = top + ((height - font::GLYPH_HEIGHT as f64) / 2.0).max(0.0).floor();
            surface.text(MESSAGE_PADDING, y, &message.text, theme.message_text);
            top += height;
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(ColorScales::default())
    }
}

/// Single inserted base, or the inserted length.
fn insertion_label(b: &RenderBox) -> String {
    match (&b.bases, b.read_len) {
        (Some(bases), 1) => (bases[0].to_ascii_uppercase() as char).to_string(),
        _ => b.read_len.to_string(),
    }
}
