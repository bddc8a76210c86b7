use readstack_core::{
    AlignmentSource, Layout, LayoutBuilder, PileupError, PileupOutput, PileupRequest, PileupResult, ReferenceSource,
};

use crate::color::{ColorScales, Theme};
use crate::renderer::Renderer;
use crate::surface::{ImageSurface, RasterSurface};

/// One-call entry point: validate, lay out, draw and encode a request.
pub struct PileupEngine<'a> {
    alignments: &'a dyn AlignmentSource,
    reference: &'a dyn ReferenceSource,
    theme: Theme,
}

impl<'a> PileupEngine<'a> {
    pub fn new(alignments: &'a dyn AlignmentSource, reference: &'a dyn ReferenceSource) -> Self {
        Self { alignments, reference, theme: Theme::default() }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn run(&self, request: &PileupRequest) -> PileupResult<PileupOutput> {
        let validated = request.validate()?;
        let layout = LayoutBuilder::new(self.alignments, self.reference).build(&validated)?;
        let image = self.draw(&layout)?;
        Ok(PileupOutput::from_layout(&layout, image))
    }

    /// Render a layout and encode it as PNG.
    pub fn draw(&self, layout: &Layout) -> PileupResult<Vec<u8>> {
        let mut surface = ImageSurface::new(layout.canvas_width, layout.canvas_height, self.theme.background);
        Renderer::new(ColorScales::new(self.theme.clone())).render(layout, &mut surface);
        surface.encode_png().map_err(|e| PileupError::rendering(format!("{e:#}")))
    }
}
