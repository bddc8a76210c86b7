/*!
# readstack rendering

CPU rasterisation of pileup layouts.

## Architecture

- `color`: quality-keyed colour scales per box category and the theme
- `surface`: the raster surface primitives and an RGBA image implementation
  that encodes to PNG
- `renderer`: draws a `Layout` onto any surface
- `engine`: request in, PNG and metadata out
*/

pub mod color;
pub mod engine;
pub mod font;
pub mod renderer;
pub mod surface;

pub use color::{ColorScales, Rgba, Theme};
pub use engine::PileupEngine;
pub use renderer::Renderer;
pub use surface::{GradientStop, ImageSurface, RasterSurface};
