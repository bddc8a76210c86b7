/*!
# Colour scales

Deterministic quality-to-colour gradients for each box category. Every
scale runs from a pale tint at quality 0 to the full colour at quality 40;
qualities above 40 clamp to the full colour.
*/

use anyhow::{anyhow, Result};
use readstack_core::{BoxOp, Strand};

pub type Rgba = [u8; 4];

/// Phred quality at which a scale reaches its full colour.
pub const MAX_QUALITY: u8 = 40;

const A_COL: [u8; 3] = [0, 200, 0];
const C_COL: [u8; 3] = [0, 0, 200];
const G_COL: [u8; 3] = [209, 113, 5];
const T_COL: [u8; 3] = [255, 0, 40];
const N_COL: [u8; 3] = [80, 80, 80];
const INS_COL: [u8; 3] = [138, 94, 161];
const SPL_COL: [u8; 3] = [120, 85, 43];

/// Fixed colours of one rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub forward: [u8; 3],
    pub reverse: [u8; 3],
    pub soft_clip: [u8; 3],
    pub deletion: Rgba,
    pub skip: Rgba,
    /// Thin-row skips and pads
    pub muted: Rgba,
    pub connector: Rgba,
    pub adjacency: Rgba,
    pub mate_marker: Rgba,
    pub separator: Rgba,
    pub letter: Rgba,
    pub message_background: Rgba,
    pub message_text: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            forward: [42, 111, 239],
            reverse: [229, 57, 53],
            soft_clip: [150, 150, 150],
            deletion: [220, 20, 20, 255],
            skip: opaque(SPL_COL),
            muted: [200, 200, 200, 255],
            connector: [120, 120, 120, 255],
            adjacency: [255, 165, 0, 255],
            mate_marker: [40, 40, 40, 255],
            separator: [160, 160, 160, 255],
            letter: [255, 255, 255, 255],
            message_background: [255, 243, 205, 255],
            message_text: [90, 60, 0, 255],
        }
    }
}

impl Theme {
    /// Default theme with strand and background colours given as `#RRGGBB`.
    pub fn from_hex(forward: &str, reverse: &str, background: &str) -> Result<Self> {
        let parse = |name: &str, s: &str| parse_hex_rgb(s).ok_or_else(|| anyhow!("invalid {name} colour '{s}', expected #RRGGBB"));
        Ok(Self {
            forward: parse("forward", forward)?,
            reverse: parse("reverse", reverse)?,
            background: opaque(parse("background", background)?),
            ..Self::default()
        })
    }
}

/// Quality-keyed colour lookup for every box category.
#[derive(Debug, Clone)]
pub struct ColorScales {
    theme: Theme,
}

impl ColorScales {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Colour for one base of a filled box. `quality` of `None` gives the
    /// flat high-quality colour.
    pub fn base_color(&self, op: BoxOp, strand: Strand, base: Option<u8>, quality: Option<u8>) -> Rgba {
        match op {
            BoxOp::Mismatch => self.mismatch(base.unwrap_or(b'N'), quality),
            BoxOp::SoftClip => self.soft_clip(quality),
            BoxOp::Insertion => self.insertion(quality),
            _ => self.matched(strand, quality),
        }
    }

    pub fn matched(&self, strand: Strand, quality: Option<u8>) -> Rgba {
        let full = match strand {
            Strand::Forward => self.theme.forward,
            Strand::Reverse => self.theme.reverse,
        };
        scale(full, quality)
    }

    pub fn mismatch(&self, base: u8, quality: Option<u8>) -> Rgba {
        let full = match base.to_ascii_uppercase() {
            b'A' => A_COL,
            b'C' => C_COL,
            b'G' => G_COL,
            b'T' => T_COL,
            _ => N_COL,
        };
        scale(full, quality)
    }

    pub fn soft_clip(&self, quality: Option<u8>) -> Rgba {
        scale(self.theme.soft_clip, quality)
    }

    pub fn insertion(&self, mean_quality: Option<u8>) -> Rgba {
        scale(INS_COL, mean_quality)
    }
}

impl Default for ColorScales {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

fn opaque([r, g, b]: [u8; 3]) -> Rgba {
    [r, g, b, 255]
}

/// Blend from a pale tint of `full` (quality 0) to `full` (quality 40).
fn scale(full: [u8; 3], quality: Option<u8>) -> Rgba {
    let q = quality.unwrap_or(MAX_QUALITY).min(MAX_QUALITY) as f32 / MAX_QUALITY as f32;
    let mut out = [0u8, 0, 0, 255];
    for (o, &c) in out.iter_mut().zip(&full) {
        let pale = c as f32 + (255.0 - c as f32) * 0.75;
        *o = (pale + (c as f32 - pale) * q).round() as u8;
    }
    out
}

/// Parse a hex colour like "#RRGGBB".
pub fn parse_hex_rgb(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}
