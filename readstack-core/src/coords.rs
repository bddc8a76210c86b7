use crate::region::Region;

/// Linear reference-to-pixel transform for one region.
///
/// Several regions can share a canvas; each one owns the pixel band
/// `[x_offset, x_offset + pixel_width]` and may be drawn reversed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    start: i64,
    stop: i64,
    x_offset: f64,
    pixel_width: f64,
    pixels_per_bp: f64,
    reversed: bool,
}

impl CoordinateMapper {
    pub fn new(region: &Region) -> Self {
        Self {
            start: region.start as i64,
            stop: region.end() as i64,
            x_offset: region.x_offset as f64,
            pixel_width: region.pixel_width as f64,
            pixels_per_bp: region.nt_width(),
            reversed: region.reversed,
        }
    }

    pub fn pixels_per_bp(&self) -> f64 {
        self.pixels_per_bp
    }

    /// Pixel column of the left edge (forward) or right edge (reversed) of `pos`.
    pub fn x_at(&self, pos: i64) -> f64 {
        if self.reversed {
            self.x_offset + (self.stop - pos) as f64 * self.pixels_per_bp
        } else {
            self.x_offset + (pos - self.start) as f64 * self.pixels_per_bp
        }
    }

    /// Pixel span of `[ref_start, ref_start + ref_len)`, always with `x1 <= x2`.
    pub fn span(&self, ref_start: i64, ref_len: u32) -> (f64, f64) {
        let a = self.x_at(ref_start);
        let b = self.x_at(ref_start + ref_len as i64);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Clip a pixel span to this region's band.
    pub fn clamp(&self, x1: f64, x2: f64) -> (f64, f64) {
        let lo = self.x_offset;
        let hi = self.x_offset + self.pixel_width;
        (x1.clamp(lo, hi), x2.clamp(lo, hi))
    }

    /// Clipped span, or `None` if nothing of it is on screen. A span that
    /// only touches the band's edge has no width here and is `None` too.
    pub fn visible_span(&self, ref_start: i64, ref_len: u32) -> Option<(f64, f64)> {
        let (x1, x2) = self.span(ref_start, ref_len);
        if x2 <= self.left() || x1 >= self.right() {
            return None;
        }
        Some(self.clamp(x1, x2))
    }

    pub fn left(&self) -> f64 {
        self.x_offset
    }

    pub fn right(&self) -> f64 {
        self.x_offset + self.pixel_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(reversed: bool) -> Region {
        Region::new("chr1", 1000, 2000, 100, 500, reversed)
    }

    #[test]
    fn test_forward_mapping() {
        let mapper = region(false).mapper();
        assert_eq!(mapper.x_at(1000), 100.0);
        assert_eq!(mapper.x_at(2000), 600.0);
        assert_eq!(mapper.span(1000, 50), (100.0, 125.0));
    }

    #[test]
    fn test_reversed_mapping() {
        let mapper = region(true).mapper();
        assert_eq!(mapper.x_at(2000), 100.0);
        assert_eq!(mapper.x_at(1000), 600.0);
        let (x1, x2) = mapper.span(1000, 50);
        assert!(x1 < x2);
        assert_eq!((x1, x2), (575.0, 600.0));
    }

    #[test]
    fn test_clamp_to_band() {
        let mapper = region(false).mapper();
        assert_eq!(mapper.clamp(50.0, 700.0), (100.0, 600.0));
        assert_eq!(mapper.visible_span(900, 50), None);
        assert_eq!(mapper.visible_span(990, 50), Some((100.0, 120.0)));
    }

    #[test]
    fn test_edge_bases_stay_in_band() {
        let mapper = Region::new("chr1", 1, 8, 0, 80, false).mapper();
        assert_eq!(mapper.visible_span(7, 1), Some((60.0, 70.0)));
        assert_eq!(mapper.visible_span(8, 1), None);
        assert_eq!(mapper.visible_span(0, 1), None);

        let reversed = Region::new("chr1", 1, 8, 0, 80, true).mapper();
        assert_eq!(reversed.visible_span(1, 1), Some((60.0, 70.0)));
        assert_eq!(reversed.visible_span(8, 1), None);

        let point = Region::new("chr1", 5, 5, 0, 10, true).mapper();
        assert_eq!(point.visible_span(5, 1), Some((0.0, 10.0)));
    }

    #[test]
    fn test_independent_regions_share_canvas() {
        let left = Region::new("chr1", 1, 1000, 0, 100, false).mapper();
        let right = Region::new("chr2", 1, 100, 100, 100, false).mapper();
        assert_eq!(left.right(), right.left());
        assert!((left.pixels_per_bp() - 100.0 / 999.0).abs() < 1e-12);
        assert!((right.pixels_per_bp() - 100.0 / 99.0).abs() < 1e-12);
    }
}
