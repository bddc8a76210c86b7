use readstack_core::{MemoryAlignments, MemoryReference, PileupRequest, RegionSpec};
use readstack_render::{PileupEngine, Theme};

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

fn render(lines: Vec<String>, reference: &MemoryReference, request: PileupRequest) -> (readstack_core::PileupOutput, image::RgbaImage) {
    let alignments = MemoryAlignments::new(lines);
    let output = PileupEngine::new(&alignments, reference).run(&request).unwrap();
    let img = decode(&output.image);
    (output, img)
}

#[test]
fn image_matches_reported_canvas() {
    let lines = vec![
        "a\t0\tchr1\t1000\t60\t50M\t*\t0\t0\t*\t*".to_string(),
        "b\t16\tchr1\t1005\t60\t50M\t*\t0\t0\t*\t*".to_string(),
    ];
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 2000, 500)]);
    let (output, img) = render(lines, &MemoryReference::new(), request);

    assert_eq!(img.dimensions(), (output.canvas_width, output.canvas_height));
    assert_eq!((output.canvas_width, output.canvas_height), (500, 33));

    let theme = Theme::default();
    // a sits in the first stack, b (reverse) in the second
    assert_eq!(img.get_pixel(10, 5).0[..3], theme.forward);
    assert_eq!(img.get_pixel(10, 20).0[..3], theme.reverse);
    assert_eq!(img.get_pixel(300, 5).0, theme.background);
}

#[test]
fn deletion_is_drawn_through_the_row() {
    let lines = vec!["r\t0\tchr1\t1000\t60\t10M20D10M\t*\t0\t0\t*\t*".to_string()];
    let reference = MemoryReference::new().with_sequence("chr1", "A".repeat(2000));
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 1100, 1000)]);
    let (_, img) = render(lines, &reference, request);

    let theme = Theme::default();
    assert_eq!(img.get_pixel(200, 8).0, theme.deletion);
    assert_eq!(img.get_pixel(200, 3).0, theme.background);
    assert_eq!(img.get_pixel(50, 8).0[..3], theme.forward);
}

#[test]
fn mismatch_takes_the_base_colour() {
    let lines = vec!["r\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGAACGT\tIIIIIIII".to_string()];
    let reference = MemoryReference::new().with_sequence("chr1", "ACGTACGT");
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 8, 80)]);
    let (output, img) = render(lines, &reference, request);

    assert_eq!(output.canvas_height, 17);
    // position 4 spans pixels 34..46; glyphs start below the first row
    assert_eq!(img.get_pixel(40, 1).0, [0, 200, 0, 255]);
    assert_eq!(img.get_pixel(20, 1).0[..3], Theme::default().forward);
}

#[test]
fn truncated_view_shows_message_row() {
    let lines: Vec<String> =
        (0..3).map(|i| format!("r{i}\t0\tchr1\t{}\t60\t50M\t*\t0\t0\t*\t*", 1000 + i * 100)).collect();
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 2000, 500)]).with_max_records(1);
    let (output, img) = render(lines, &MemoryReference::new(), request);

    assert_eq!(output.message_row_heights, 12);
    assert_eq!(img.dimensions(), (500, 12 + 1 + 15 + 1));
    assert_eq!(img.get_pixel(499, 0).0, Theme::default().message_background);
    assert!((0..216).any(|x| (0..12).any(|y| img.get_pixel(x, y).0 == Theme::default().message_text)));
}

#[test]
fn empty_view_still_encodes() {
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 2000, 500)]);
    let (output, img) = render(vec![], &MemoryReference::new(), request);
    assert_eq!(output.canvas_height, 0);
    assert_eq!(output.stack_count, 0);
    assert_eq!(img.dimensions(), (500, 1));
}

#[test]
fn custom_theme_background() {
    let _ = env_logger::builder().is_test(true).try_init();
    let alignments = MemoryAlignments::new(vec!["a\t0\tchr1\t1000\t60\t50M\t*\t0\t0\t*\t*"]);
    let reference = MemoryReference::new();
    let theme = Theme::from_hex("#000080", "#800000", "#101010").unwrap();
    let engine = PileupEngine::new(&alignments, &reference).with_theme(theme);
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 2000, 500)]);
    let img = decode(&engine.run(&request).unwrap().image);
    assert_eq!(img.get_pixel(499, 16).0, [16, 16, 16, 255]);
    assert_eq!(img.get_pixel(10, 5).0, [0, 0, 128, 255]);
}

#[test]
fn last_window_base_stays_in_its_band() {
    let lines = vec!["r\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGA\tIIIIIIII".to_string()];
    let reference = MemoryReference::new().with_sequence("chr1", "ACGTACGT");
    let green = [0, 200, 0, 255];
    let any_green = |img: &image::RgbaImage, xs: std::ops::Range<u32>| xs.into_iter().any(|x| img.get_pixel(x, 1).0 == green);

    // chr1:1-9 shows eight bases, the mismatch at 8 fills pixels 70..80
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 9, 80), RegionSpec::new("chr9", 1, 9, 80)]);
    let (output, img) = render(lines.clone(), &reference, request);
    assert_eq!(output.canvas_width, 160);
    assert_eq!(img.get_pixel(75, 1).0, green);
    assert!(!any_green(&img, 80..160));

    // chr1:1-8 ends at base 7, so base 8 is drawn nowhere
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 8, 80), RegionSpec::new("chr9", 1, 8, 80)]);
    let (_, img) = render(lines, &reference, request);
    assert!(!any_green(&img, 0..160));
    assert_eq!(img.get_pixel(80, 1).0, Theme::default().background);
}
