use readstack_core::{MemoryAlignments, MemoryReference, PileupRequest, RegionSpec};
use readstack_render::PileupEngine;

fn demo_reads_dense() -> Vec<String> {
    // A deep, overlapping pileup on both strands, paired up
    let mut v = Vec::new();
    for i in 0..400i64 {
        let flag = if i % 2 == 0 { 0x1 | 0x40 } else { 0x1 | 0x80 | 0x10 };
        let pos = 1000 + (i / 2) * 3 + (i % 2) * 40;
        v.push(format!("pair{}\t{flag}\tchr1\t{pos}\t60\t30M2I28M\t=\t0\t0\t{}\t{}", i / 2, "ACGT".repeat(15), "5".repeat(60)));
    }
    v
}

fn histogram(png_bytes: &[u8]) -> [u32; 256] {
    let img = image::load_from_memory(png_bytes).unwrap().to_rgba8();
    let mut hist = [0u32; 256];
    for p in img.pixels() {
        // bucket by red channel; strand colours differ most there
        hist[p[0] as usize] += 1;
    }
    hist
}

#[test]
fn png_histogram_is_stable() {
    let alignments = MemoryAlignments::new(demo_reads_dense());
    let reference = MemoryReference::new().with_sequence("chr1", "ACGT".repeat(1000));
    let engine = PileupEngine::new(&alignments, &reference);
    let request = PileupRequest::new(vec![RegionSpec::new("chr1", 1000, 1800, 640)]).paired(true);

    let dir = tempfile::tempdir().unwrap();
    let f1 = dir.path().join("d1.png");
    let f2 = dir.path().join("d2.png");
    std::fs::write(&f1, engine.run(&request).unwrap().image).unwrap();
    std::fs::write(&f2, engine.run(&request).unwrap().image).unwrap();
    let b1 = std::fs::read(&f1).unwrap();
    let b2 = std::fs::read(&f2).unwrap();

    assert_eq!(b1, b2, "PNG bytes differ between identical renders");
    let h1 = histogram(&b1);
    let h2 = histogram(&b2);
    assert_eq!(h1, h2, "Red histogram differs between identical renders");
    assert!(h1[255] > 0, "background should remain visible");
}
