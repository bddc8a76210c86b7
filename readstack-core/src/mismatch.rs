//! Reference comparison and conversion of parsed boxes into render boxes.

use crate::region::Region;
use crate::types::{BoxOp, ParsedBox, ParsedSegment, RenderBox, Segment};

/// Slice `len` entries of `data` starting at `offset`, if all are present.
fn window(data: Option<&[u8]>, offset: Option<usize>, len: u32) -> Option<Vec<u8>> {
    let data = data?;
    let offset = offset?;
    data.get(offset..offset + len as usize).map(<[u8]>::to_vec)
}

/// Resolve a parsed box against its read, dropping the sequence offset.
pub fn resolve_box(parsed: &ParsedBox, sequence: Option<&[u8]>, qualities: Option<&[u8]>) -> RenderBox {
    RenderBox {
        op: parsed.op,
        ref_start: parsed.ref_start,
        ref_len: parsed.ref_len,
        bases: window(sequence, parsed.seq_offset, parsed.read_len),
        qualities: window(qualities, parsed.seq_offset, parsed.read_len),
        read_len: parsed.read_len,
    }
}

/// Compare the bases of a match box with the region's cached reference.
///
/// Returns one length-1 mismatch box per differing base inside the visible
/// window. Nothing is produced when the region does not check mismatches, has
/// no cached reference, or the read has no sequence.
pub fn detect(parsed: &ParsedBox, sequence: Option<&[u8]>, qualities: Option<&[u8]>, region: &Region) -> Vec<RenderBox> {
    if parsed.op != BoxOp::Match || !region.detail.check_mismatch || region.reference.is_none() {
        return Vec::new();
    }
    let (Some(sequence), Some(offset)) = (sequence, parsed.seq_offset) else {
        return Vec::new();
    };

    let mut mismatches = Vec::new();
    for i in 0..parsed.ref_len as usize {
        let pos = parsed.ref_start + i as i64;
        let (Some(read_base), Some(ref_base)) = (sequence.get(offset + i), region.reference_base(pos)) else {
            continue;
        };
        if read_base.eq_ignore_ascii_case(&ref_base) {
            continue;
        }
        mismatches.push(RenderBox {
            op: BoxOp::Mismatch,
            ref_start: pos,
            ref_len: 1,
            bases: Some(vec![*read_base]),
            qualities: qualities.and_then(|q| q.get(offset + i)).map(|&q| vec![q]),
            read_len: 1,
        });
    }
    mismatches
}

/// Turn a parsed segment into its render-ready form.
///
/// Mismatches are collected into a separate list so the CIGAR boxes are never
/// modified while they are being walked.
pub fn finish_segment(parsed: ParsedSegment, region: &Region) -> Segment {
    let sequence = parsed.sequence.as_deref();
    let qualities = parsed.qualities.as_deref();

    let mut boxes = Vec::with_capacity(parsed.boxes.len());
    let mut mismatches = Vec::new();
    for b in &parsed.boxes {
        mismatches.extend(detect(b, sequence, qualities, region));
        boxes.push(resolve_box(b, sequence, qualities));
    }

    Segment { meta: parsed.meta, boxes, mismatches, sub_row: 0 }
}
