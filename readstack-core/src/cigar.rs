//! Alignment record parser
//!
//! Turns one tab-delimited SAM line into a `ParsedSegment`: the boxes of the
//! read that are visible in a region, plus its pixel span on the canvas.
//! Malformed lines are skipped, never reported as errors.

use crate::region::Region;
use crate::types::{BoxOp, ParsedBox, ParsedSegment, SegmentMeta};

/// Minimum number of mandatory SAM columns.
pub const SAM_FIELD_COUNT: usize = 11;

pub const FLAG_UNMAPPED: u16 = 0x4;
pub const FLAG_REVERSE: u16 = 0x10;
pub const FLAG_FIRST_IN_PAIR: u16 = 0x40;
pub const FLAG_LAST_IN_PAIR: u16 = 0x80;

/// Phred+33 offset used by SAM quality strings.
const QUALITY_OFFSET: u8 = 33;

/// Parser for SAM records against one region.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    /// Keep match and insertion boxes regardless of visibility
    pub keep_all_boxes: bool,
    /// Insertions narrower than this on screen are dropped
    pub min_insertion_px: f64,
}

impl RecordParser {
    pub fn new(keep_all_boxes: bool, min_insertion_px: f64) -> Self {
        Self { keep_all_boxes, min_insertion_px }
    }

    /// Parse one record. Returns `None` for truncated, unmapped or otherwise
    /// unusable records and for records with nothing visible in `region`.
    pub fn parse(&self, line: &str, region: &Region, region_index: usize) -> Option<ParsedSegment> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < SAM_FIELD_COUNT {
            log::debug!("skipping truncated record with {} fields", fields.len());
            return None;
        }

        let flag: u16 = match fields[1].parse() {
            Ok(flag) => flag,
            Err(_) => {
                log::debug!("skipping record {} with invalid flag '{}'", fields[0], fields[1]);
                return None;
            }
        };
        if flag & FLAG_UNMAPPED != 0 {
            return None;
        }

        let pos = match fields[3].parse::<i64>() {
            Ok(pos) if pos > 0 => pos,
            _ => {
                log::debug!("skipping record {} with invalid position '{}'", fields[0], fields[3]);
                return None;
            }
        };

        let cigar = fields[5];
        if cigar == "*" || cigar.is_empty() {
            return None;
        }

        let boxes = self.walk_cigar(cigar, pos, region);
        if boxes.is_empty() {
            return None;
        }

        let (pixel_x1, pixel_x2) = pixel_extent(&boxes, region);

        let sequence = match fields[9] {
            "*" | "" => None,
            seq => Some(seq.as_bytes().to_vec()),
        };
        let qualities = match fields[10] {
            "*" | "" => None,
            qual => Some(qual.bytes().map(|b| b.saturating_sub(QUALITY_OFFSET)).collect()),
        };

        let mate_chr = match fields[6] {
            "=" | "*" | "" => None,
            mate if mate == region.chr => None,
            mate => Some(mate.to_string()),
        };

        Some(ParsedSegment {
            meta: SegmentMeta {
                query_name: fields[0].to_string(),
                is_forward: flag & FLAG_REVERSE == 0,
                region_index,
                pixel_x1,
                pixel_x2,
                is_first_in_pair: flag & FLAG_FIRST_IN_PAIR != 0,
                is_last_in_pair: flag & FLAG_LAST_IN_PAIR != 0,
                mate_chr,
            },
            boxes,
            sequence,
            qualities,
        })
    }

    /// Walk the CIGAR string, tracking the reference cursor `pos` and the
    /// read cursor `cum`, and emit the boxes visible in `region`.
    fn walk_cigar(&self, cigar: &str, start: i64, region: &Region) -> Vec<ParsedBox> {
        let mut boxes = Vec::new();
        let mut pos = start;
        let mut cum = 0usize;
        let mut len: u32 = 0;
        let mut leading = true;
        let nt_width = region.nt_width();

        for ch in cigar.chars() {
            if let Some(digit) = ch.to_digit(10) {
                len = len.saturating_mul(10).saturating_add(digit);
                continue;
            }

            match ch {
                'M' | '=' | 'X' => {
                    let op = if ch == 'X' { BoxOp::Mismatch } else { BoxOp::Match };
                    if self.keep_all_boxes || region.intersects(pos, len) {
                        boxes.push(ParsedBox { op, ref_start: pos, ref_len: len, seq_offset: Some(cum), read_len: len });
                    }
                    pos += len as i64;
                    cum += len as usize;
                }
                'I' => {
                    let width = len as f64 * nt_width;
                    if self.keep_all_boxes || (width >= self.min_insertion_px && region.contains(pos)) {
                        boxes.push(ParsedBox {
                            op: BoxOp::Insertion,
                            ref_start: pos,
                            ref_len: 0,
                            seq_offset: Some(cum),
                            read_len: len,
                        });
                    }
                    cum += len as usize;
                }
                'D' | 'N' => {
                    let op = if ch == 'D' { BoxOp::Deletion } else { BoxOp::Skip };
                    let last = pos + len.max(1) as i64 - 1;
                    if region.contains(pos) || region.contains(last) {
                        boxes.push(ParsedBox { op, ref_start: pos, ref_len: len, seq_offset: None, read_len: 0 });
                    }
                    pos += len as i64;
                }
                'S' => {
                    // A leading clip sits left of the alignment start; a
                    // trailing one starts where the alignment ends.
                    let clip_start = if leading { pos - len as i64 } else { pos };
                    if region.intersects(clip_start, len) {
                        boxes.push(ParsedBox {
                            op: BoxOp::SoftClip,
                            ref_start: clip_start,
                            ref_len: len,
                            seq_offset: Some(cum),
                            read_len: len,
                        });
                    }
                    cum += len as usize;
                }
                'P' => {
                    if region.contains(pos) {
                        boxes.push(ParsedBox { op: BoxOp::Pad, ref_start: pos, ref_len: 0, seq_offset: None, read_len: 0 });
                    }
                }
                'H' => {}
                other => {
                    log::warn!("skipping unknown CIGAR operation '{other}' in '{cigar}'");
                }
            }

            if matches!(ch, 'M' | '=' | 'X' | 'I' | 'D' | 'N' | 'S' | 'P') {
                leading = false;
            }
            len = 0;
        }

        boxes
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(false, 1.0)
    }
}

/// Pixel span of a segment from its first and last visible box, clipped to
/// the region's band.
fn pixel_extent(boxes: &[ParsedBox], region: &Region) -> (f64, f64) {
    let mapper = region.mapper();
    let mut x1 = f64::INFINITY;
    let mut x2 = f64::NEG_INFINITY;
    for b in [boxes.first(), boxes.last()].into_iter().flatten() {
        let (a, z) = mapper.span(b.ref_start, b.ref_len);
        x1 = x1.min(a);
        x2 = x2.max(z);
    }
    mapper.clamp(x1, x2)
}
