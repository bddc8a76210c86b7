//! File-backed alignment and reference sources.
//!
//! `SamFileSource` reads SAM, gzipped SAM or BAM with noodles and hands the
//! pipeline only records on the region's contig that overlap it, written back
//! as SAM lines. `FastaReference` loads a FASTA file once and serves
//! uppercase slices.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::{GzDecoder, MultiGzDecoder};
use needletail::{parse_fastx_file, parse_fastx_reader, FastxReader};
use noodles::bam;
use noodles::bgzf;
use noodles::sam::{self, alignment::io::Write as _, alignment::RecordBuf, Header};
use readstack_core::source::{slice_reference, RecordIter};
use readstack_core::{AlignmentSource, ReferenceSource, Region, SourceError};

use crate::error::{CliError, CliResult};

fn is_gzipped(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

fn is_bam(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "bam")
}

/// Alignments read from a `.sam`, `.sam.gz` or `.bam` file.
///
/// Every `records` call rescans the file from the start.
pub struct SamFileSource {
    path: PathBuf,
}

impl SamFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(CliError::file_not_found(path));
        }
        Ok(Self { path })
    }

    fn reader(&self) -> io::Result<RecordReader> {
        let file = File::open(&self.path)?;
        if is_bam(&self.path) {
            return Ok(RecordReader::Bam(bam::io::Reader::new(file)));
        }
        // BGZF is a series of gzip members, so one decoder covers both.
        let inner: Box<dyn BufRead> = if is_gzipped(&self.path) {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(RecordReader::Sam(sam::io::Reader::new(inner)))
    }
}

impl AlignmentSource for SamFileSource {
    fn records<'a>(&'a self, region: &Region) -> Result<RecordIter<'a>, SourceError> {
        let mut reader = self.reader()?;
        let header = reader.read_header()?;

        let Some(reference_sequence_id) = header
            .reference_sequences()
            .keys()
            .position(|name| name.as_slice() == region.chr.as_bytes())
        else {
            log::debug!("{} has no @SQ line for {}", self.path.display(), region.chr);
            return Ok(Box::new(std::iter::empty()));
        };

        Ok(Box::new(RegionRecords {
            reader,
            header,
            writer: sam::io::Writer::new(Vec::new()),
            record: RecordBuf::default(),
            reference_sequence_id,
            start: region.start as usize,
            end: region.end() as usize,
        }))
    }
}

enum RecordReader {
    Sam(sam::io::Reader<Box<dyn BufRead>>),
    Bam(bam::io::Reader<bgzf::Reader<File>>),
}

impl RecordReader {
    fn read_header(&mut self) -> io::Result<Header> {
        match self {
            Self::Sam(reader) => reader.read_header(),
            Self::Bam(reader) => reader.read_header(),
        }
    }

    /// Returns 0 at end of file.
    fn read_record_buf(&mut self, header: &Header, record: &mut RecordBuf) -> io::Result<usize> {
        match self {
            Self::Sam(reader) => reader.read_record_buf(header, record),
            Self::Bam(reader) => reader.read_record_buf(header, record),
        }
    }
}

/// Records on one contig that overlap `[start, end)`, as SAM lines.
struct RegionRecords {
    reader: RecordReader,
    header: Header,
    writer: sam::io::Writer<Vec<u8>>,
    record: RecordBuf,
    reference_sequence_id: usize,
    start: usize,
    end: usize,
}

impl RegionRecords {
    /// Records without a position cannot be placed and are dropped here.
    fn overlaps(&self) -> bool {
        if self.record.reference_sequence_id() != Some(self.reference_sequence_id) {
            return false;
        }
        let Some(start) = self.record.alignment_start().map(usize::from) else {
            return false;
        };
        let end = self.record.alignment_end().map(usize::from).unwrap_or(start).max(start);
        start < self.end && end >= self.start
    }

    fn format_line(&mut self) -> Result<String, SourceError> {
        self.writer.get_mut().clear();
        self.writer.write_alignment_record(&self.header, &self.record)?;
        let line = String::from_utf8_lossy(self.writer.get_ref());
        Ok(line.trim_end_matches('\n').to_string())
    }
}

impl Iterator for RegionRecords {
    type Item = Result<String, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record_buf(&self.header, &mut self.record) {
                Ok(0) => return None,
                Ok(_) if self.overlaps() => return Some(self.format_line()),
                Ok(_) => continue,
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
        }
    }
}

/// Reference sequences loaded from a FASTA file (plain or gzipped).
pub struct FastaReference {
    sequences: HashMap<String, String>,
}

impl FastaReference {
    pub fn open<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CliError::file_not_found(path.to_path_buf()));
        }
        let file_name = path.display().to_string();
        let parse_error = |e: needletail::errors::ParseError| CliError::parse(file_name.clone(), e.to_string());

        let mut reader: Box<dyn FastxReader> = if is_gzipped(path) {
            let decoder = GzDecoder::new(File::open(path)?);
            parse_fastx_reader(BufReader::new(decoder)).map_err(parse_error)?
        } else {
            parse_fastx_file(path).map_err(parse_error)?
        };

        let mut sequences = HashMap::new();
        while let Some(record) = reader.next() {
            let record = record.map_err(parse_error)?;
            let id = String::from_utf8_lossy(record.id());
            // Only the first word of the header names the contig
            let name = id.split_whitespace().next().unwrap_or_default().to_string();
            let seq = String::from_utf8_lossy(&record.seq()).to_ascii_uppercase();
            sequences.insert(name, seq);
        }
        log::info!("Loaded {} reference sequences from {}", sequences.len(), path.display());

        Ok(Self { sequences })
    }
}

impl ReferenceSource for FastaReference {
    fn fetch(&self, chr: &str, start: u64, stop: u64) -> Result<String, SourceError> {
        let seq = self.sequences.get(chr).ok_or_else(|| SourceError::UnknownSequence(chr.to_string()))?;
        slice_reference(chr, seq, start, stop)
    }
}

/// Stands in when no reference file is given. Mismatch detection is switched
/// off in that case, so a fetch only happens if a caller forgets to.
pub struct NoReference;

impl ReferenceSource for NoReference {
    fn fetch(&self, chr: &str, _start: u64, _stop: u64) -> Result<String, SourceError> {
        Err(SourceError::Other(format!("no reference loaded for {chr}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use noodles::sam::alignment::io::Write as _;
    use readstack_core::RegionSpec;
    use std::io::Write;

    const SAM: &str = "@HD\tVN:1.6\n\
@SQ\tSN:chr1\tLN:5000\n\
@SQ\tSN:chr2\tLN:5000\n\
r1\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\n\
r2\t16\tchr1\t900\t60\t50M\t*\t0\t0\t*\t*\n\
r3\t0\tchr2\t120\t60\t50M\t*\t0\t0\t*\t*\n\
r4\t0\tchr1\t60\t60\t20M100N20M\t*\t0\t0\t*\t*\n";

    fn region(chr: &str, start: i64, stop: i64) -> Region {
        RegionSpec::new(chr, start, stop, 100).validate(0, 0).unwrap()
    }

    fn names(source: &SamFileSource, region: &Region) -> Vec<String> {
        source
            .records(region)
            .unwrap()
            .map(|line| line.unwrap().split('\t').next().unwrap().to_string())
            .collect()
    }

    fn write_sam(suffix: &str, text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_sam_filters_contig_and_span() {
        let file = write_sam(".sam", SAM);
        let source = SamFileSource::open(file.path()).unwrap();

        // r4 spans 60..199 through its skip
        assert_eq!(names(&source, &region("chr1", 120, 300)), vec!["r1", "r4"]);
        assert_eq!(names(&source, &region("chr2", 1, 1000)), vec!["r3"]);
        assert!(names(&source, &region("chr3", 1, 1000)).is_empty());
        // r1 starts at 100, the first base past chr1:1-100
        assert_eq!(names(&source, &region("chr1", 1, 100)), vec!["r4"]);
    }

    #[test]
    fn test_records_come_back_as_sam_lines() {
        let file = write_sam(".sam", SAM);
        let source = SamFileSource::open(file.path()).unwrap();
        let lines: Vec<String> = source.records(&region("chr1", 800, 1000)).unwrap().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields.len(), 11);
        assert_eq!(&fields[..6], &["r2", "16", "chr1", "900", "60", "50M"]);
        assert!(!lines[0].ends_with('\n'));
    }

    #[test]
    fn test_gzipped_sam() {
        let mut file = tempfile::Builder::new().suffix(".sam.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAM.as_bytes()).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();

        let source = SamFileSource::open(file.path()).unwrap();
        assert_eq!(names(&source, &region("chr1", 800, 1000)), vec!["r2"]);
    }

    #[test]
    fn test_bam() {
        let mut reader = sam::io::Reader::new(SAM.as_bytes());
        let header = reader.read_header().unwrap();
        let records: Vec<RecordBuf> = reader.record_bufs(&header).map(Result::unwrap).collect();

        let file = tempfile::Builder::new().suffix(".bam").tempfile().unwrap();
        {
            let mut writer = bam::io::Writer::new(File::create(file.path()).unwrap());
            writer.write_header(&header).unwrap();
            for record in &records {
                writer.write_alignment_record(&header, record).unwrap();
            }
            // Dropping the writer writes the BGZF end-of-file block
        }

        let source = SamFileSource::open(file.path()).unwrap();
        assert_eq!(names(&source, &region("chr1", 120, 300)), vec!["r1", "r4"]);
        assert_eq!(names(&source, &region("chr2", 1, 1000)), vec!["r3"]);
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let broken = format!("{SAM}r5\t0\tchr1\tnope\t60\t10M\t*\t0\t0\t*\t*\n");
        let file = write_sam(".sam", &broken);
        let source = SamFileSource::open(file.path()).unwrap();
        let results: Vec<_> = source.records(&region("chr1", 1, 5000)).unwrap().collect();
        assert!(matches!(results.last(), Some(Err(SourceError::Io(_)))));
    }

    #[test]
    fn test_missing_file() {
        let err = SamFileSource::open("/definitely/not/here.sam").err().unwrap();
        assert!(matches!(err, CliError::FileNotFound { .. }));
    }

    #[test]
    fn test_fasta_reference_slices() {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(b">chr1 test contig\nacgtacgt\nNNNN\n>chr2\nGGGG\n").unwrap();
        file.flush().unwrap();

        let reference = FastaReference::open(file.path()).unwrap();
        assert_eq!(reference.fetch("chr2", 1, 4).unwrap(), "GGGG");
        assert_eq!(reference.fetch("chr1", 3, 6).unwrap(), "GTAC");
        assert_eq!(reference.fetch("chr1", 9, 12).unwrap(), "NNNN");
        assert_eq!(reference.fetch("chr1", 10, 13).unwrap(), "NNN");
        assert!(matches!(reference.fetch("chr1", 13, 14), Err(SourceError::OutOfRange { .. })));
        assert!(matches!(reference.fetch("chrX", 1, 2), Err(SourceError::UnknownSequence(_))));
    }

    #[test]
    fn test_no_reference_always_fails() {
        assert!(NoReference.fetch("chr1", 1, 10).is_err());
    }
}
