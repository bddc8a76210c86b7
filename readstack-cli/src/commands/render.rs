use anyhow::{Context, Result};
use clap::Args;
use readstack_core::{PileupOutput, PileupRequest, ReferenceSource, RegionSpec, StackWindow};
use readstack_render::PileupEngine;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::sources::{FastaReference, NoReference, SamFileSource};

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Alignments in SAM (plain or .gz) or BAM format
    #[arg(long, required = true)]
    pub alignments: PathBuf,

    /// Reference FASTA (plain or .gz); mismatches are only shown with one
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Region as chr:start-stop; repeat to place regions side by side
    #[arg(long = "region", required = true)]
    pub regions: Vec<String>,

    /// Draw the region with this index (0-based) right to left
    #[arg(long)]
    pub reverse: Vec<usize>,

    /// Pixel width of each region
    #[arg(long)]
    pub width: Option<u32>,

    /// Group mates into templates
    #[arg(long)]
    pub paired: bool,

    /// Only render stacks start:stop (inclusive)
    #[arg(long)]
    pub window: Option<String>,

    /// Stop reading after this many records
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Keep matches and insertions too small to see
    #[arg(long)]
    pub keep_all_boxes: bool,

    /// Sample label reported in the metadata
    #[arg(long)]
    pub sample: Option<String>,

    /// Output PNG file
    #[arg(short, long, required = true)]
    pub out: PathBuf,

    /// Write the pileup metadata as JSON here
    #[arg(long)]
    pub meta: Option<PathBuf>,
}

impl RenderArgs {
    /// Build the request from the arguments, falling back to config values.
    pub fn to_request(&self, config: &Config) -> CliResult<PileupRequest> {
        let width = self.width.unwrap_or(config.render.width);
        let regions = self
            .regions
            .iter()
            .enumerate()
            .map(|(i, s)| -> CliResult<RegionSpec> {
                let mut spec: RegionSpec = s.parse()?;
                spec.pixel_width = Some(width);
                spec.reversed = self.reverse.contains(&i);
                Ok(spec)
            })
            .collect::<CliResult<Vec<_>>>()?;

        let mut params = config.layout_params();
        if self.reference.is_none() {
            params.detail.mismatch_min_nt_width = f64::INFINITY;
        }

        let mut request = PileupRequest::new(regions)
            .paired(self.paired || config.layout.paired)
            .with_max_records(self.max_records.unwrap_or(config.layout.max_records))
            .with_params(params);
        if let Some(window) = &self.window {
            request = request.with_window(window.parse::<StackWindow>()?);
        }
        request.keep_all_boxes = self.keep_all_boxes;
        request.sample_label = self.sample.clone();
        Ok(request)
    }
}

pub fn execute(config: &Config, args: RenderArgs) -> Result<()> {
    let request = args.to_request(config)?;

    let alignments = SamFileSource::open(&args.alignments)?;
    let reference: Box<dyn ReferenceSource> = match &args.reference {
        Some(path) => Box::new(FastaReference::open(path)?),
        None => {
            log::info!("No reference given, mismatch detection is off");
            Box::new(NoReference)
        }
    };
    let theme = config.theme().map_err(|e| CliError::config(format!("{e:#}")))?;

    let engine = PileupEngine::new(&alignments, reference.as_ref()).with_theme(theme);
    let output = engine.run(&request).map_err(CliError::from)?;
    if output.stack_count == 0 {
        log::info!("no reads in view");
    }

    std::fs::write(&args.out, &output.image)
        .with_context(|| format!("Failed to write image: {}", args.out.display()))?;
    if let Some(meta) = &args.meta {
        write_metadata(&output, meta)?;
    }

    log::info!(
        "Wrote {}x{} pileup with {} stacks to {}",
        output.canvas_width,
        output.canvas_height,
        output.stack_count,
        args.out.display()
    );
    Ok(())
}

fn write_metadata(output: &PileupOutput, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(output).context("Failed to serialize pileup metadata")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write metadata: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(regions: &[&str]) -> RenderArgs {
        RenderArgs {
            alignments: PathBuf::from("reads.sam"),
            reference: None,
            regions: regions.iter().map(|s| s.to_string()).collect(),
            reverse: vec![],
            width: None,
            paired: false,
            window: None,
            max_records: None,
            keep_all_boxes: false,
            sample: None,
            out: PathBuf::from("out.png"),
            meta: None,
        }
    }

    #[test]
    fn test_request_from_args_and_config() {
        let mut config = Config::default();
        config.render.width = 640;
        config.layout.max_records = 99;

        let mut a = args(&["chr1:1,000-2,000", "chr2:5-50"]);
        a.reverse = vec![1];
        a.window = Some("2:4".to_string());
        let request = a.to_request(&config).unwrap();

        assert_eq!(request.regions.len(), 2);
        assert_eq!(request.regions[0].start, Some(1000));
        assert_eq!(request.regions[0].pixel_width, Some(640));
        assert!(!request.regions[0].reversed);
        assert!(request.regions[1].reversed);
        assert_eq!(request.max_record_count, Some(99));
        assert_eq!(request.partial_stack_window, Some(StackWindow::new(2, 4).unwrap()));
        // no reference given
        assert!(request.params.detail.mismatch_min_nt_width.is_infinite());
    }

    #[test]
    fn test_bad_arguments_are_request_errors() {
        let config = Config::default();
        assert!(matches!(args(&["chr1"]).to_request(&config), Err(CliError::Request { .. })));

        let mut a = args(&["chr1:1-10"]);
        a.window = Some("4:2".to_string());
        assert!(matches!(a.to_request(&config), Err(CliError::Request { .. })));
    }

    #[test]
    fn test_render_writes_png_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let sam = dir.path().join("reads.sam");
        let mut f = std::fs::File::create(&sam).unwrap();
        writeln!(f, "@HD\tVN:1.6").unwrap();
        writeln!(f, "@SQ\tSN:chr1\tLN:5000").unwrap();
        writeln!(f, "a\t0\tchr1\t1000\t60\t50M\t*\t0\t0\t*\t*").unwrap();
        writeln!(f, "b\t16\tchr1\t1005\t60\t50M\t*\t0\t0\t*\t*").unwrap();
        drop(f);

        let mut a = args(&["chr1:1000-2000"]);
        a.alignments = sam;
        a.width = Some(500);
        a.out = dir.path().join("out.png");
        a.meta = Some(dir.path().join("out.json"));
        execute(&Config::default(), a).unwrap();

        let png = std::fs::read(dir.path().join("out.png")).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
        assert_eq!(meta["canvas_width"], 500);
        assert_eq!(meta["stack_count"], 2);
        assert!(meta.get("image").is_none());
    }
}
