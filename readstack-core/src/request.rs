use serde::{Deserialize, Serialize};

use crate::error::{PileupError, PileupResult};
use crate::params::LayoutParams;
use crate::region::{Region, RegionSpec};
use crate::stack::StackWindow;

/// Record cap applied when a request does not set one.
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

/// A pileup request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PileupRequest {
    pub regions: Vec<RegionSpec>,
    #[serde(default)]
    pub paired_mode: bool,
    #[serde(default)]
    pub sample_label: Option<String>,
    #[serde(default)]
    pub max_record_count: Option<usize>,
    #[serde(default)]
    pub partial_stack_window: Option<StackWindow>,
    /// Keep boxes that would otherwise be culled (detail views)
    #[serde(default)]
    pub keep_all_boxes: bool,
    #[serde(default)]
    pub params: LayoutParams,
}

impl PileupRequest {
    pub fn new(regions: Vec<RegionSpec>) -> Self {
        Self { regions, ..Default::default() }
    }

    pub fn paired(mut self, paired: bool) -> Self {
        self.paired_mode = paired;
        self
    }

    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_record_count = Some(max);
        self
    }

    pub fn with_window(mut self, window: StackWindow) -> Self {
        self.partial_stack_window = Some(window);
        self
    }

    pub fn with_params(mut self, params: LayoutParams) -> Self {
        self.params = params;
        self
    }

    /// Check everything once. Regions without an explicit offset are placed
    /// left to right in the order given.
    pub fn validate(&self) -> PileupResult<ValidatedRequest> {
        if self.regions.is_empty() {
            return Err(PileupError::validation("request has no regions"));
        }

        let mut regions = Vec::with_capacity(self.regions.len());
        let mut next_offset = 0u32;
        for (index, spec) in self.regions.iter().enumerate() {
            let region = spec.validate(index, next_offset)?;
            next_offset = region.x_offset.saturating_add(region.pixel_width);
            regions.push(region);
        }

        let max_records = match self.max_record_count {
            Some(0) => return Err(PileupError::validation("max_record_count must be positive")),
            Some(max) => max,
            None => DEFAULT_MAX_RECORDS,
        };

        let window = match self.partial_stack_window {
            Some(w) => Some(StackWindow::new(w.start_stack, w.stop_stack)?),
            None => None,
        };

        if self.params.max_row_height == 0 {
            return Err(PileupError::validation("max_row_height must be positive"));
        }

        Ok(ValidatedRequest {
            regions,
            paired: self.paired_mode,
            sample_label: self.sample_label.clone().unwrap_or_default(),
            max_records,
            window,
            keep_all_boxes: self.keep_all_boxes,
            params: self.params.clone(),
        })
    }
}

/// A request that passed validation; nothing downstream re-checks it.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub regions: Vec<Region>,
    pub paired: bool,
    pub sample_label: String,
    pub max_records: usize,
    pub window: Option<StackWindow>,
    pub keep_all_boxes: bool,
    pub params: LayoutParams,
}

impl ValidatedRequest {
    /// Right edge of the widest region band.
    pub fn canvas_width(&self) -> u32 {
        self.regions.iter().map(|r| r.x_offset + r.pixel_width).max().unwrap_or(0)
    }
}

/// Per-request record accounting, threaded through the pipeline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    records_seen: usize,
    max_records: usize,
    truncated: bool,
}

impl RequestContext {
    pub fn new(max_records: usize) -> Self {
        Self { records_seen: 0, max_records, truncated: false }
    }

    /// Count one more record. Returns `false` once the cap is exceeded; the
    /// caller must stop pulling records at that point.
    pub fn admit(&mut self) -> bool {
        if self.records_seen >= self.max_records {
            self.truncated = true;
            return false;
        }
        self.records_seen += 1;
        true
    }

    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_laid_out_left_to_right() {
        let request = PileupRequest::new(vec![
            RegionSpec::new("chr1", 1, 1000, 300),
            RegionSpec::new("chr2", 1, 1000, 200),
        ]);
        let validated = request.validate().unwrap();
        assert_eq!(validated.regions[0].x_offset, 0);
        assert_eq!(validated.regions[1].x_offset, 300);
        assert_eq!(validated.canvas_width(), 500);
        assert_eq!(validated.max_records, DEFAULT_MAX_RECORDS);
    }

    #[test]
    fn test_invalid_region_fails_whole_request() {
        let request = PileupRequest::new(vec![
            RegionSpec::new("chr1", 1, 1000, 300),
            RegionSpec { chr: None, ..RegionSpec::new("chr2", 1, 1000, 200) },
        ]);
        let err = request.validate().unwrap_err();
        assert!(err.is_caller_error());
        assert!(err.to_string().contains("region 1"));
    }

    #[test]
    fn test_empty_and_zero_cap_rejected() {
        assert!(PileupRequest::default().validate().is_err());
        let zero = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 10, 10)]).with_max_records(0);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut request = PileupRequest::new(vec![RegionSpec::new("chr1", 1, 10, 10)]);
        request.partial_stack_window = Some(StackWindow { start_stack: 3, stop_stack: 1 });
        assert!(request.validate().unwrap_err().is_caller_error());
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "regions": [{"chr": "chr1", "start": 1000, "stop": 2000, "pixel_width": 500}],
            "paired_mode": true,
            "max_record_count": 10,
            "partial_stack_window": {"start_stack": 2, "stop_stack": 2}
        }"#;
        let request: PileupRequest = serde_json::from_str(json).unwrap();
        let validated = request.validate().unwrap();
        assert!(validated.paired);
        assert_eq!(validated.max_records, 10);
        assert_eq!(validated.window, Some(StackWindow { start_stack: 2, stop_stack: 2 }));
        assert_eq!(validated.params, LayoutParams::default());
    }

    #[test]
    fn test_context_caps_records() {
        let mut ctx = RequestContext::new(2);
        assert!(ctx.admit());
        assert!(ctx.admit());
        assert!(!ctx.is_truncated());
        assert!(!ctx.admit());
        assert!(ctx.is_truncated());
        assert_eq!(ctx.records_seen(), 2);
    }
}
