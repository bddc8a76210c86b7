//! Greedy first-fit interval packing of templates into stacks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PileupError;
use crate::params::LayoutParams;
use crate::region::Region;
use crate::types::{PixelSpan, Template};

/// One horizontal row of the pileup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stack {
    pub index: usize,
    /// Rightmost pixel occupied by the templates placed so far
    pub right_edge: f64,
}

/// Result of a packing pass: the stack chosen for each input, by input index.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    pub assignments: Vec<usize>,
    pub stacks: Vec<Stack>,
}

#[derive(Debug, Clone, Copy)]
pub struct StackPacker {
    spacing: f64,
}

impl StackPacker {
    pub fn new(spacing: f64) -> Self {
        Self { spacing }
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Pack items by ascending `pixel_x1`, each into the first stack whose
    /// right edge plus the spacing is still left of it.
    pub fn pack<T: PixelSpan>(&self, items: &[T]) -> Packing {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| items[a].pixel_x1().total_cmp(&items[b].pixel_x1()));

        let mut assignments = vec![0; items.len()];
        let mut stacks: Vec<Stack> = Vec::new();

        for idx in order {
            let item = &items[idx];
            let x1 = item.pixel_x1();
            let slot = stacks.iter().position(|s| s.right_edge + self.spacing < x1);
            let stack = match slot {
                Some(i) => &mut stacks[i],
                None => {
                    stacks.push(Stack { index: stacks.len(), right_edge: f64::NEG_INFINITY });
                    let last = stacks.len() - 1;
                    &mut stacks[last]
                }
            };
            stack.right_edge = item.pixel_x2();
            assignments[idx] = stack.index;
        }

        Packing { assignments, stacks }
    }

    /// Pack templates in place, setting their `stack_index`.
    pub fn pack_templates<S>(&self, templates: &mut [Template<S>]) -> Vec<Stack> {
        let packing = self.pack(&*templates);
        for (template, stack) in templates.iter_mut().zip(&packing.assignments) {
            template.stack_index = *stack;
        }
        log::debug!("packed {} templates into {} stacks", templates.len(), packing.stacks.len());
        packing.stacks
    }
}

/// Minimum gap between neighbours in a stack, for all regions of a request.
pub fn stack_spacing(regions: &[Region], params: &LayoutParams) -> f64 {
    let max_nt_width = regions.iter().map(Region::nt_width).fold(0.0, f64::max);
    params.spacing_px.max(params.spacing_bp * max_nt_width)
}

/// Inclusive range of stacks requested for paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackWindow {
    pub start_stack: usize,
    pub stop_stack: usize,
}

impl StackWindow {
    pub fn new(start_stack: usize, stop_stack: usize) -> Result<Self, PileupError> {
        if start_stack > stop_stack {
            return Err(PileupError::validation(format!(
                "stack window start ({start_stack}) must not exceed stop ({stop_stack})"
            )));
        }
        Ok(Self { start_stack, stop_stack })
    }

    /// Rows the window spans; a window always spans at least one.
    pub fn row_count(&self) -> usize {
        self.stop_stack - self.start_stack + 1
    }

    pub fn contains(&self, stack: usize) -> bool {
        stack >= self.start_stack && stack <= self.stop_stack
    }

    /// Keep templates inside the window, renumber their stacks from zero and
    /// return exactly `row_count()` empty stacks to hold them.
    pub fn apply<S>(&self, templates: Vec<Template<S>>) -> (Vec<Template<S>>, Vec<Stack>) {
        let mut kept: Vec<Template<S>> = templates.into_iter().filter(|t| self.contains(t.stack_index)).collect();
        let mut stacks: Vec<Stack> =
            (0..self.row_count()).map(|index| Stack { index, right_edge: f64::NEG_INFINITY }).collect();
        for template in &mut kept {
            template.stack_index -= self.start_stack;
            let stack = &mut stacks[template.stack_index];
            stack.right_edge = stack.right_edge.max(template.pixel_x2);
        }
        (kept, stacks)
    }
}

impl FromStr for StackWindow {
    type Err = PileupError;

    /// Parse `start:stop`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PileupError::validation(format!("invalid stack window '{s}': expected 'start:stop'"));
        let (start, stop) = s.split_once(':').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let stop = stop.trim().parse().map_err(|_| invalid())?;
        Self::new(start, stop)
    }
}

impl fmt::Display for StackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_stack, self.stop_stack)
    }
}
