//! Grouping of parsed segments into templates.

use fnv::FnvHashMap;

use crate::types::{ParsedSegment, Template};

/// Build templates from segments in arrival order.
///
/// In single-end mode every segment is its own template. In paired mode
/// segments are grouped by query name across all regions; templates keep the
/// order in which their first segment arrived.
pub fn assemble(segments: Vec<ParsedSegment>, paired: bool) -> Vec<Template<ParsedSegment>> {
    if !paired {
        return segments
            .into_iter()
            .map(|segment| Template::new(segment.meta.query_name.clone(), segment))
            .collect();
    }

    let mut templates: Vec<Template<ParsedSegment>> = Vec::new();
    let mut by_name: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut unnamed = 0usize;

    for segment in segments {
        let name = segment.meta.query_name.as_str();
        if name.is_empty() || name == "*" {
            unnamed += 1;
            continue;
        }
        match by_name.get(name) {
            Some(&index) => templates[index].push(segment),
            None => {
                by_name.insert(name.to_string(), templates.len());
                templates.push(Template::new(name.to_string(), segment));
            }
        }
    }

    if unnamed > 0 {
        log::debug!("dropped {unnamed} segments without a query name");
    }
    templates
}
