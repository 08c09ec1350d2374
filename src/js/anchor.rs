use crate::edit::Edit;

/// Where an anchor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch {
    /// Index into the marker list that matched (0 is the primary marker)
    pub marker_index: usize,
    pub byte_start: usize,
}

/// Locate the first occurrence of the first marker present in `source`.
///
/// Markers are tried in order, so a specific marker can be followed by a
/// shorter fallback. The search stops at the first marker found: if that one
/// sits at offset 0 there is no anchor, and later markers are not tried.
pub fn locate(source: &str, markers: &[String]) -> Option<AnchorMatch> {
    markers
        .iter()
        .enumerate()
        .find_map(|(marker_index, marker)| {
            source.find(marker.as_str()).map(|byte_start| AnchorMatch {
                marker_index,
                byte_start,
            })
        })
        .filter(|found| found.byte_start > 0)
}

/// Insertion edit splicing `text` immediately before the anchor.
pub fn insert_before(anchor: AnchorMatch, text: &str) -> Edit {
    Edit::insert(anchor.byte_start, text)
}
