//! Label-adjacent field extraction from the hosted defect report page.
//!
//! The page is reduced to an ordered list of table/definition cells; a field is
//! the cell right before (or after) the cell carrying its label.

use regex::Regex;
use std::sync::LazyLock;

static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:td|th|dd|dt)\b[^>]*>(.*?)</(?:td|th|dd|dt)\s*>")
        .expect("valid cell pattern")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// The report page flattened to its cell texts, in document order.
#[derive(Debug, Clone, Default)]
pub struct ReportPage {
    pub cells: Vec<String>,
}

impl ReportPage {
    pub fn parse(html: &str) -> Self {
        let cells = CELL_RE
            .captures_iter(html)
            .map(|c| {
                let inner = c.get(1).map(|m| m.as_str()).unwrap_or_default();
                let stripped = TAG_RE.replace_all(inner, " ");
                decode_entities(&stripped)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        Self { cells }
    }

    /// Text of the cell adjacent to the first cell containing `label`.
    ///
    /// `None` means the label is not part of this page layout; callers must not
    /// read it as zero.
    pub fn field(&self, label: &str, direction: Direction) -> Option<String> {
        let idx = self.cells.iter().position(|c| c.contains(label))?;
        let neighbour = match direction {
            Direction::Before => idx.checked_sub(1)?,
            Direction::After => idx + 1,
        };
        self.cells.get(neighbour).cloned()
    }
}

pub fn extract_field(html: &str, label: &str, direction: Direction) -> Option<String> {
    ReportPage::parse(html).field(label, direction)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Parses a report counter such as `"1,234"`; anything else is unknown.
pub fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    digits.parse().ok()
}
