//! Line formatting for the summary block and the cache table.
//!
//! Everything here is pure: the same [`Frame`] feeds the plain batch writer
//! and the full-screen view, so output can be checked without a terminal.

use crate::types::{CacheNode, Snapshot, SummaryStats};

/// Rows taken by the summary block, blank line and header, plus one spare.
pub const CHROME_ROWS: u16 = 8;

/// Column header for the cache table.
pub const HEADER: &str = "  OBJS ACTIVE  USE OBJ SIZE  SLABS OBJ/SLAB CACHE SIZE NAME";

/// `100 * active / total`, or `0.0` when the total is zero.
#[must_use]
pub fn percent(active: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * active as f64 / total as f64
}

fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Formats the five summary lines.
#[must_use]
pub fn render_summary(summary: &SummaryStats) -> Vec<String> {
    let ratio = |label: &str, active: u64, total: u64| {
        format!(" {:<35}: {} / {} ({:.1}%)", label, active, total, percent(active, total))
    };

    vec![
        ratio("Active / Total Objects (% used)", summary.active_objects, summary.total_objects),
        ratio("Active / Total Slabs (% used)", summary.active_slabs, summary.total_slabs),
        ratio("Active / Total Caches (% used)", summary.active_caches, summary.total_caches),
        format!(
            " {:<35}: {:.2}K / {:.2}K ({:.1}%)",
            "Active / Total Size (% used)",
            kib(summary.active_size),
            kib(summary.total_size),
            percent(summary.active_size, summary.total_size)
        ),
        format!(
            " {:<35}: {:.2}K / {:.2}K / {:.2}K",
            "Minimum / Average / Maximum Object",
            kib(summary.min_object_size),
            kib(summary.avg_object_size),
            kib(summary.max_object_size)
        ),
    ]
}

/// Formats the column header, padded to 78 columns.
#[must_use]
pub fn render_header() -> String {
    format!("{HEADER:<78}")
}

/// Formats one cache row.
#[must_use]
pub fn render_row(node: &CacheNode) -> String {
    format!(
        "{:>6} {:>6} {:>3}% {:>7.2}K {:>6} {:>8} {:>9}K {:<23}",
        node.objects,
        node.active_objects,
        node.utilization_percent().round() as u64,
        kib(node.object_size),
        node.slabs,
        node.objects_per_slab,
        node.cache_size / 1024,
        node.name
    )
}

/// Data rows that fit under the chrome on a terminal `rows` tall.
#[must_use]
pub fn available_rows(rows: u16) -> usize {
    usize::from(rows.saturating_sub(CHROME_ROWS))
}

/// One rendered screenful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The five summary lines.
    pub summary: Vec<String>,
    /// The column header.
    pub header: String,
    /// One line per displayed cache.
    pub rows: Vec<String>,
}

impl Frame {
    /// Renders a snapshot, keeping at most `row_limit` nodes.
    ///
    /// `None` renders every node.
    #[must_use]
    pub fn compose(snapshot: &Snapshot, row_limit: Option<usize>) -> Self {
        let shown = row_limit.map_or(snapshot.nodes.len(), |limit| limit.min(snapshot.nodes.len()));
        Self {
            summary: render_summary(&snapshot.summary),
            header: render_header(),
            rows: snapshot.nodes[..shown].iter().map(render_row).collect(),
        }
    }

    /// All lines in display order, with the blank separator after the summary.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.summary
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(""))
            .chain(std::iter::once(self.header.as_str()))
            .chain(self.rows.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> SummaryStats {
        SummaryStats {
            active_objects: 750,
            total_objects: 1000,
            active_slabs: 10,
            total_slabs: 20,
            active_caches: 3,
            total_caches: 4,
            active_size: 2048,
            total_size: 4096,
            min_object_size: 8,
            avg_object_size: 512,
            max_object_size: 8192,
        }
    }

    fn sample_node() -> CacheNode {
        CacheNode {
            name: "kmalloc-64".to_string(),
            objects: 12800,
            active_objects: 12736,
            object_size: 96,
            objects_per_slab: 64,
            pages_per_slab: 1,
            slabs: 200,
            active_slabs: 200,
            cache_size: 819200,
        }
    }

    #[test]
    fn test_summary_lines() {
        let lines = render_summary(&sample_summary());
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], format!(" {:<35}: 750 / 1000 (75.0%)", "Active / Total Objects (% used)"));
        assert!(lines[1].ends_with(": 10 / 20 (50.0%)"));
        assert!(lines[2].ends_with(": 3 / 4 (75.0%)"));
        assert!(lines[3].ends_with(": 2.00K / 4.00K (50.0%)"));
        assert!(lines[4].ends_with(": 0.01K / 0.50K / 8.00K"));
    }

    #[test]
    fn test_summary_labels_align() {
        let lines = render_summary(&sample_summary());
        for line in &lines {
            assert_eq!(line.find(':'), Some(36), "misaligned: {line}");
        }
    }

    #[test]
    fn test_summary_with_zero_totals() {
        let lines = render_summary(&SummaryStats::default());
        assert!(lines[0].ends_with(": 0 / 0 (0.0%)"));
        assert!(lines[1].ends_with("(0.0%)"));
        assert!(lines[2].ends_with("(0.0%)"));
        assert!(lines[3].ends_with(": 0.00K / 0.00K (0.0%)"));
        for line in &lines {
            assert!(!line.contains("NaN") && !line.contains("inf"), "{line}");
        }
    }

    #[test]
    fn test_percent_guards_zero() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn test_header_is_padded() {
        let header = render_header();
        assert_eq!(header.len(), 78);
        assert!(header.starts_with(HEADER));
    }

    #[test]
    fn test_row_format() {
        let row = render_row(&sample_node());
        assert_eq!(row, format!(" 12800  12736 100%    0.09K    200       64       800K {:<23}", "kmalloc-64"));
    }

    #[test]
    fn test_row_rounds_utilization() {
        let mut node = sample_node();
        node.objects = 3;
        node.active_objects = 2;
        assert!(render_row(&node).contains(" 67% "));
    }

    #[test]
    fn test_row_tolerates_active_above_total() {
        let mut node = sample_node();
        node.objects = 10;
        node.active_objects = 25;
        assert!(render_row(&node).contains("250%"));
    }

    #[test]
    fn test_row_with_empty_cache() {
        let node = CacheNode { name: "empty".to_string(), ..CacheNode::default() };
        assert!(render_row(&node).contains("  0%"));
    }

    #[test]
    fn test_available_rows() {
        assert_eq!(available_rows(24), 16);
        assert_eq!(available_rows(8), 0);
        assert_eq!(available_rows(3), 0);
    }

    #[test]
    fn test_compose_limits_rows() {
        let snapshot = Snapshot::new(vec![sample_node(); 5], sample_summary());

        assert_eq!(Frame::compose(&snapshot, Some(2)).rows.len(), 2);
        assert_eq!(Frame::compose(&snapshot, Some(50)).rows.len(), 5);
        assert_eq!(Frame::compose(&snapshot, None).rows.len(), 5);
        assert!(Frame::compose(&snapshot, Some(0)).rows.is_empty());
    }

    #[test]
    fn test_frame_lines_order() {
        let snapshot = Snapshot::new(vec![sample_node()], sample_summary());
        let frame = Frame::compose(&snapshot, None);
        let lines: Vec<&str> = frame.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], frame.header);
        assert_eq!(lines[7], frame.rows[0]);
    }
}
