//! `/proc/slabinfo` provider.
//!
//! Understands the 2.x layout:
//!
//! ```text
//! slabinfo - version: 2.1
//! # name            <active_objs> <num_objs> <objsize> <objperslab> <pagesperslab> : tunables <limit> <batchcount> <sharedfactor> : slabdata <active_slabs> <num_slabs> <sharedavail>
//! kmalloc-64          12800      12800     64   64    1 : tunables    0    0    0 : slabdata    200    200      0
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Result, SlabError};
use crate::sort::{sort_nodes, SortCriterion};
use crate::types::{CacheNode, SlabProvider, Snapshot, SummaryStats};

/// Default location of the kernel's slab statistics.
pub const DEFAULT_PATH: &str = "/proc/slabinfo";

const FALLBACK_PAGE_SIZE: u64 = 4096;

/// Provider backed by a slabinfo file.
#[derive(Debug, Clone)]
pub struct ProcSlabinfo {
    path: PathBuf,
    page_size: u64,
}

impl ProcSlabinfo {
    /// Reads `/proc/slabinfo` using the system page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PATH, system_page_size())
    }

    /// Reads `path`, computing cache sizes with `page_size`.
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>, page_size: u64) -> Self {
        Self { path: path.as_ref().to_path_buf(), page_size }
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| SlabError::FetchFailed {
            provider: "slabinfo",
            message: format!("Failed to read {}: {}", self.path.display(), e),
        })
    }
}

impl Default for ProcSlabinfo {
    fn default() -> Self {
        Self::new()
    }
}

impl SlabProvider for ProcSlabinfo {
    fn id(&self) -> &'static str {
        "slabinfo"
    }

    fn fetch_snapshot(&mut self, max_nodes: usize, criterion: SortCriterion) -> Result<Snapshot> {
        crate::time_scope!("slabinfo", "fetch_snapshot");

        let content = self.read()?;
        let mut nodes = parse_slabinfo(&content, self.page_size)?;
        let summary = SummaryStats::from_nodes(&nodes);

        sort_nodes(&mut nodes, criterion);
        nodes.truncate(max_nodes);

        crate::debug!(
            "slabinfo",
            "{} caches, keeping {} sorted by {:?}",
            summary.total_caches,
            nodes.len(),
            criterion
        );
        Ok(Snapshot::new(nodes, summary))
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

/// Parses slabinfo text into cache nodes, in file order.
///
/// # Errors
///
/// Returns [`SlabError::SlabinfoFormat`] for an unsupported version header or
/// a data line that does not follow the 2.x layout.
pub fn parse_slabinfo(content: &str, page_size: u64) -> Result<Vec<CacheNode>> {
    let mut lines = content.lines().enumerate();

    let header = lines.next().map(|(_, l)| l).unwrap_or_default();
    check_version(header)?;

    let mut nodes = Vec::new();
    for (idx, line) in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        nodes.push(parse_line(line, idx + 1, page_size)?);
    }
    Ok(nodes)
}

fn check_version(header: &str) -> Result<()> {
    let version = header
        .strip_prefix("slabinfo - version:")
        .map(str::trim)
        .ok_or_else(|| format_error(1, "missing 'slabinfo - version:' header"))?;

    if !version.starts_with("2.") {
        return Err(format_error(1, &format!("unsupported slabinfo version {version}")));
    }
    Ok(())
}

fn parse_line(line: &str, line_no: usize, page_size: u64) -> Result<CacheNode> {
    let sections: Vec<&str> = line.split(" : ").collect();
    if sections.len() != 3 {
        return Err(format_error(line_no, "expected 3 ':'-separated sections"));
    }

    let head: Vec<&str> = sections[0].split_whitespace().collect();
    if head.len() != 6 {
        return Err(format_error(line_no, "expected name and 5 object fields"));
    }

    let slabdata: Vec<&str> = sections[2].split_whitespace().collect();
    if slabdata.len() < 3 || slabdata[0] != "slabdata" {
        return Err(format_error(line_no, "missing slabdata section"));
    }

    let num = |field: &str| -> Result<u64> {
        field.parse().map_err(|_| format_error(line_no, &format!("invalid number '{field}'")))
    };

    let pages_per_slab = num(head[5])?;
    let slabs = num(slabdata[2])?;

    Ok(CacheNode {
        name: head[0].to_string(),
        active_objects: num(head[1])?,
        objects: num(head[2])?,
        object_size: num(head[3])?,
        objects_per_slab: num(head[4])?,
        pages_per_slab,
        active_slabs: num(slabdata[1])?,
        slabs,
        cache_size: slabs.saturating_mul(pages_per_slab).saturating_mul(page_size),
    })
}

fn format_error(line: usize, message: &str) -> SlabError {
    SlabError::SlabinfoFormat { line, message: message.to_string() }
}

#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
fn system_page_size() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads system configuration.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        FALLBACK_PAGE_SIZE
    }
}

#[cfg(not(target_os = "linux"))]
fn system_page_size() -> u64 {
    FALLBACK_PAGE_SIZE
}
