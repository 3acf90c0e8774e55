//! Core types for slab monitoring.
//!
//! - [`CacheNode`]: one slab cache's statistics
//! - [`SummaryStats`]: aggregate counters for a whole sample
//! - [`Snapshot`]: one atomic read of both
//! - [`SlabProvider`]: trait for sources of snapshots
//!
//! Snapshots are values. Every tick produces a fresh one and the previous one
//! is dropped whole.

use crate::error::Result;
use crate::sort::SortCriterion;

/// Statistics for a single kernel slab cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheNode {
    /// Cache name, unique within a snapshot.
    pub name: String,
    /// Allocated objects.
    pub objects: u64,
    /// Objects in use. Expected `<= objects` but not enforced.
    pub active_objects: u64,
    /// Bytes per object.
    pub object_size: u64,
    /// Objects that fit in one slab.
    pub objects_per_slab: u64,
    /// Pages backing one slab.
    pub pages_per_slab: u64,
    /// Allocated slabs.
    pub slabs: u64,
    /// Slabs holding at least one active object.
    pub active_slabs: u64,
    /// Total bytes occupied by the cache's slabs.
    pub cache_size: u64,
}

impl CacheNode {
    /// Percentage of objects in use, `0.0` for a cache with no objects.
    #[must_use]
    pub fn utilization_percent(&self) -> f64 {
        if self.objects == 0 {
            return 0.0;
        }
        self.active_objects as f64 * 100.0 / self.objects as f64
    }
}

/// Aggregate counters over every cache in a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub active_objects: u64,
    pub total_objects: u64,
    pub active_slabs: u64,
    pub total_slabs: u64,
    pub active_caches: u64,
    pub total_caches: u64,
    /// Bytes held by active objects.
    pub active_size: u64,
    /// Bytes held by all objects.
    pub total_size: u64,
    pub min_object_size: u64,
    pub avg_object_size: u64,
    pub max_object_size: u64,
}

impl SummaryStats {
    /// Aggregates a full node list.
    ///
    /// Must be called before any truncation so the totals cover every cache.
    #[must_use]
    pub fn from_nodes(nodes: &[CacheNode]) -> Self {
        let mut stats = Self::default();
        let mut min_size = u64::MAX;

        for node in nodes {
            stats.active_objects = stats.active_objects.saturating_add(node.active_objects);
            stats.total_objects = stats.total_objects.saturating_add(node.objects);
            stats.active_slabs = stats.active_slabs.saturating_add(node.active_slabs);
            stats.total_slabs = stats.total_slabs.saturating_add(node.slabs);
            stats.total_caches += 1;
            if node.active_objects > 0 {
                stats.active_caches += 1;
            }
            stats.active_size = stats
                .active_size
                .saturating_add(node.active_objects.saturating_mul(node.object_size));
            stats.total_size =
                stats.total_size.saturating_add(node.objects.saturating_mul(node.object_size));
            min_size = min_size.min(node.object_size);
            stats.max_object_size = stats.max_object_size.max(node.object_size);
        }

        stats.min_object_size = if nodes.is_empty() { 0 } else { min_size };
        stats.avg_object_size = stats.total_size.checked_div(stats.total_objects).unwrap_or(0);
        stats
    }
}

/// One read of every cache plus its summary.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Nodes, already ordered by the requested criterion.
    pub nodes: Vec<CacheNode>,
    /// Aggregate counters.
    pub summary: SummaryStats,
}

impl Snapshot {
    /// Pairs sorted nodes with the summary taken over the full sample.
    #[must_use]
    pub fn new(nodes: Vec<CacheNode>, summary: SummaryStats) -> Self {
        Self { nodes, summary }
    }
}

/// Source of slab snapshots.
///
/// Errors are fatal to the run: the sampling loop never retries a failed
/// fetch.
///
/// # Example
///
/// ```rust
/// use slabtop::error::Result;
/// use slabtop::sort::{sort_nodes, SortCriterion};
/// use slabtop::types::{CacheNode, SlabProvider, Snapshot, SummaryStats};
///
/// struct Fixed(Vec<CacheNode>);
///
/// impl SlabProvider for Fixed {
///     fn id(&self) -> &'static str {
///         "fixed"
///     }
///
///     fn fetch_snapshot(&mut self, max_nodes: usize, criterion: SortCriterion) -> Result<Snapshot> {
///         let mut nodes = self.0.clone();
///         let summary = SummaryStats::from_nodes(&nodes);
///         sort_nodes(&mut nodes, criterion);
///         nodes.truncate(max_nodes);
///         Ok(Snapshot::new(nodes, summary))
///     }
/// }
///
/// let mut provider = Fixed(vec![CacheNode::default()]);
/// let snapshot = provider.fetch_snapshot(150, SortCriterion::Objects).unwrap();
/// assert_eq!(snapshot.summary.total_caches, 1);
/// ```
pub trait SlabProvider {
    /// Identifier used in error messages.
    fn id(&self) -> &'static str;

    /// Reads a fresh snapshot ordered by `criterion`, holding at most
    /// `max_nodes` nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying statistics cannot be read or parsed.
    fn fetch_snapshot(&mut self, max_nodes: usize, criterion: SortCriterion) -> Result<Snapshot>;

    /// Returns true if this provider can work on the current system.
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: SlabProvider + ?Sized> SlabProvider for Box<P> {
    fn id(&self) -> &'static str {
        (**self).id()
    }

    fn fetch_snapshot(&mut self, max_nodes: usize, criterion: SortCriterion) -> Result<Snapshot> {
        (**self).fetch_snapshot(max_nodes, criterion)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
