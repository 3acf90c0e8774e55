//! Sort key registry and cache node ordering.
//!
//! Every character maps to a [`SortCriterion`]; characters outside the table
//! fall back to [`SortCriterion::Objects`].

use std::cmp::Ordering;

use crate::types::CacheNode;

/// Field cache nodes are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortCriterion {
    Name,
    #[default]
    Objects,
    ActiveObjects,
    ObjectSize,
    ObjectsPerSlab,
    /// Sortable but not displayed.
    PagesPerSlab,
    Slabs,
    /// Sortable but not displayed.
    ActiveSlabs,
    CacheSize,
    Utilization,
}

impl SortCriterion {
    /// Every criterion in help-text order.
    pub const ALL: [Self; 10] = [
        Self::ActiveObjects,
        Self::ObjectsPerSlab,
        Self::CacheSize,
        Self::Slabs,
        Self::ActiveSlabs,
        Self::Name,
        Self::Objects,
        Self::PagesPerSlab,
        Self::ObjectSize,
        Self::Utilization,
    ];

    /// Resolves a key character, case-insensitively.
    ///
    /// Total: unrecognized characters yield the default criterion.
    pub fn resolve(key: char) -> Self {
        match key.to_ascii_lowercase() {
            'n' => Self::Name,
            'o' => Self::Objects,
            'a' => Self::ActiveObjects,
            's' => Self::ObjectSize,
            'b' => Self::ObjectsPerSlab,
            'p' => Self::PagesPerSlab,
            'l' => Self::Slabs,
            'v' => Self::ActiveSlabs,
            'c' => Self::CacheSize,
            'u' => Self::Utilization,
            _ => Self::default(),
        }
    }

    /// Resolves the first character of `arg`; empty input yields the default.
    pub fn from_arg(arg: &str) -> Self {
        arg.chars().next().map(Self::resolve).unwrap_or_default()
    }

    /// The lowercase key that selects this criterion.
    pub fn key(&self) -> char {
        match self {
            Self::Name => 'n',
            Self::Objects => 'o',
            Self::ActiveObjects => 'a',
            Self::ObjectSize => 's',
            Self::ObjectsPerSlab => 'b',
            Self::PagesPerSlab => 'p',
            Self::Slabs => 'l',
            Self::ActiveSlabs => 'v',
            Self::CacheSize => 'c',
            Self::Utilization => 'u',
        }
    }

    /// Help-text description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ActiveObjects => "sort by number of active objects",
            Self::ObjectsPerSlab => "sort by objects per slab",
            Self::CacheSize => "sort by cache size",
            Self::Slabs => "sort by number of slabs",
            Self::ActiveSlabs => "sort by (non display) number of active slabs",
            Self::Name => "sort by name",
            Self::Objects => "sort by number of objects (the default)",
            Self::PagesPerSlab => "sort by (non display) pages per slab",
            Self::ObjectSize => "sort by object size",
            Self::Utilization => "sort by cache utilization",
        }
    }

    /// Orders two nodes for display.
    ///
    /// Numeric criteria put the largest value first, `Name` is alphabetical.
    /// Ties fall back to the name so output is stable between ticks.
    pub fn compare(&self, a: &CacheNode, b: &CacheNode) -> Ordering {
        let primary = match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Objects => b.objects.cmp(&a.objects),
            Self::ActiveObjects => b.active_objects.cmp(&a.active_objects),
            Self::ObjectSize => b.object_size.cmp(&a.object_size),
            Self::ObjectsPerSlab => b.objects_per_slab.cmp(&a.objects_per_slab),
            Self::PagesPerSlab => b.pages_per_slab.cmp(&a.pages_per_slab),
            Self::Slabs => b.slabs.cmp(&a.slabs),
            Self::ActiveSlabs => b.active_slabs.cmp(&a.active_slabs),
            Self::CacheSize => b.cache_size.cmp(&a.cache_size),
            Self::Utilization => b.utilization_percent().total_cmp(&a.utilization_percent()),
        };
        primary.then_with(|| a.name.cmp(&b.name))
    }
}

/// Sorts nodes in place by `criterion`.
pub fn sort_nodes(nodes: &mut [CacheNode], criterion: SortCriterion) {
    nodes.sort_by(|a, b| criterion.compare(a, b));
}

/// Help text listing every sort key.
pub fn criteria_help() -> String {
    let mut text = String::from("The following are valid sort criteria:\n");
    for criterion in SortCriterion::ALL {
        text.push_str(&format!(" {}: {}\n", criterion.key(), criterion.description()));
    }
    text
}
