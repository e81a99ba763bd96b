use std::time::Duration;

pub type SystemId = u32;
pub type SiteId = u64;

/// Immutable snapshot of one pickup location: everything worth hauling at a
/// single site, already collapsed to a value/volume pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub site_id: SiteId,
    pub system_id: SystemId,
    pub value: f64,
    pub volume: f64,
}

/// Canonical identity of a set of systems: a sorted, deduplicated vector.
/// Used as a map key so that two tours visiting the same systems collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SystemSet(Vec<SystemId>);

impl SystemSet {
    pub fn singleton(system_id: SystemId) -> Self {
        SystemSet(vec![system_id])
    }

    pub fn from_systems(systems: impl IntoIterator<Item = SystemId>) -> Self {
        let mut inner: Vec<SystemId> = systems.into_iter().collect();
        inner.sort_unstable();
        inner.dedup();
        SystemSet(inner)
    }

    /// Copy of this set with `system_id` added (no-op when already present).
    pub fn with(&self, system_id: SystemId) -> Self {
        match self.0.binary_search(&system_id) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut inner = self.0.clone();
                inner.insert(pos, system_id);
                SystemSet(inner)
            }
        }
    }

    pub fn contains(&self, system_id: SystemId) -> bool {
        self.0.binary_search(&system_id).is_ok()
    }

    /// True when any of `others` is a member.
    pub fn intersects(&self, others: &[SystemId]) -> bool {
        others.iter().any(|&s| self.contains(s))
    }

    pub fn iter(&self) -> impl Iterator<Item = SystemId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A completed plan: the round trip and the sites actually collected on it.
///
/// `jump_count` counts discrete movements: one per tour hop plus one per
/// site stop.
#[derive(Debug, Clone)]
pub struct Solution {
    pub tour: Vec<SystemId>,
    pub load: Vec<Site>,
    pub total_value: f64,
    pub total_volume: f64,
    pub jump_count: usize,
    pub value_per_jump: f64,
}

impl Solution {
    pub fn new(tour: Vec<SystemId>, load: Vec<Site>) -> Self {
        let total_value: f64 = load.iter().map(|s| s.value).sum();
        let total_volume: f64 = load.iter().map(|s| s.volume).sum();
        let jump_count = tour.len().saturating_sub(1) + load.len();
        let value_per_jump = if jump_count > 0 {
            total_value / jump_count as f64
        } else {
            0.0
        };
        Solution {
            tour,
            load,
            total_value,
            total_volume,
            jump_count,
            value_per_jump,
        }
    }
}

/// Tunables shared by both sweep engines.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub volume_budget: f64,
    pub time_budget: Duration,
    pub max_segment_length: u32,
    pub max_priority_distance: u32,
    pub priority_decay: f64,
    pub solutions_cap: usize,
}

impl SweepConfig {
    pub fn new(volume_budget: f64, time_budget: Duration) -> Self {
        SweepConfig {
            volume_budget,
            time_budget,
            max_segment_length: 12,
            max_priority_distance: 5,
            priority_decay: 0.5,
            solutions_cap: 500_000,
        }
    }
}
