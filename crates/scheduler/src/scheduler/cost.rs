use std::collections::HashMap;
use std::time::Duration;

use framefill_core::TaskKind;
use serde::Serialize;

/// Lifetime execution totals for one task kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostEntry {
    pub total_micros: u64,
    pub calls: u64,
}

impl CostEntry {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(self.total_micros / self.calls)
        }
    }
}

/// Running cost estimates per task kind.
///
/// Totals are cumulative with no decay, so an estimate settles over time and
/// is slow to follow a workload that changes.
#[derive(Debug, Default)]
pub struct CostTable {
    entries: HashMap<TaskKind, CostEntry>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: &TaskKind, elapsed: Duration) {
        let entry = self.entries.entry(kind.clone()).or_default();
        entry.total_micros = entry.total_micros.saturating_add(elapsed.as_micros() as u64);
        entry.calls += 1;
    }

    /// Average cost of `kind`, or `None` if it has never run.
    pub fn average(&self, kind: &TaskKind) -> Option<Duration> {
        self.entries.get(kind).map(CostEntry::average)
    }

    /// Average cost of `kind`, falling back to `baseline` for unseen kinds.
    pub fn estimate(&self, kind: &TaskKind, baseline: Duration) -> Duration {
        self.average(kind).unwrap_or(baseline)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, kind: &TaskKind) -> Option<CostEntry> {
        self.entries.get(kind).copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
