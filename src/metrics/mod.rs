//! Metrics collection module
//!
//! Tracks query outcomes, stage latency, and retrieval source reliability.

use crate::orchestrator::QueryStatus;
use crate::pipeline::Stage;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Latency samples kept per stage
const LATENCY_WINDOW: usize = 100;

/// Process-wide metrics collector
pub struct Metrics {
    /// Total query count
    total_queries: AtomicU64,
    /// Queries per final status
    statuses: RwLock<HashMap<QueryStatus, u64>>,
    /// Recent stage durations in ms
    stage_times: RwLock<HashMap<Stage, VecDeque<u64>>>,
    /// Source error counts
    source_errors: RwLock<HashMap<String, u64>>,
    /// Source success counts
    source_successes: RwLock<HashMap<String, u64>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_queries: AtomicU64::new(0),
            statuses: RwLock::new(HashMap::new()),
            stage_times: RwLock::new(HashMap::new()),
            source_errors: RwLock::new(HashMap::new()),
            source_successes: RwLock::new(HashMap::new()),
        }
    }

    /// Record a finished query
    pub fn record_query(&self, status: QueryStatus) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        *write(&self.statuses).entry(status).or_insert(0) += 1;
    }

    /// Record how long a stage took
    pub fn record_stage_time(&self, stage: Stage, time_ms: u64) {
        let mut times = write(&self.stage_times);
        let entry = times.entry(stage).or_default();

        if entry.len() >= LATENCY_WINDOW {
            entry.pop_front();
        }
        entry.push_back(time_ms);
    }

    /// Record a failed call to a retrieval source
    pub fn record_error(&self, source: &str) {
        *write(&self.source_errors).entry(source.to_string()).or_insert(0) += 1;
    }

    /// Record a successful call to a retrieval source
    pub fn record_success(&self, source: &str) {
        *write(&self.source_successes).entry(source.to_string()).or_insert(0) += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    pub fn status_count(&self, status: QueryStatus) -> u64 {
        read(&self.statuses).get(&status).copied().unwrap_or(0)
    }

    /// Average of the recent durations for a stage
    pub fn avg_stage_time(&self, stage: Stage) -> Option<u64> {
        let times = read(&self.stage_times);
        times.get(&stage).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Success percentage for a source, 100 when it has not been called
    pub fn reliability(&self, source: &str) -> f64 {
        let errors = read(&self.source_errors).get(source).copied().unwrap_or(0);
        let successes = read(&self.source_successes).get(source).copied().unwrap_or(0);

        let total = errors + successes;
        if total == 0 {
            100.0
        } else {
            (successes as f64 / total as f64) * 100.0
        }
    }

    /// Snapshot for reporting
    pub fn snapshot(&self) -> MetricsSnapshot {
        let statuses = QueryStatus::ALL
            .iter()
            .map(|s| (s.to_string(), self.status_count(*s)))
            .collect();

        let stages = Stage::ALL
            .iter()
            .filter_map(|s| self.avg_stage_time(*s).map(|avg| (s.to_string(), avg)))
            .collect();

        let mut names: Vec<String> = read(&self.source_successes).keys().cloned().collect();
        names.extend(read(&self.source_errors).keys().cloned());
        names.sort();
        names.dedup();

        let sources = names
            .into_iter()
            .map(|name| {
                let stats = SourceStats {
                    successes: read(&self.source_successes).get(&name).copied().unwrap_or(0),
                    errors: read(&self.source_errors).get(&name).copied().unwrap_or(0),
                    reliability: self.reliability(&name),
                };
                (name, stats)
            })
            .collect();

        MetricsSnapshot {
            total_queries: self.total_queries(),
            statuses,
            avg_stage_ms: stages,
            sources,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Call counts for one retrieval source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub successes: u64,
    pub errors: u64,
    pub reliability: f64,
}

/// Point-in-time view of all metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub statuses: BTreeMap<String, u64>,
    pub avg_stage_ms: BTreeMap<String, u64>,
    pub sources: BTreeMap<String, SourceStats>,
}
