//! Executes parsed scripts against a string cache.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cache::{CacheStats, RecencyCache};
use crate::types::config::OverwritePolicy;
use crate::CacheResult;

use super::script::{self, Operation, Step};

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub line: usize,

    #[serde(flatten)]
    pub operation: Operation,

    /// Value returned by `get`, `peek` or `remove`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Previous value replaced by a `put`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,

    /// Keys evicted by a `put` or `resize`, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evicted: Vec<String>,
}

/// Result of a full replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub policy: OverwritePolicy,
    pub steps: Vec<StepOutcome>,

    /// Remaining entries from least- to most-recently used.
    pub final_order: Vec<(String, String)>,

    pub stats: CacheStats,
}

impl ReplayReport {
    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable rendering, one line per step.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for step in &self.steps {
            let _ = write!(out, "line {}: {}", step.line, step.operation);
            match &step.operation {
                Operation::Get { .. } | Operation::Peek { .. } | Operation::Remove { .. } => {
                    let _ = write!(out, " -> {}", step.result.as_deref().unwrap_or("(absent)"));
                }
                _ => {}
            }
            if let Some(replaced) = &step.replaced {
                let _ = write!(out, " (replaced {replaced})");
            }
            if !step.evicted.is_empty() {
                let _ = write!(out, " (evicted {})", step.evicted.join(", "));
            }
            out.push('\n');
        }

        let order: Vec<String> = self
            .final_order
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let _ = writeln!(out, "final order (LRU -> MRU): {}", order.join(", "));
        let _ = writeln!(
            out,
            "size={} capacity={} hits={} misses={} evictions={} hit_rate={:.1}%",
            self.stats.size,
            self.stats.capacity,
            self.stats.hits,
            self.stats.misses,
            self.stats.evictions,
            self.stats.hit_rate() * 100.0
        );

        out
    }
}

/// Drives a `RecencyCache<String, String>` from script steps.
#[derive(Debug)]
pub struct Replayer {
    cache: RecencyCache<String, String>,
}

impl Replayer {
    /// Creates a replayer over `cache`.
    pub fn new(cache: RecencyCache<String, String>) -> Self {
        Self { cache }
    }

    /// Parses and runs `source` in one go.
    pub fn run_source(cache: RecencyCache<String, String>, source: &str) -> CacheResult<ReplayReport> {
        let steps = script::parse(source)?;
        Ok(Self::new(cache).run(&steps))
    }

    /// The cache being driven.
    pub fn cache(&self) -> &RecencyCache<String, String> {
        &self.cache
    }

    /// Applies a single step.
    pub fn apply(&mut self, step: &Step) -> StepOutcome {
        let mut outcome = StepOutcome {
            line: step.line,
            operation: step.operation.clone(),
            result: None,
            replaced: None,
            evicted: Vec::new(),
        };

        match &step.operation {
            Operation::Put { key, value } => {
                let displaced = self.cache.push(key.clone(), value.clone());
                outcome.replaced = displaced.replaced;
                outcome.evicted = displaced.evicted.into_iter().map(|(k, _)| k).collect();
            }
            Operation::Get { key } => {
                outcome.result = self.cache.get(key.as_str()).cloned();
            }
            Operation::Peek { key } => {
                outcome.result = self.cache.peek(key.as_str()).cloned();
            }
            Operation::Remove { key } => {
                outcome.result = self.cache.remove(key.as_str());
            }
            Operation::Clear => self.cache.clear(),
            Operation::Resize { capacity } => {
                outcome.evicted = self
                    .cache
                    .resize(*capacity)
                    .into_iter()
                    .map(|(k, _)| k)
                    .collect();
            }
        }

        tracing::trace!(line = step.line, op = %step.operation, "replayed step");
        outcome
    }

    /// Applies every step and reports the final state.
    pub fn run(mut self, steps: &[Step]) -> ReplayReport {
        let outcomes: Vec<StepOutcome> = steps.iter().map(|step| self.apply(step)).collect();

        let report = ReplayReport {
            policy: self.cache.policy(),
            steps: outcomes,
            final_order: self
                .cache
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            stats: self.cache.stats(),
        };

        tracing::debug!(
            steps = report.steps.len(),
            evictions = report.stats.evictions,
            "replay finished"
        );

        report
    }
}
