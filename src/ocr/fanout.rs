//! Bounded concurrent fan-out
//!
//! Runs one future per item with at most `limit` in flight and returns the
//! outputs in input order, whatever order they complete in.

use std::future::Future;
use std::str::FromStr;

use futures::{future::join_all, stream, StreamExt};
use serde::Deserialize;

/// How work is admitted once the limit is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Consecutive groups of `limit`; a group starts only after the previous
    /// one has fully settled.
    Batched,
    /// Sliding window; a new item starts as soon as any in-flight item settles.
    Window,
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Schedule::Batched),
            "window" | "sliding" => Ok(Schedule::Window),
            other => Err(format!("unknown schedule: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    limit: usize,
    schedule: Schedule,
}

impl FanOut {
    /// A limit of zero is treated as one
    pub fn new(limit: usize, schedule: Schedule) -> Self {
        Self {
            limit: limit.max(1),
            schedule,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Number of groups a batched run over `len` items is split into
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.limit)
    }

    /// Apply `f` to every item (with its index) and collect the outputs in
    /// input order.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = R>,
    {
        let total = items.len();

        match self.schedule {
            Schedule::Batched => {
                let mut outputs = Vec::with_capacity(total);
                let mut pending = items.into_iter().enumerate();
                let batches = self.batch_count(total);

                for batch in 0..batches {
                    let group: Vec<_> = pending.by_ref().take(self.limit).collect();
                    tracing::debug!(
                        "Starting batch {}/{} ({} items)",
                        batch + 1,
                        batches,
                        group.len()
                    );
                    let settled = join_all(group.into_iter().map(|(i, item)| f(i, item))).await;
                    outputs.extend(settled);
                }

                outputs
            }
            Schedule::Window => {
                stream::iter(items.into_iter().enumerate().map(|(i, item)| f(i, item)))
                    .buffered(self.limit)
                    .collect()
                    .await
            }
        }
    }
}
