//! Scheduler core: owns the task table and drives due sweeps.
//!
//! ```text
//! Scheduler
//!   ├── "chat-1" → WatchTask [a.test, b.test] every 5s
//!   ├── "chat-2" → WatchTask [c.test] every 30s
//!   └── tick(now) → due tasks swept in id order
//!                     └── entries into present → Notifier::send(task id, text)
//! ```
//!
//! The table is only touched from the polling loop that owns the scheduler,
//! so nothing here locks.

pub mod task;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::channels::Notifier;
use crate::fetch::PageFetcher;
use crate::matcher::Phrase;

pub use task::{SweepPolicy, UrlCheck, UrlState, WatchTask, MAX_INTERVAL_SECS};

/// One task's sweep during a tick.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub task_id: String,
    pub checks: Vec<UrlCheck>,
}

impl SweepReport {
    /// URLs that entered the present state in this sweep.
    pub fn detections(&self) -> impl Iterator<Item = &str> + '_ {
        self.checks
            .iter()
            .filter(|c| c.notify)
            .map(|c| c.url.as_str())
    }

    pub fn any_present(&self) -> bool {
        self.checks.iter().any(|c| c.state.is_present())
    }
}

/// Task table plus the settings every sweep shares.
pub struct Scheduler {
    tasks: BTreeMap<String, WatchTask>,
    phrase: Phrase,
    policy: SweepPolicy,
}

impl Scheduler {
    pub fn new(phrase: Phrase) -> Self {
        Self {
            tasks: BTreeMap::new(),
            phrase,
            policy: SweepPolicy::Full,
        }
    }

    /// Use a different sweep policy for every task.
    pub fn with_policy(mut self, policy: SweepPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn phrase(&self) -> &Phrase {
        &self.phrase
    }

    /// Start (or restart) watching for `id`. Any previous task for `id` is
    /// dropped along with its states. The new task is due at `now`.
    ///
    /// Returns `false` and leaves the table untouched when `urls` is empty.
    pub fn start_watch(
        &mut self,
        id: &str,
        urls: Vec<String>,
        interval: Duration,
        now: Instant,
    ) -> bool {
        let Some(task) = WatchTask::new(id, urls, interval, now) else {
            return false;
        };
        let replaced = self.tasks.insert(id.to_string(), task).is_some();
        info!(
            task = id,
            interval_secs = interval.as_secs_f64(),
            replaced,
            "watch started"
        );
        true
    }

    /// Remove the task for `id`. Returns whether one existed.
    pub fn stop(&mut self, id: &str) -> bool {
        let removed = self.tasks.remove(id).is_some();
        if removed {
            info!(task = id, "watch stopped");
        }
        removed
    }

    pub fn task(&self, id: &str) -> Option<&WatchTask> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &WatchTask> + '_ {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest time any task becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.values().map(WatchTask::next_due_at).min()
    }

    /// Sweep every task due at `now`, send a notification per entry into
    /// present, and reschedule each swept task to `now + interval`.
    ///
    /// Tasks that aren't due are untouched.
    pub async fn tick(
        &mut self,
        now: Instant,
        fetcher: &dyn PageFetcher,
        notifier: &dyn Notifier,
    ) -> Vec<SweepReport> {
        let mut reports = Vec::new();

        for task in self.tasks.values_mut() {
            if !task.is_due(now) {
                continue;
            }

            let checks = task.check(&self.phrase, fetcher, self.policy).await;
            for check in checks.iter().filter(|c| c.notify) {
                let text = detection_message(&self.phrase, &check.url);
                notifier.send(task.id(), &text).await;
            }
            task.reschedule_from(now);

            reports.push(SweepReport {
                task_id: task.id().to_string(),
                checks,
            });
        }

        if !reports.is_empty() {
            debug!(swept = reports.len(), total = self.tasks.len(), "tick");
        }
        reports
    }
}

/// Notification body for a detected phrase.
pub fn detection_message(phrase: &Phrase, url: &str) -> String {
    format!("🔔 Found '{}'\n\n🔗 Link:\n{}", phrase.raw(), url)
}
