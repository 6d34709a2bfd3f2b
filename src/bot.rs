//! Bot mode: one polling loop for commands and sweeps.
//!
//! Each tick:
//! 1. poll the command source without waiting, apply every command
//! 2. run a scheduler tick
//! 3. sleep for the fixed tick granularity

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::channels::{CommandSource, InboundCommand, Notifier};
use crate::commands::{apply, interpret, STARTUP_TEXT};
use crate::fetch::PageFetcher;
use crate::scheduler::{Scheduler, SweepReport};

/// Everything the loop mutates between ticks.
pub struct BotState {
    pub scheduler: Scheduler,
    /// Next update id to request. `None` until the first update arrives.
    pub next_offset: Option<i64>,
    /// Interval for `watch` commands that don't name one.
    pub default_interval: f64,
}

impl BotState {
    pub fn new(scheduler: Scheduler, default_interval: f64) -> Self {
        Self {
            scheduler,
            next_offset: None,
            default_interval,
        }
    }

    /// Apply one inbound command and return the reply, if any.
    ///
    /// The offset advances even for updates that carry no usable text.
    pub fn handle(&mut self, command: &InboundCommand, now: Instant) -> Option<String> {
        self.next_offset = Some(advance_offset(self.next_offset, command.update_id));
        if command.recipient.is_empty() || command.text.trim().is_empty() {
            return None;
        }
        let intent = interpret(&command.text);
        debug!(chat = %command.recipient, ?intent, "command");
        apply(
            intent,
            &command.recipient,
            &mut self.scheduler,
            self.default_interval,
            now,
        )
    }
}

/// Offset to request after seeing `update_id`.
pub fn advance_offset(current: Option<i64>, update_id: i64) -> i64 {
    current.unwrap_or(0).max(update_id + 1)
}

/// Drives a [`BotState`] against its collaborators.
pub struct BotService<'a> {
    commands: &'a dyn CommandSource,
    notifier: &'a dyn Notifier,
    fetcher: &'a dyn PageFetcher,
    tick: Duration,
}

impl<'a> BotService<'a> {
    pub fn new(
        commands: &'a dyn CommandSource,
        notifier: &'a dyn Notifier,
        fetcher: &'a dyn PageFetcher,
        tick: Duration,
    ) -> Self {
        Self {
            commands,
            notifier,
            fetcher,
            tick,
        }
    }

    /// Send the startup banner to the configured chat.
    pub async fn announce(&self, chat_id: Option<&str>) {
        if let Some(chat_id) = chat_id {
            self.notifier.send(chat_id, STARTUP_TEXT).await;
        }
    }

    /// One iteration: drain commands, then sweep due tasks.
    pub async fn step(&self, state: &mut BotState) -> Vec<SweepReport> {
        let commands = self.commands.poll(state.next_offset, 0).await;
        for command in &commands {
            if let Some(reply) = state.handle(command, Instant::now()) {
                self.notifier.send(&command.recipient, &reply).await;
            }
        }

        let reports = state
            .scheduler
            .tick(Instant::now(), self.fetcher, self.notifier)
            .await;
        for report in &reports {
            for check in &report.checks {
                info!(task = %report.task_id, url = %check.url, "{}", check.state);
            }
        }
        reports
    }

    /// Run until the process is interrupted.
    pub async fn run(&self, state: &mut BotState) {
        info!(tick_ms = self.tick.as_millis() as u64, "Bot loop started");
        loop {
            self.step(state).await;
            tokio::time::sleep(self.tick).await;
        }
    }
}
