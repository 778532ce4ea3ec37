// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Progress events emitted by a run, and the sinks that display them.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Step { step: u8, message: String },
    Progress { current: usize, total: usize, symbol: String },
    Warning { message: String },
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: RunEvent);

    fn step(&self, step: u8, message: &str) {
        tracing::info!("[{}] {}", step, message);
        self.report(RunEvent::Step {
            step,
            message: message.to_string(),
        });
    }

    fn progress(&self, current: usize, total: usize, symbol: &str) {
        self.report(RunEvent::Progress {
            current,
            total,
            symbol: symbol.to_string(),
        });
    }

    fn warn(&self, message: String) {
        tracing::warn!("{}", message);
        self.report(RunEvent::Warning { message });
    }
}

/// Keeps every event in memory, for tests and run summaries
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RunEvent::Warning { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Forwards events to a channel; used by the SSE endpoint
#[derive(Debug)]
pub struct ChannelReporter {
    tx: UnboundedSender<RunEvent>,
}

impl ChannelReporter {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, event: RunEvent) {
        // The browser may have gone away; the run still finishes
        let _ = self.tx.send(event);
    }
}

/// Terminal progress bar for the CLI
#[derive(Debug)]
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: RunEvent) {
        match event {
            RunEvent::Step { message, .. } => {
                self.bar.set_length(0);
                self.bar.set_position(0);
                self.bar.println(format!("▶ {}", message));
            }
            RunEvent::Progress {
                current,
                total,
                symbol,
            } => {
                self.bar.set_length(total as u64);
                self.bar.set_position(current as u64);
                self.bar.set_message(format!("Processing {}", symbol));
            }
            RunEvent::Warning { message } => {
                self.bar.println(format!("⚠️  {}", message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = RunEvent::Progress {
            current: 2,
            total: 5,
            symbol: "INFY".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "progress");
        assert_eq!(json["current"], 2);
        assert_eq!(json["symbol"], "INFY");
    }

    #[test]
    fn test_recording_reporter_collects_warnings() {
        let reporter = RecordingReporter::default();
        reporter.step(1, "Loading");
        reporter.warn("INFY: timeout".to_string());

        assert_eq!(reporter.events().len(), 2);
        assert_eq!(reporter.warnings(), vec!["INFY: timeout"]);
    }

    #[tokio::test]
    async fn test_channel_reporter_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ChannelReporter::new(tx);
        reporter.step(3, "Scraping");

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            RunEvent::Step {
                step: 3,
                message: "Scraping".to_string()
            }
        );
    }
}
