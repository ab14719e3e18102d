//! Spinner output for commands that wait on NDB operations
//!
//! Wraps the core poller's progress events in an `indicatif` spinner.

use indicatif::{ProgressBar, ProgressStyle};
use ndbctl_core::models::OperationStatus;
use ndbctl_core::{ProgressCallback, ProgressEvent};
use std::time::Duration;

/// Spinner tracking one operation
pub struct OperationSpinner {
    bar: ProgressBar,
}

impl OperationSpinner {
    /// Start a spinner; hidden entirely for machine-readable output
    pub fn start(label: &str, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
        {
            bar.set_style(style);
        }
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Progress callback that drives this spinner
    pub fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |event: ProgressEvent| match &event {
            ProgressEvent::Started { operation_id } => {
                bar.set_message(format!("Operation {} started", operation_id));
            }
            ProgressEvent::Polling {
                operation_id,
                status,
                percentage_complete,
                ..
            } => {
                let pct = percentage_complete
                    .as_deref()
                    .map(|p| format!(" ({}%)", p))
                    .unwrap_or_default();
                bar.set_message(format!(
                    "Operation {}: {}{}",
                    operation_id,
                    format_status(status),
                    pct
                ));
            }
            ProgressEvent::Completed { operation_id, .. } => {
                bar.finish_with_message(format!(
                    "Operation {}: {}",
                    operation_id,
                    format_status(&OperationStatus::Completed)
                ));
            }
            ProgressEvent::Failed {
                operation_id,
                error,
            } => {
                bar.finish_with_message(format!("Operation {} failed: {}", operation_id, error));
            }
        })
    }

    /// Stop the spinner if no terminal event did
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Status with a status icon
pub fn format_status(status: &OperationStatus) -> String {
    match status {
        OperationStatus::Completed => format!("\u{2713} {}", status), // checkmark
        OperationStatus::Failed => format!("\u{2717} {}", status),    // x mark
        OperationStatus::Pending | OperationStatus::Transient(_) => {
            format!("\u{21bb} {}", status) // arrow circle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status_icons() {
        assert!(format_status(&OperationStatus::Completed).starts_with('\u{2713}'));
        assert!(format_status(&OperationStatus::Failed).starts_with('\u{2717}'));
        assert!(format_status(&OperationStatus::Transient("1".into())).starts_with('\u{21bb}'));
    }

    #[test]
    fn test_hidden_spinner_accepts_events() {
        let spinner = OperationSpinner::start("waiting", false);
        let callback = spinner.callback();
        callback(ProgressEvent::Started {
            operation_id: "op-1".to_string(),
        });
        callback(ProgressEvent::Completed {
            operation_id: "op-1".to_string(),
            entity_id: None,
        });
        spinner.finish();
    }
}
