//! Progress tracking and operation polling for async NDB operations
//!
//! Create and delete calls return an operation id which must be polled
//! until the operation reaches COMPLETED or FAILED. The poller waits the
//! configured delay before every status fetch and gives up once the
//! deadline passes.
//!
//! FAILED is terminal, so polling stops there and the outcome is handed
//! back as a [`PollResult`]. Callers that need success use
//! [`PollResult::into_completed`], which turns FAILED into
//! [`CoreError::OperationFailed`].

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::OperationSource;
use crate::error::{CoreError, Result};
use crate::models::{Operation, OperationStatus};

/// Default delay between status fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default deadline for a single lifecycle action
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has started
    Started { operation_id: String },
    /// One status fetch returned
    Polling {
        operation_id: String,
        status: OperationStatus,
        percentage_complete: Option<String>,
        elapsed: Duration,
    },
    /// Operation reached COMPLETED
    Completed {
        operation_id: String,
        entity_id: Option<String>,
    },
    /// Operation reached FAILED
    Failed { operation_id: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI drives its spinner with this; library callers usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// What to poll and for how long
#[derive(Debug, Clone, PartialEq)]
pub struct PollRequest {
    pub operation_id: String,
    /// Entity the operation acts on, used in diagnostics
    pub entity_id: String,
    /// Wait before each status fetch
    pub delay: Duration,
    /// Overall deadline
    pub timeout: Duration,
}

impl PollRequest {
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_id: "unknown".to_string(),
            delay: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn for_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Terminal outcome of a poll
#[derive(Debug, Clone)]
pub struct PollResult {
    /// Either `Completed` or `Failed`
    pub status: OperationStatus,
    /// Last operation snapshot fetched
    pub operation: Operation,
    pub entity_id: String,
    /// Number of status fetches made
    pub attempts: u32,
    pub elapsed: Duration,
}

impl PollResult {
    pub fn is_completed(&self) -> bool {
        self.status == OperationStatus::Completed
    }

    /// Unwrap a COMPLETED operation, escalating FAILED to an error
    pub fn into_completed(self) -> Result<Operation> {
        match self.status {
            OperationStatus::Completed => Ok(self.operation),
            _ => Err(CoreError::OperationFailed {
                message: failure_message(&self.operation),
                operation_id: self.operation.id,
                entity_id: self.entity_id,
                percentage_complete: self.operation.percentage_complete,
            }),
        }
    }
}

fn failure_message(operation: &Operation) -> String {
    match (&operation.message, &operation.percentage_complete) {
        (Some(message), Some(pct)) => format!("{} (percentage complete: {})", message, pct),
        (Some(message), None) => message.clone(),
        (None, Some(pct)) => format!("operation failed at {}%", pct),
        (None, None) => "operation failed".to_string(),
    }
}

/// Poll an operation until it reaches a terminal state
///
/// # Arguments
///
/// * `source` - Where operation status is fetched from
/// * `request` - Operation id, entity id, delay and deadline
/// * `on_progress` - Optional callback for progress updates
///
/// # Errors
///
/// * [`CoreError::MissingOperationId`] for an empty id, before any fetch
/// * [`CoreError::OperationTimeout`] when the deadline passes first
/// * any error from the status fetch itself, unretried
///
/// # Example
///
/// ```rust,ignore
/// use ndbctl_core::{PollRequest, poll_operation};
/// use std::time::Duration;
///
/// let request = PollRequest::new(&handle.operation_id)
///     .for_entity(&handle.entity_id)
///     .with_delay(Duration::from_secs(30))
///     .with_timeout(Duration::from_secs(1800));
///
/// let result = poll_operation(&client, &request, None).await?;
/// let operation = result.into_completed()?;
/// ```
pub async fn poll_operation<S>(
    source: &S,
    request: &PollRequest,
    on_progress: Option<ProgressCallback>,
) -> Result<PollResult>
where
    S: OperationSource + ?Sized,
{
    if request.operation_id.is_empty() {
        return Err(CoreError::MissingOperationId {
            action: format!("waiting on db server {}", request.entity_id),
        });
    }

    info!("polling for operation with id: {}", request.operation_id);
    emit(
        &on_progress,
        ProgressEvent::Started {
            operation_id: request.operation_id.clone(),
        },
    );

    let start = Instant::now();
    match tokio::time::timeout(
        request.timeout,
        poll_until_terminal(source, request, &on_progress, start),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "operation {} did not finish within {:?}",
                request.operation_id, request.timeout
            );
            Err(CoreError::OperationTimeout {
                operation_id: request.operation_id.clone(),
                entity_id: request.entity_id.clone(),
                timeout: request.timeout,
            })
        }
    }
}

async fn poll_until_terminal<S>(
    source: &S,
    request: &PollRequest,
    on_progress: &Option<ProgressCallback>,
    start: Instant,
) -> Result<PollResult>
where
    S: OperationSource + ?Sized,
{
    let mut attempts = 0u32;

    loop {
        tokio::time::sleep(request.delay).await;

        let operation = source.get_operation(&request.operation_id).await?;
        attempts += 1;
        let status = operation.status();
        let elapsed = start.elapsed();

        debug!(
            "operation {} status {} ({:?}% after {:.0}s)",
            request.operation_id,
            status,
            operation.percentage_complete,
            elapsed.as_secs_f64()
        );
        emit(
            on_progress,
            ProgressEvent::Polling {
                operation_id: request.operation_id.clone(),
                status: status.clone(),
                percentage_complete: operation.percentage_complete.clone(),
                elapsed,
            },
        );

        match status {
            OperationStatus::Completed => {
                info!("operation {} completed", request.operation_id);
                emit(
                    on_progress,
                    ProgressEvent::Completed {
                        operation_id: request.operation_id.clone(),
                        entity_id: operation.entity_id.clone(),
                    },
                );
            }
            OperationStatus::Failed => {
                warn!("operation {} failed", request.operation_id);
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        operation_id: request.operation_id.clone(),
                        error: failure_message(&operation),
                    },
                );
            }
            // Still in flight, wait and try again
            OperationStatus::Pending | OperationStatus::Transient(_) => continue,
        }

        return Ok(PollResult {
            status,
            operation,
            entity_id: request.entity_id.clone(),
            attempts,
            elapsed,
        });
    }
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
