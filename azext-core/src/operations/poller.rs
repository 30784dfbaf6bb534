use async_trait::async_trait;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::PollSettings;
use crate::error::{ClientError, Result};
use crate::types::{CompletedOperation, OperationId, OperationStatus};

/// Anything that can report the current status of an operation.
#[async_trait]
pub trait OperationStatusSource: Send + Sync {
    async fn query_status(&self, id: &OperationId) -> Result<OperationStatus>;
}

/// Lifecycle of a single wait.
///
/// `Pending` and `Polling` are the only non-terminal states. Once a
/// terminal state is reached it is never left again.
#[derive(Debug)]
pub enum PollState {
    /// Submitted, nothing asked yet.
    Pending,
    /// At least one status query has been issued.
    Polling,
    Succeeded,
    /// The operation failed on the server, or its status could not be read.
    Failed(ClientError),
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Polling)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Input driving a [`PollRun`] from one state to the next.
#[derive(Debug)]
enum Observation {
    Status(OperationStatus),
    QueryError(ClientError),
    DeadlineReached,
    CancelRequested,
}

/// Bookkeeping for one call to [`Poller::wait`]. Never shared between calls.
#[derive(Debug)]
struct PollRun {
    id: OperationId,
    max_query_failures: u32,
    state: PollState,
    queries: u32,
    consecutive_failures: u32,
}

impl PollRun {
    fn new(id: OperationId, max_query_failures: u32) -> Self {
        Self {
            id,
            max_query_failures,
            state: PollState::Pending,
            queries: 0,
            consecutive_failures: 0,
        }
    }

    fn begin_query(&mut self) {
        self.queries += 1;
        if matches!(self.state, PollState::Pending) {
            self.state = PollState::Polling;
        }
    }

    fn apply(&mut self, observation: Observation) {
        if self.state.is_terminal() {
            trace!(operation_id = %self.id, ?observation, "Ignoring observation after terminal state");
            return;
        }

        let next = match observation {
            Observation::Status(OperationStatus::InProgress) => {
                self.consecutive_failures = 0;
                PollState::Polling
            }
            Observation::Status(OperationStatus::Succeeded) => PollState::Succeeded,
            Observation::Status(OperationStatus::Failed { code, message }) => {
                PollState::Failed(ClientError::OperationFailed {
                    operation_id: self.id.clone(),
                    code,
                    message,
                })
            }
            Observation::QueryError(err) if err.is_transient() => {
                self.consecutive_failures += 1;
                debug!(
                    operation_id = %self.id,
                    failures = self.consecutive_failures,
                    bound = self.max_query_failures,
                    error = %err,
                    "Operation status query failed"
                );
                if self.consecutive_failures >= self.max_query_failures {
                    PollState::Failed(ClientError::OperationQueryFailed {
                        operation_id: self.id.clone(),
                        attempts: self.consecutive_failures,
                        last: Box::new(err),
                    })
                } else {
                    PollState::Polling
                }
            }
            Observation::QueryError(err) => PollState::Failed(err),
            Observation::DeadlineReached => PollState::TimedOut,
            Observation::CancelRequested => PollState::Cancelled,
        };

        if next.name() != self.state.name() {
            debug!(
                operation_id = %self.id,
                from = self.state.name(),
                to = next.name(),
                queries = self.queries,
                "Operation poll state changed"
            );
        }
        self.state = next;
    }

    /// Final result once the run is terminal, `None` while it is still going.
    fn outcome(&mut self, elapsed: Duration) -> Option<Result<CompletedOperation>> {
        if !self.state.is_terminal() {
            return None;
        }
        let state = std::mem::replace(&mut self.state, PollState::Cancelled);
        let id = self.id.clone();
        Some(match state {
            PollState::Succeeded => Ok(CompletedOperation {
                id,
                queries: self.queries,
                elapsed,
            }),
            PollState::Failed(err) => Err(err),
            PollState::TimedOut => Err(ClientError::OperationTimedOut {
                operation_id: id,
                elapsed,
            }),
            PollState::Cancelled => Err(ClientError::OperationCancelled { operation_id: id }),
            PollState::Pending | PollState::Polling => return None,
        })
    }
}

/// Waits for asynchronous operations to reach a terminal state.
///
/// Each iteration first honours cancellation, then the deadline, then issues
/// one status query. Between queries it sleeps for the poll interval,
/// clamped to the time left before the deadline, and wakes early on
/// cancellation. The first query is always issued, so even a zero deadline
/// reports an operation that has already finished.
///
/// For an operation that never settles the wait issues exactly
/// `ceil(deadline / interval)` queries and returns once the deadline has
/// passed.
///
/// Nothing is cached: waiting again on a finished operation costs one
/// confirming query.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    settings: PollSettings,
}

impl Poller {
    pub fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    /// Block until operation `id` is terminal, using the configured deadline.
    pub async fn wait<S>(
        &self,
        source: &S,
        id: &OperationId,
        cancel: &CancellationToken,
    ) -> Result<CompletedOperation>
    where
        S: OperationStatusSource + ?Sized,
    {
        self.wait_with_deadline(source, id, self.settings.deadline, cancel)
            .await
    }

    /// Block until operation `id` is terminal or `deadline` has passed.
    ///
    /// # Errors
    ///
    /// - [`ClientError::OperationFailed`] when the server reports `Failed`
    /// - [`ClientError::OperationQueryFailed`] after `max_query_failures`
    ///   consecutive transient query errors
    /// - [`ClientError::OperationTimedOut`] once the deadline has passed
    /// - [`ClientError::OperationCancelled`] when `cancel` fires first
    /// - any non-transient query error, unchanged
    pub async fn wait_with_deadline<S>(
        &self,
        source: &S,
        id: &OperationId,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<CompletedOperation>
    where
        S: OperationStatusSource + ?Sized,
    {
        self.settings.validate()?;
        if id.as_str().trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "operation id must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let mut run = PollRun::new(id.clone(), self.settings.max_query_failures);

        loop {
            if cancel.is_cancelled() {
                run.apply(Observation::CancelRequested);
            } else if run.queries > 0 && started.elapsed() >= deadline {
                run.apply(Observation::DeadlineReached);
            } else {
                run.begin_query();
                trace!(operation_id = %id, query = run.queries, "Querying operation status");
                let observation = match source.query_status(id).await {
                    Ok(status) => Observation::Status(status),
                    Err(err) => Observation::QueryError(err),
                };
                run.apply(observation);
            }

            if let Some(result) = run.outcome(started.elapsed()) {
                return result;
            }

            let remaining = deadline.saturating_sub(started.elapsed());
            let pause = self.settings.interval.min(remaining);
            tokio::select! {
                _ = sleep(pause) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }
}
