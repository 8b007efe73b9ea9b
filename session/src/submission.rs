//! Outbound score reports. The coordinator decides whether a report may be
//! sent and records the outcome; issuing the request is left to a
//! [`Transport`].
//!
//! Sending is split into [`SubmissionCoordinator::begin`] and
//! [`SubmissionCoordinator::complete`] so the request can be carried out
//! asynchronously. Every submission is tagged with the epoch of the session
//! it belongs to, and results for an older epoch are discarded.

use std::cell::RefCell;
use std::fmt;

use tracing::{debug, info, warn};

use crate::report::{Receipt, ScoreReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    /// Terminal until the session is reset.
    Succeeded { message: String },
    Failed(SubmissionFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// No endpoint is configured; nothing was sent.
    NotConfigured,
    /// The request was made and failed. The report can be sent again.
    Transport(String),
}

impl SubmissionFailure {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionFailure::Transport(_))
    }
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionFailure::NotConfigured => write!(f, "no results endpoint is configured"),
            SubmissionFailure::Transport(reason) => write!(f, "submission failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Sent on reaching the checked state.
    Automatic,
    /// The respondent asked to send (again).
    Manual,
}

/// Identifies one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub epoch: u64,
    id: u64,
}

/// A request the transport should carry out.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub ticket: Ticket,
    pub endpoint: String,
    pub report: ScoreReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Send(Submission),
    Skipped(Skip),
}

/// Why no request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    InFlight,
    AlreadySucceeded,
    NotConfigured,
    /// A failed submission is only retried on request.
    AwaitingResend,
    StaleEpoch,
}

/// What happened to a completed request's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The result belonged to an earlier session and was ignored.
    Stale,
}

#[derive(Debug)]
pub struct SubmissionCoordinator {
    endpoint: Option<String>,
    epoch: u64,
    status: SubmissionStatus,
    in_flight: Option<Ticket>,
    issued: u64,
}

impl SubmissionCoordinator {
    pub fn new(endpoint: Option<String>) -> Self {
        SubmissionCoordinator {
            endpoint: endpoint.filter(|endpoint| !endpoint.trim().is_empty()),
            epoch: 0,
            status: SubmissionStatus::Idle,
            in_flight: None,
            issued: 0,
        }
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.endpoint = endpoint.filter(|endpoint| !endpoint.trim().is_empty());
    }

    /// Decide whether `report` goes out now. At most one request per epoch
    /// is in flight at any time.
    pub fn begin(&mut self, epoch: u64, report: ScoreReport, trigger: Trigger) -> Dispatch {
        if epoch != self.epoch {
            return Dispatch::Skipped(Skip::StaleEpoch);
        }
        match (&self.status, trigger) {
            (SubmissionStatus::Submitting, _) => {
                debug!(epoch, "submission already in flight");
                return Dispatch::Skipped(Skip::InFlight);
            }
            (SubmissionStatus::Succeeded { .. }, _) => return Dispatch::Skipped(Skip::AlreadySucceeded),
            (SubmissionStatus::Failed(_), Trigger::Automatic) => return Dispatch::Skipped(Skip::AwaitingResend),
            (SubmissionStatus::Idle, _) | (SubmissionStatus::Failed(_), Trigger::Manual) => {}
        }

        let Some(endpoint) = self.endpoint.clone() else {
            warn!("no results endpoint configured; scores were not sent");
            self.status = SubmissionStatus::Failed(SubmissionFailure::NotConfigured);
            return Dispatch::Skipped(Skip::NotConfigured);
        };

        self.issued += 1;
        let ticket = Ticket {
            epoch,
            id: self.issued,
        };
        self.status = SubmissionStatus::Submitting;
        self.in_flight = Some(ticket);
        info!(epoch, %endpoint, score = report.score, total = report.total, "submitting scores");
        Dispatch::Send(Submission {
            ticket,
            endpoint,
            report,
        })
    }

    /// Record the outcome of a request issued by [`begin`](Self::begin).
    pub fn complete(&mut self, ticket: Ticket, result: Result<Receipt, TransportError>) -> Resolution {
        if ticket.epoch != self.epoch || self.in_flight != Some(ticket) {
            debug!(epoch = ticket.epoch, current = self.epoch, "discarding stale submission result");
            return Resolution::Stale;
        }
        self.in_flight = None;
        self.status = match result {
            Ok(receipt) => {
                info!(message = %receipt.message, "scores submitted");
                SubmissionStatus::Succeeded {
                    message: receipt.message,
                }
            }
            Err(error) => {
                warn!(%error, "score submission failed");
                SubmissionStatus::Failed(SubmissionFailure::Transport(error.to_string()))
            }
        };
        Resolution::Applied
    }

    /// Start over for a new session. A request still in flight is not
    /// cancelled, but its result will be [`Resolution::Stale`].
    pub fn reset(&mut self, epoch: u64) {
        self.epoch = epoch;
        self.status = SubmissionStatus::Idle;
        self.in_flight = None;
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint answered with a non-2xx status.
    Status { code: u16, body: String },
    /// The request could not be made or the response could not be read.
    Network(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { code, body } if body.trim().is_empty() => {
                write!(f, "server responded with status {}", code)
            }
            TransportError::Status { code, body } => {
                write!(f, "server responded with status {}: {}", code, body.trim())
            }
            TransportError::Network(reason) => write!(f, "network error: {}", reason),
        }
    }
}

impl std::error::Error for TransportError {}

/// Carries a submission to its endpoint.
pub trait Transport {
    fn send(&self, submission: &Submission) -> Result<Receipt, TransportError>;
}

/// In-memory transport that records every report it is given.
#[derive(Debug)]
pub struct LoopbackTransport {
    sent: RefCell<Vec<ScoreReport>>,
    reply: Result<Receipt, TransportError>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        LoopbackTransport {
            sent: RefCell::new(Vec::new()),
            reply: Ok(Receipt {
                message: "Results received.".to_string(),
            }),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        LoopbackTransport {
            sent: RefCell::new(Vec::new()),
            reply: Err(error),
        }
    }

    pub fn sent(&self) -> Vec<ScoreReport> {
        self.sent.borrow().clone()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, submission: &Submission) -> Result<Receipt, TransportError> {
        self.sent.borrow_mut().push(submission.report.clone());
        self.reply.clone()
    }
}
