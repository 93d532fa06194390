//! Request/response recording for external observability.
//!
//! A [`RequestResponseRecorder`] forwards every outbound request and every
//! inbound response or transport error to a channel. Sending never blocks the
//! request path; the consumer drains the receiver at its own pace.
//!
//! [`RequestResponseRecorder::channel`] keeps every record until it is
//! received, bodies included. A consumer that may fall behind should use
//! [`RequestResponseRecorder::bounded`], which drops records once its buffer
//! is full.
//!
//! # Example
//!
//! ```rust
//! use platform_api::clients::{Record, RequestResponseRecorder};
//!
//! let (recorder, mut records) = RequestResponseRecorder::channel();
//! # drop(recorder);
//! # async {
//! while let Some(record) = records.recv().await {
//!     match record {
//!         Record::Request { id, request, .. } => println!("#{id} -> {request}"),
//!         Record::Response { id, code, .. } => println!("#{id} <- {code}"),
//!         Record::Error { id, message, .. } => println!("#{id} !! {message}"),
//!     }
//! }
//! # };
//! ```

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver, UnboundedSender};

use crate::clients::http_request::RequestInfo;

/// One observed event on the wire.
///
/// `id` correlates a request with its response or error; retries of the
/// same logical request share the id and differ in `attempt`.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// A request is about to be dispatched.
    Request {
        /// Logical request id.
        id: u64,
        /// One-based attempt number.
        attempt: u32,
        /// Method and URL.
        request: RequestInfo,
        /// JSON body, if any.
        body: Option<serde_json::Value>,
        /// When the request was dispatched.
        at: DateTime<Utc>,
    },
    /// A response was received.
    Response {
        /// Logical request id.
        id: u64,
        /// One-based attempt number.
        attempt: u32,
        /// Method and URL of the request.
        request: RequestInfo,
        /// Status code.
        code: u16,
        /// Raw body.
        body: String,
        /// When the response was received.
        at: DateTime<Utc>,
    },
    /// The request failed before any response.
    Error {
        /// Logical request id.
        id: u64,
        /// One-based attempt number.
        attempt: u32,
        /// Method and URL of the request.
        request: RequestInfo,
        /// Error description.
        message: String,
        /// When the failure was observed.
        at: DateTime<Utc>,
    },
}

impl Record {
    /// Returns the logical request id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Request { id, .. } | Self::Response { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

/// Non-blocking sink for [`Record`]s.
#[derive(Clone, Debug)]
pub struct RequestResponseRecorder {
    sender: RecordSender,
}

#[derive(Clone, Debug)]
enum RecordSender {
    Unbounded(UnboundedSender<Record>),
    Bounded(Sender<Record>),
}

impl RequestResponseRecorder {
    /// Creates a recorder and the receiver that consumes its records.
    ///
    /// The channel is unbounded: records, including request and response
    /// bodies, stay queued until received. Keep draining the receiver or
    /// drop it.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<Record>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sender = RecordSender::Unbounded(sender);
        (Self { sender }, receiver)
    }

    /// Creates a recorder whose buffer holds at most `capacity` records.
    ///
    /// Records arriving while the buffer is full are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<Record>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let sender = RecordSender::Bounded(sender);
        (Self { sender }, receiver)
    }

    /// Forwards a record. A dropped receiver or a full buffer discards it.
    pub fn record(&self, record: Record) {
        match &self.sender {
            RecordSender::Unbounded(sender) => {
                if sender.send(record).is_err() {
                    tracing::trace!("Request recorder receiver dropped, discarding record");
                }
            }
            RecordSender::Bounded(sender) => match sender.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(record)) => {
                    tracing::debug!(
                        "Request recorder buffer full, dropping record #{}",
                        record.id()
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!("Request recorder receiver dropped, discarding record");
                }
            },
        }
    }
}
