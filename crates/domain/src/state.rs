//! Per-send execution state.
//!
//! `Idle → Sending → {Success, Failure} → Idle`. The pipeline itself is
//! stateless; callers that own an editing session track one of these to
//! keep a single send in flight.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::response::ResponseRecord;

/// Where a request-editing session is in its send cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SendState {
    /// Nothing in flight.
    #[default]
    Idle,

    /// A send is in flight.
    Sending {
        /// When the send started.
        #[serde(skip)]
        started_at: Option<Instant>,
    },

    /// The server answered (any HTTP status).
    Success {
        /// The normalized response.
        response: Box<ResponseRecord>,
    },

    /// No HTTP response was received.
    Failure {
        /// The `status = 0` record.
        response: Box<ResponseRecord>,
    },
}

impl SendState {
    /// Enters `Sending`. Refused while a send is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_sending() {
            return false;
        }
        *self = Self::Sending {
            started_at: Some(Instant::now()),
        };
        true
    }

    /// Records the outcome of the in-flight send.
    ///
    /// Network-error records land in `Failure`, everything else in
    /// `Success`. Ignored unless a send is in flight.
    pub fn complete(&mut self, response: ResponseRecord) -> bool {
        if !self.is_sending() {
            return false;
        }
        let response = Box::new(response);
        *self = if response.is_network_error() {
            Self::Failure { response }
        } else {
            Self::Success { response }
        };
        true
    }

    /// Drops the in-flight send without delivering a response.
    pub fn cancel(&mut self) -> bool {
        if !self.is_sending() {
            return false;
        }
        *self = Self::Idle;
        true
    }

    /// Returns to `Idle` from any state.
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    /// Returns true if the state is Idle.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a send is in flight.
    #[must_use]
    pub const fn is_sending(&self) -> bool {
        matches!(self, Self::Sending { .. })
    }

    /// Returns the delivered response, successful or not.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseRecord> {
        match self {
            Self::Success { response } | Self::Failure { response } => Some(response),
            _ => None,
        }
    }

    /// Returns the elapsed time while sending.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Sending {
                started_at: Some(t),
            } => Some(t.elapsed()),
            _ => None,
        }
    }
}
