//! Bounded polling of asynchronous backend jobs.
//!
//! Several backend operations (twin-graph materialization, long-running
//! resource transitions) only expose a status endpoint that moves from a
//! pending state to a terminal one. [`poll`] turns that into a blocking call
//! with a wall-clock bound: fetch, sleep, retry, until the first terminal
//! result or the timeout.

use crate::error;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One observation of an asynchronous job's status.
///
/// This is an abstraction over heterogeneous status payloads: plain
/// `PENDING`/`SUCCESS` strings, job conditions, log-text markers. `raw`
/// carries whatever the backend actually said, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    /// Will this status ever change with further polling?
    pub terminal: bool,
    /// Did the job succeed (meaningful only when terminal)?
    pub succeeded: bool,
    /// The backend's own words
    pub raw: String,
}

impl PollResult {
    pub fn pending(raw: impl Into<String>) -> Self {
        Self {
            terminal: false,
            succeeded: false,
            raw: raw.into(),
        }
    }

    pub fn success(raw: impl Into<String>) -> Self {
        Self {
            terminal: true,
            succeeded: true,
            raw: raw.into(),
        }
    }

    pub fn failure(raw: impl Into<String>) -> Self {
        Self {
            terminal: true,
            succeeded: false,
            raw: raw.into(),
        }
    }

    /// Classify a plain-text status body.
    ///
    /// The upstream services expose no structured status machine, so this is
    /// a documented heuristic over the literal markers they emit:
    /// `PENDING` is the only non-terminal state, `SUCCESS` the only
    /// successful one; anything else is a terminal failure.
    pub fn from_status_text(text: &str) -> Self {
        let status = text.trim();
        if status.eq_ignore_ascii_case("PENDING") {
            Self::pending(status)
        } else if status.eq_ignore_ascii_case("SUCCESS") {
            Self::success(status)
        } else {
            Self::failure(status)
        }
    }
}

/// Why a poll did not end in success.
#[derive(Debug, Error)]
pub enum PollError {
    /// The job reached a terminal state other than success
    #[error("completed with failure status: {raw}")]
    Failed { raw: String },

    /// The wall-clock bound elapsed while the job was still pending.
    /// The job itself may still be running out-of-band.
    #[error("timed out after {}s waiting for completion", .waited.as_secs())]
    TimedOut { waited: Duration },

    /// Fetching the status itself failed
    #[error(transparent)]
    Api(#[from] error::Error),
}

/// Poll `fetch` until it returns a terminal result or `timeout` elapses.
///
/// `fetch` is called immediately, then once per `interval`. The first
/// terminal result wins: success is returned, failure becomes
/// [`PollError::Failed`]. When the elapsed time reaches `timeout` with the
/// job still pending, [`PollError::TimedOut`] is returned and the operation
/// is abandoned.
pub fn poll<F>(
    mut fetch: F,
    interval: Duration,
    timeout: Duration,
) -> std::result::Result<PollResult, PollError>
where
    F: FnMut() -> error::Result<PollResult>,
{
    let started = Instant::now();

    loop {
        let result = fetch()?;

        if result.terminal {
            if result.succeeded {
                return Ok(result);
            }
            return Err(PollError::Failed { raw: result.raw });
        }

        if started.elapsed() >= timeout {
            return Err(PollError::TimedOut {
                waited: started.elapsed(),
            });
        }

        thread::sleep(interval);
    }
}
