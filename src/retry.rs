// File: retry.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::info;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ProbeError, TransportError};
use crate::transport::{RawResponse, Transport};

const TOO_MANY_REQUESTS: u16 = 429;

/// Maps the index of the attempt that just failed to the pause before the
/// next one.
pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// `attempt + 1` seconds.
pub fn linear_backoff() -> Backoff {
    Arc::new(|attempt| Duration::from_secs(u64::from(attempt) + 1))
}

#[derive(Clone)]
pub struct RetryPolicy {
    max_retry: u32,
    backoff: Backoff,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retry", &self.max_retry)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn new(max_retry: u32) -> Self {
        Self::with_backoff(max_retry, linear_backoff())
    }

    pub fn with_backoff(max_retry: u32, backoff: Backoff) -> Self {
        Self { max_retry, backoff }
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    Timeout,
    RateLimited,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::RateLimited => write!(f, "rate limited (HTTP 429)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Error that waiting will not fix.
    Error(String),
    /// Still timing out or rate limited after `max_retry` retries.
    Exhausted { last: RetryReason, max_retry: u32 },
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "{}", message),
            Self::Exhausted { last, max_retry } => {
                write!(f, "{} after {} retries", last, max_retry)
            }
        }
    }
}

/// Per-URL request states.
#[derive(Debug)]
pub enum RequestState {
    Attempting { attempt: u32 },
    Retrying { attempt: u32, reason: RetryReason, wait: Duration },
    Success { attempts: u32, response: RawResponse },
    Failed { attempts: u32, reason: FailReason },
}

/// Terminal state of one URL.
#[derive(Debug)]
pub enum Outcome {
    Success { attempts: u32, response: RawResponse },
    Failed { attempts: u32, reason: FailReason },
}

/// What a single attempt produced.
#[derive(Debug)]
pub enum AttemptEvent {
    Response(RawResponse),
    Error(TransportError),
}

impl RetryPolicy {
    /// Transition out of `Attempting { attempt }`. `Err` means the request
    /// itself can never be built and the run has to stop.
    pub fn on_attempt(
        &self,
        url: &str,
        attempt: u32,
        event: AttemptEvent,
    ) -> Result<RequestState, ProbeError> {
        let retryable = match event {
            AttemptEvent::Response(response) if response.status_code == TOO_MANY_REQUESTS => {
                RetryReason::RateLimited
            }
            AttemptEvent::Response(response) => {
                return Ok(RequestState::Success {
                    attempts: attempt + 1,
                    response,
                })
            }
            AttemptEvent::Error(TransportError::Timeout) => RetryReason::Timeout,
            AttemptEvent::Error(TransportError::InvalidRequest(reason)) => {
                return Err(ProbeError::InvalidRequest {
                    url: url.to_string(),
                    reason,
                })
            }
            AttemptEvent::Error(TransportError::Other(message)) => {
                return Ok(RequestState::Failed {
                    attempts: attempt + 1,
                    reason: FailReason::Error(message),
                })
            }
        };

        if attempt < self.max_retry {
            Ok(RequestState::Retrying {
                attempt,
                wait: self.backoff(attempt),
                reason: retryable,
            })
        } else {
            Ok(RequestState::Failed {
                attempts: attempt + 1,
                reason: FailReason::Exhausted {
                    last: retryable,
                    max_retry: self.max_retry,
                },
            })
        }
    }

    /// Drives one URL to `Success` or `Failed`.
    pub async fn run<T: Transport>(
        &self,
        transport: &T,
        url: &str,
    ) -> Result<Outcome, ProbeError> {
        let mut state = RequestState::Attempting { attempt: 0 };
        loop {
            state = match state {
                RequestState::Attempting { attempt } => {
                    let event = match transport.execute(url).await {
                        Ok(response) => AttemptEvent::Response(response),
                        Err(error) => AttemptEvent::Error(error),
                    };
                    self.on_attempt(url, attempt, event)?
                }
                RequestState::Retrying {
                    attempt,
                    reason,
                    wait,
                } => {
                    info!(
                        "{} ({}), retry {}/{} in {:?}",
                        url,
                        reason,
                        attempt + 1,
                        self.max_retry,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    RequestState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RequestState::Success { attempts, response } => {
                    return Ok(Outcome::Success { attempts, response })
                }
                RequestState::Failed { attempts, reason } => {
                    return Ok(Outcome::Failed { attempts, reason })
                }
            };
        }
    }
}
