// File: error.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures. Any of these stops the whole probe run.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("failed to extract headers from response of {url}: {reason}")]
    HeaderExtraction { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for ProbeError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Worker(error.to_string())
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Failure of a single request attempt, as seen by the retry state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}
