// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::new_without_default)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod headers;
pub mod http;
pub mod input;
pub mod persist;
pub mod record;
pub mod report;
pub mod retry;
pub mod similarity;
pub mod stats;
pub mod store;
pub mod transport;


pub use diff::{diff, DiffRecord};
pub use error::{ProbeError, ProbeResult, TransportError};
pub use fingerprint::{signature, FingerprintConfig, Signature};
pub use http::Dispatcher;
pub use record::{HeaderEntry, ResponseRecord};
pub use similarity::common_headers;
pub use store::{ResultMap, ResultStore};
