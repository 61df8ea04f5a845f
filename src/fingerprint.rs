// File: fingerprint.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Deserialize, Serialize};

use crate::record::ResponseRecord;

pub type Signature = String;

const SEPARATOR: char = ';';
const NO_SERVER_HEADER: &str = "(none)";

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// Selects which response features, besides the ordered header names, feed
/// the signature. Two runs that are diffed must use the same configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    pub include_status_code: bool,
    pub include_server_header: bool,
}

impl FingerprintConfig {
    pub fn new(include_status_code: bool, include_server_header: bool) -> Self {
        Self {
            include_status_code,
            include_server_header,
        }
    }
}

pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// The string that gets hashed: `[status][;server];name;name;...`
pub fn composition(record: &ResponseRecord, config: &FingerprintConfig) -> String {
    let mut raw = String::new();

    if config.include_status_code {
        raw.push_str(&record.status_code().to_string());
    }

    if config.include_server_header {
        raw.push(SEPARATOR);
        match record.header("server") {
            Some(server) => raw.push_str(&server.value),
            None => raw.push_str(NO_SERVER_HEADER),
        }
    }

    for name in record.header_names() {
        raw.push(SEPARATOR);
        raw.push_str(name);
    }

    raw
}

/// Signature of a response: FNV-1a of the composition string, as decimal.
pub fn signature(record: &ResponseRecord, config: &FingerprintConfig) -> Signature {
    fnv1a_32(composition(record, config).as_bytes()).to_string()
}
