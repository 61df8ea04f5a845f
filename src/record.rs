// File: record.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Deserialize, Deserializer, Serialize};

/// One header line as it was received. `key` keeps the capitalization of the
/// wire (or of the transport, see `transport`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderEntry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A successful response reduced to what the fingerprint and the persisted
/// result file need. Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "Url")]
    url: String,
    #[serde(rename = "HeaderEntries", default, deserialize_with = "null_as_empty")]
    header_entries: Vec<HeaderEntry>,
    #[serde(rename = "StatusCode")]
    status_code: u16,
    #[serde(rename = "Status", default)]
    status: String,
}

impl ResponseRecord {
    pub fn new(
        url: impl Into<String>,
        header_entries: Vec<HeaderEntry>,
        status_code: u16,
        status: impl Into<String>,
    ) -> Self {
        ResponseRecord {
            url: url.into(),
            header_entries,
            status_code,
            status: status.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn header_entries(&self) -> &[HeaderEntry] {
        &self.header_entries
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// First header whose name matches `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&HeaderEntry> {
        self.header_entries
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
    }

    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.header_entries.iter().map(|h| h.key.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<HeaderEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<HeaderEntry>>::deserialize(deserializer)?.unwrap_or_default())
}
