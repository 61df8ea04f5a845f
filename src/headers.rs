// File: headers.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use reqwest::header::{HeaderMap, HeaderName};
use std::collections::HashMap;
use thiserror::Error;

use crate::record::HeaderEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("empty response head")]
    EmptyHead,

    #[error("malformed header line: {0:?}")]
    MalformedLine(String),

    #[error("header {name} occurs more often in the raw head than in the parsed table ({occurrence})")]
    MissingValue { name: String, occurrence: usize },
}

/// Rebuilds the ordered header list of a response.
///
/// `raw_head` is the wire-format response head (status line optional, lines
/// separated by `\n` or `\r\n`, terminated by the end of input or an empty
/// line). Names are taken verbatim from `raw_head`. Values come from `parsed`:
/// the i-th line carrying a given name (compared case-insensitively) gets the
/// i-th value stored for that name, so repeated headers keep their own values.
///
/// Names present in the raw head but unknown to `parsed` are skipped.
pub fn extract_headers(raw_head: &str, parsed: &HeaderMap) -> Result<Vec<HeaderEntry>, ExtractError> {
    if raw_head.trim().is_empty() {
        return Err(ExtractError::EmptyHead);
    }

    let mut entries = Vec::with_capacity(parsed.len());
    let mut occurrences: HashMap<HeaderName, usize> = HashMap::new();

    let mut lines = raw_head.split('\n').map(|l| l.trim_end_matches('\r')).peekable();
    if lines.peek().is_some_and(|l| l.starts_with("HTTP/")) {
        lines.next();
    }

    for line in lines {
        if line.is_empty() {
            break;
        }
        // obsolete line folding, the parsed table already holds the joined value
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }

        let (field, _) = line
            .split_once(':')
            .ok_or_else(|| ExtractError::MalformedLine(line.to_string()))?;
        let field = field.trim();
        let name = HeaderName::from_bytes(field.as_bytes())
            .map_err(|_| ExtractError::MalformedLine(line.to_string()))?;

        if !parsed.contains_key(&name) {
            continue;
        }

        let idx = occurrences.entry(name.clone()).or_insert(0);
        let value = parsed
            .get_all(&name)
            .iter()
            .nth(*idx)
            .ok_or_else(|| ExtractError::MissingValue {
                name: field.to_string(),
                occurrence: *idx + 1,
            })?;
        *idx += 1;

        entries.push(HeaderEntry::new(
            field,
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        ));
    }

    Ok(entries)
}

/// Canonical MIME form of a header name, e.g. `x-cache-hits` -> `X-Cache-Hits`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Renders a header table as a wire-format head with canonical names, in the
/// table's iteration order.
pub fn render_head(status_line: &str, headers: &HeaderMap) -> String {
    let mut head = String::with_capacity(64 + headers.len() * 32);
    head.push_str(status_line);
    head.push_str("\r\n");
    for (name, value) in headers {
        head.push_str(&canonical_name(name.as_str()));
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head
}
