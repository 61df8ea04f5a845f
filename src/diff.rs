// File: diff.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use serde::{Deserialize, Serialize};

use crate::fingerprint::{signature, FingerprintConfig};
use crate::record::ResponseRecord;
use crate::store::ResultMap;

/// A URL whose signature changed since the previous run, or that the
/// previous run did not contain (`old_response == None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    #[serde(rename = "OldResponse")]
    pub old_response: Option<ResponseRecord>,
    #[serde(rename = "NewResponse")]
    pub new_response: ResponseRecord,
}

impl DiffRecord {
    pub fn is_new(&self) -> bool {
        self.old_response.is_none()
    }
}

/// First record of `previous` with the given URL, walking buckets in
/// ascending signature order and each bucket in stored order.
pub fn find_previous<'a>(previous: &'a ResultMap, url: &str) -> Option<&'a ResponseRecord> {
    previous
        .values()
        .flat_map(|bucket| bucket.iter())
        .find(|record| record.url() == url)
}

/// Compares the current run against a previous one.
///
/// The old record's signature is recomputed with `config` instead of trusting
/// the signature it was stored under.
pub fn diff(current: &ResultMap, previous: &ResultMap, config: &FingerprintConfig) -> Vec<DiffRecord> {
    let mut changes = Vec::new();

    for (current_signature, bucket) in current {
        for record in bucket {
            match find_previous(previous, record.url()) {
                Some(old) => {
                    let old_signature = signature(old, config);
                    if &old_signature != current_signature {
                        debug!(
                            "{} changed signature {} -> {}",
                            record.url(),
                            old_signature,
                            current_signature
                        );
                        changes.push(DiffRecord {
                            old_response: Some(old.clone()),
                            new_response: record.clone(),
                        });
                    }
                }
                None => {
                    debug!("{} is new", record.url());
                    changes.push(DiffRecord {
                        old_response: None,
                        new_response: record.clone(),
                    });
                }
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HeaderEntry;

    fn record(url: &str, server: &str) -> ResponseRecord {
        ResponseRecord::new(url, vec![HeaderEntry::new("Server", server)], 200, "200 OK")
    }

    fn run(records: Vec<ResponseRecord>, config: &FingerprintConfig) -> ResultMap {
        let mut map = ResultMap::new();
        for r in records {
            map.entry(signature(&r, config)).or_default().push(r);
        }
        map
    }

    #[test]
    fn test_changed_server_header() {
        let config = FingerprintConfig::new(false, true);
        let previous: ResultMap = serde_json::from_str(
            r#"{"sigA": [{"Url":"http://a","HeaderEntries":[{"Key":"Server","Value":"nginx"}],"StatusCode":200,"Status":"200 OK"}]}"#,
        )
        .unwrap();
        let current = run(vec![record("http://a", "apache")], &config);

        let changes = diff(&current, &previous, &config);

        assert_eq!(changes.len(), 1);
        let old = changes[0].old_response.as_ref().unwrap();
        assert_eq!(old.header_entries()[0].value, "nginx");
        assert_eq!(changes[0].new_response.header_entries()[0].value, "apache");
    }

    #[test]
    fn test_server_value_ignored_when_not_in_signature() {
        let config = FingerprintConfig::new(false, false);
        let previous = run(vec![record("http://a", "nginx")], &config);
        let current = run(vec![record("http://a", "apache")], &config);
        assert!(diff(&current, &previous, &config).is_empty());
    }

    #[test]
    fn test_new_url() {
        let config = FingerprintConfig::default();
        let previous = run(vec![record("http://a", "nginx")], &config);
        let current = run(
            vec![record("http://a", "nginx"), record("http://b", "nginx")],
            &config,
        );

        let changes = diff(&current, &previous, &config);

        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_new());
        assert_eq!(changes[0].new_response.url(), "http://b");
    }

    #[test]
    fn test_stored_signature_is_not_trusted() {
        let config = FingerprintConfig::new(true, true);
        let mut previous = ResultMap::new();
        previous.insert("stale".to_string(), vec![record("http://a", "nginx")]);
        let current = run(vec![record("http://a", "nginx")], &config);

        assert!(diff(&current, &previous, &config).is_empty());
    }

    #[test]
    fn test_urls_missing_from_current_run_are_not_reported() {
        let config = FingerprintConfig::default();
        let previous = run(vec![record("http://gone", "nginx")], &config);
        assert!(diff(&ResultMap::new(), &previous, &config).is_empty());
    }

    #[test]
    fn test_first_match_in_signature_order_wins() {
        let config = FingerprintConfig::new(false, true);
        let mut previous = ResultMap::new();
        previous.insert("2".to_string(), vec![record("http://a", "apache")]);
        previous.insert("1".to_string(), vec![record("http://a", "nginx")]);

        let found = find_previous(&previous, "http://a").unwrap();
        assert_eq!(found.header_entries()[0].value, "nginx");

        let current = run(vec![record("http://a", "apache")], &config);
        let changes = diff(&current, &previous, &config);
        assert_eq!(changes.len(), 1);
    }
}
