// File: store.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ProbeError, ProbeResult};
use crate::fingerprint::Signature;
use crate::record::ResponseRecord;

/// Signature -> records sharing it. Iterates in ascending signature order.
pub type ResultMap = BTreeMap<Signature, Vec<ResponseRecord>>;

const COLLECTOR_BUFFER: usize = 256;

/// Buckets of one run. Only ever mutated by a single owner.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultStore {
    buckets: ResultMap,
    records: usize,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, signature: Signature, record: ResponseRecord) {
        debug!("{} {}", signature, record.url());
        self.buckets.entry(signature).or_default().push(record);
        self.records += 1;
    }

    pub fn snapshot(&self) -> &ResultMap {
        &self.buckets
    }

    pub fn into_map(self) -> ResultMap {
        self.buckets
    }

    /// Number of records over all buckets.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl From<ResultMap> for ResultStore {
    fn from(buckets: ResultMap) -> Self {
        let records = buckets.values().map(Vec::len).sum();
        Self { buckets, records }
    }
}

/// Write side of a store owned by a collector task.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<(Signature, ResponseRecord)>,
}

impl StoreHandle {
    pub async fn append(&self, signature: Signature, record: ResponseRecord) -> ProbeResult<()> {
        self.tx
            .send((signature, record))
            .await
            .map_err(|_| ProbeError::Worker("result collector stopped".to_string()))
    }
}

/// Starts the task that owns the store. It finishes, returning the store,
/// once every `StoreHandle` clone has been dropped.
pub fn spawn_collector() -> (StoreHandle, JoinHandle<ResultStore>) {
    let (tx, mut rx) = mpsc::channel::<(Signature, ResponseRecord)>(COLLECTOR_BUFFER);
    let collector = tokio::spawn(async move {
        let mut store = ResultStore::new();
        while let Some((signature, record)) = rx.recv().await {
            store.append(signature, record);
        }
        store
    });
    (StoreHandle { tx }, collector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> ResponseRecord {
        ResponseRecord::new(url, vec![], 200, "200 OK")
    }

    #[test]
    fn test_append_creates_and_extends_buckets() {
        let mut store = ResultStore::new();
        store.append("1".to_string(), record("http://a"));
        store.append("2".to_string(), record("http://b"));
        store.append("1".to_string(), record("http://c"));

        assert_eq!(store.len(), 3);
        assert_eq!(store.bucket_count(), 2);
        let urls: Vec<&str> = store.snapshot()["1"].iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["http://a", "http://c"]);
    }

    #[test]
    fn test_from_map_counts_records() {
        let mut map = ResultMap::new();
        map.insert("9".to_string(), vec![record("http://a"), record("http://b")]);
        let store = ResultStore::from(map);
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_collector_keeps_every_concurrent_append() {
        let (handle, collector) = spawn_collector();

        let mut writers = Vec::new();
        for w in 0..8 {
            let handle = handle.clone();
            writers.push(tokio::spawn(async move {
                for i in 0..50 {
                    let sig = format!("{}", i % 3);
                    handle
                        .append(sig, record(&format!("http://w{}/{}", w, i)))
                        .await
                        .unwrap();
                }
            }));
        }
        drop(handle);
        for writer in writers {
            writer.await.unwrap();
        }

        let store = collector.await.unwrap();
        assert_eq!(store.len(), 400);
        assert_eq!(store.bucket_count(), 3);
    }
}
