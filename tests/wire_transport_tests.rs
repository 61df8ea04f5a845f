// File: wire_transport_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::*;
use rshape::config::TransportKind;
use rshape::fingerprint::FingerprintConfig;
use rshape::http::Dispatcher;
use rshape::record::ResponseRecord;
use rshape::store::ResultMap;
use rshape::transport::HttpTransport;
use serial_test::serial;
use std::time::Duration;

const MIXED_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Server: test\r\n\
x-MiXeD-case: 1\r\n\
Set-Cookie: a=1\r\n\
Date: Mon, 01 Jan 2024 00:00:00 GMT\r\n\
Set-Cookie: b=2\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\
\r\n";

fn entries(record: &ResponseRecord) -> Vec<(String, String)> {
    record
        .header_entries()
        .iter()
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn fetch_one(
    server: &RawServer,
    kind: TransportKind,
    max_retry: u32,
    timeout: u64,
) -> (Dispatcher<HttpTransport>, ResultMap) {
    let mut cfg = config(1);
    cfg.set_transport(kind);
    cfg.set_timeout(timeout);
    cfg.set_host("vhost.example");
    let dispatcher = Dispatcher::from_config(cfg, FingerprintConfig::new(true, true))
        .unwrap()
        .with_retry_policy(no_backoff(max_retry));
    let results = dispatcher
        .run(vec![format!("{}/index", server.base_url)])
        .await
        .unwrap();
    (dispatcher, results)
}

#[tokio::test]
#[serial]
async fn test_wire_keeps_case_order_and_duplicates() {
    let server = RawServer::start(MIXED_RESPONSE, Duration::ZERO).await;
    let (_, results) = fetch_one(&server, TransportKind::Wire, 0, 5).await;

    let record = results.values().flatten().next().unwrap();
    assert_eq!(record.status(), "200 OK");
    assert_eq!(
        entries(record),
        pairs(&[
            ("Server", "test"),
            ("x-MiXeD-case", "1"),
            ("Set-Cookie", "a=1"),
            ("Date", "Mon, 01 Jan 2024 00:00:00 GMT"),
            ("Set-Cookie", "b=2"),
            ("Content-Length", "0"),
            ("Connection", "close"),
        ])
    );
}

#[tokio::test]
#[serial]
async fn test_wire_request_carries_host_override() {
    let server = RawServer::start(MIXED_RESPONSE, Duration::ZERO).await;
    fetch_one(&server, TransportKind::Wire, 0, 5).await;

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /index HTTP/1.1\r\n"));
    assert!(requests[0].contains("\r\nHost: vhost.example\r\n"));
}

#[tokio::test]
#[serial]
async fn test_client_transport_uses_canonical_names() {
    let server = RawServer::start(MIXED_RESPONSE, Duration::ZERO).await;
    let (_, results) = fetch_one(&server, TransportKind::Client, 0, 5).await;

    let record = results.values().flatten().next().unwrap();
    let names: Vec<String> = entries(record).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        &names[..6],
        &[
            "Server",
            "X-Mixed-Case",
            "Set-Cookie",
            "Set-Cookie",
            "Date",
            "Content-Length"
        ]
    );
    assert_eq!(record.header("set-cookie").map(|h| h.value.as_str()), Some("a=1"));
}

#[tokio::test]
#[serial]
async fn test_wire_timeout_is_retried() {
    let server = RawServer::start(MIXED_RESPONSE, Duration::from_secs(3)).await;
    let (dispatcher, results) = fetch_one(&server, TransportKind::Wire, 1, 1).await;

    assert!(results.is_empty());
    assert_eq!(server.connection_count(), 2);
    assert_eq!(dispatcher.stats().failed_requests(), 1);
    assert_eq!(dispatcher.stats().retried_requests(), 1);
}

#[tokio::test]
#[serial]
async fn test_default_config_keeps_wire_shape() {
    let server = RawServer::start(MIXED_RESPONSE, Duration::ZERO).await;
    let fingerprint = FingerprintConfig::new(true, true);
    let dispatcher = Dispatcher::from_config(config(1), fingerprint).unwrap();
    let defaults = dispatcher
        .run(vec![format!("{}/index", server.base_url)])
        .await
        .unwrap();
    let (_, wire) = fetch_one(&server, TransportKind::Wire, 0, 5).await;

    let record = defaults.values().flatten().next().unwrap();
    let names: Vec<String> = entries(record).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        &names[..5],
        &["Server", "x-MiXeD-case", "Set-Cookie", "Date", "Set-Cookie"]
    );
    assert_eq!(
        defaults.keys().collect::<Vec<_>>(),
        wire.keys().collect::<Vec<_>>()
    );
}

#[tokio::test]
#[serial]
async fn test_client_keeps_server_reason_phrase() {
    let server = RawServer::start(
        "HTTP/1.1 200 Fine Thanks\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        Duration::ZERO,
    )
    .await;

    let (_, client) = fetch_one(&server, TransportKind::Client, 0, 5).await;
    let (_, wire) = fetch_one(&server, TransportKind::Wire, 0, 5).await;

    let client_record = client.values().flatten().next().unwrap();
    let wire_record = wire.values().flatten().next().unwrap();
    assert_eq!(client_record.status(), "200 Fine Thanks");
    assert_eq!(wire_record.status(), "200 Fine Thanks");
}
