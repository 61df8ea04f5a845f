// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use rshape::config::ProbeConfig;
use rshape::retry::RetryPolicy;
use rshape::store::ResultMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_mock_response(status: u16, headers: &[(&str, &str)]) -> ResponseTemplate {
    let mut response = ResponseTemplate::new(status).set_body_string("body");
    for (key, value) in headers {
        response = response.append_header(*key, *value);
    }
    response
}

pub async fn mount_get(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn urls(server: &MockServer, paths: &[&str]) -> Vec<String> {
    paths
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect()
}

pub fn config(workers: usize) -> ProbeConfig {
    let mut config = ProbeConfig::new();
    config.set_workers(workers);
    config.set_timeout(5);
    config
}

/// Same state machine, no waiting between attempts.
pub fn no_backoff(max_retry: u32) -> RetryPolicy {
    RetryPolicy::with_backoff(max_retry, Arc::new(|_| Duration::ZERO))
}

pub fn record_count(results: &ResultMap) -> usize {
    results.values().map(Vec::len).sum()
}

pub fn all_urls(results: &ResultMap) -> Vec<String> {
    let mut urls: Vec<String> = results
        .values()
        .flatten()
        .map(|r| r.url().to_string())
        .collect();
    urls.sort();
    urls
}

/// Minimal HTTP/1.1 server writing `response` verbatim on every connection.
pub struct RawServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
    pub connections: Arc<AtomicUsize>,
}

impl RawServer {
    pub async fn start(response: &'static str, delay: Duration) -> RawServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&requests);
        let counter = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 4096];
                    loop {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&chunk[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    seen.lock()
                        .unwrap()
                        .push(String::from_utf8_lossy(&request).into_owned());
                    tokio::time::sleep(delay).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        RawServer {
            base_url: format!("http://{}", addr),
            requests,
            connections,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
