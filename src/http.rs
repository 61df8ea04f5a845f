// File: http.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use futures::stream::{FuturesUnordered, StreamExt};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use log::{debug, info, warn};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};

use crate::config::{DispatchStrategy, ProbeConfig};
use crate::error::{ProbeError, ProbeResult, TransportError};
use crate::fingerprint::{signature, FingerprintConfig};
use crate::headers::extract_headers;
use crate::record::ResponseRecord;
use crate::retry::{Outcome, RetryPolicy};
use crate::stats::ProbeStats;
use crate::store::{spawn_collector, ResultMap, StoreHandle};
use crate::transport::{HttpTransport, RawResponse, Transport};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Splits `urls` into at most `workers` contiguous chunks of
/// `ceil(len / workers)` URLs each.
pub fn partition(urls: &[String], workers: usize) -> Vec<Vec<String>> {
    if urls.is_empty() {
        return Vec::new();
    }
    let chunk_size = urls.len().div_ceil(workers.max(1));
    urls.chunks(chunk_size).map(<[String]>::to_vec).collect()
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(
            style
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                })
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
    }
    pb
}

/// Waits for the shared rate limiter before every attempt, retries included.
struct Throttled<T: Transport> {
    inner: Arc<T>,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl<T: Transport> Transport for Throttled<T> {
    async fn execute(&self, url: &str) -> Result<RawResponse, TransportError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.inner.execute(url).await
    }
}

/// Everything a worker task needs; cheap to clone.
struct Worker<T: Transport> {
    id: usize,
    transport: Arc<Throttled<T>>,
    policy: RetryPolicy,
    fingerprint: FingerprintConfig,
    stats: Arc<ProbeStats>,
    delay: Duration,
    store: StoreHandle,
    progress: ProgressBar,
}

impl<T: Transport> Worker<T> {
    async fn probe(&self, url: &str) -> ProbeResult<()> {
        let outcome = self.policy.run(self.transport.as_ref(), url).await;
        self.progress.inc(1);

        match outcome? {
            Outcome::Success { attempts, response } => {
                if attempts > 1 {
                    self.stats.add_retried();
                }
                let entries = extract_headers(&response.raw_head, &response.headers).map_err(
                    |e| ProbeError::HeaderExtraction {
                        url: url.to_string(),
                        reason: e.to_string(),
                    },
                )?;
                let record =
                    ResponseRecord::new(url, entries, response.status_code, response.status);
                let sig = signature(&record, &self.fingerprint);
                self.store.append(sig, record).await?;
                self.stats.add_success();
            }
            Outcome::Failed { attempts, reason } => {
                if attempts > 1 {
                    self.stats.add_retried();
                }
                warn!("{}: {} (attempts: {}), skipping", url, reason, attempts);
                self.stats.add_failure();
            }
        }
        Ok(())
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn run_chunk(self, urls: Vec<String>) -> ProbeResult<()> {
        debug!("worker {} starts with {} urls", self.id, urls.len());
        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            self.probe(url).await?;
        }
        debug!("worker {} finished", self.id);
        Ok(())
    }

    async fn run_queue(self, queue: Arc<Mutex<mpsc::Receiver<String>>>) -> ProbeResult<()> {
        debug!("worker {} starts", self.id);
        let mut first = true;
        loop {
            let next = queue.lock().await.recv().await;
            let Some(url) = next else { break };
            if !first {
                self.pause().await;
            }
            first = false;
            self.probe(&url).await?;
        }
        debug!("worker {} finished", self.id);
        Ok(())
    }
}

/// Sends one request per URL over a fixed pool of workers and groups the
/// successful responses by signature.
pub struct Dispatcher<T: Transport> {
    transport: Arc<T>,
    config: ProbeConfig,
    fingerprint: FingerprintConfig,
    policy: RetryPolicy,
    stats: Arc<ProbeStats>,
    rate_limiter: Option<Arc<DirectRateLimiter>>,
}

impl Dispatcher<HttpTransport> {
    pub fn from_config(config: ProbeConfig, fingerprint: FingerprintConfig) -> ProbeResult<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::new(transport, config, fingerprint))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: ProbeConfig, fingerprint: FingerprintConfig) -> Self {
        let policy = RetryPolicy::new(config.max_retry());
        let rate_limiter = config
            .rate_limit()
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        Self {
            transport: Arc::new(transport),
            config,
            fingerprint,
            policy,
            stats: Arc::new(ProbeStats::new()),
            rate_limiter,
        }
    }

    /// Replaces the default linear backoff policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stats(&self) -> Arc<ProbeStats> {
        Arc::clone(&self.stats)
    }

    pub fn fingerprint(&self) -> &FingerprintConfig {
        &self.fingerprint
    }

    fn worker(
        &self,
        id: usize,
        transport: &Arc<Throttled<T>>,
        store: StoreHandle,
        progress: ProgressBar,
    ) -> Worker<T> {
        Worker {
            id,
            transport: Arc::clone(transport),
            policy: self.policy.clone(),
            fingerprint: self.fingerprint,
            stats: Arc::clone(&self.stats),
            delay: Duration::from_millis(self.config.delay_ms()),
            store,
            progress,
        }
    }

    /// Probes every URL once. `urls` must already be free of duplicates.
    ///
    /// Per-URL failures are logged and skipped. A run-level failure (invalid
    /// request, unreadable response head) stops all workers and is returned.
    pub async fn run(&self, urls: Vec<String>) -> ProbeResult<ResultMap> {
        let workers = self.config.workers().max(1);
        info!(
            "Collected {} different urls, starting analysis with {} workers",
            urls.len(),
            workers
        );
        self.stats.start(urls.len());
        let pb = progress_bar(urls.len(), self.config.show_progress());

        let transport = Arc::new(Throttled {
            inner: Arc::clone(&self.transport),
            limiter: self.rate_limiter.clone(),
        });
        let (store, collector) = spawn_collector();
        let mut tasks = FuturesUnordered::new();
        let mut aborts = Vec::new();
        let mut producer: Option<JoinHandle<()>> = None;

        match self.config.strategy() {
            DispatchStrategy::Chunked => {
                for (id, chunk) in partition(&urls, workers).into_iter().enumerate() {
                    let worker = self.worker(id, &transport, store.clone(), pb.clone());
                    let task = tokio::spawn(worker.run_chunk(chunk));
                    aborts.push(task.abort_handle());
                    tasks.push(task);
                }
            }
            DispatchStrategy::Queue => {
                let (tx, rx) = mpsc::channel::<String>(workers * 2);
                producer = Some(tokio::spawn(async move {
                    for url in urls {
                        if tx.send(url).await.is_err() {
                            break;
                        }
                    }
                }));
                let queue = Arc::new(Mutex::new(rx));
                for id in 0..workers {
                    let worker = self.worker(id, &transport, store.clone(), pb.clone());
                    let task = tokio::spawn(worker.run_queue(Arc::clone(&queue)));
                    aborts.push(task.abort_handle());
                    tasks.push(task);
                }
            }
        }
        drop(store);

        let joined = join_workers(&mut tasks, &aborts).await;
        if let Some(producer) = producer {
            producer.abort();
        }
        pb.finish();
        self.stats.finish();

        if let Err(e) = joined {
            collector.abort();
            return Err(e);
        }
        let store = collector.await?;
        info!(
            "{} responses in {} groups, {} urls skipped",
            store.len(),
            store.bucket_count(),
            self.stats.failed_requests()
        );
        Ok(store.into_map())
    }
}

async fn join_workers(
    tasks: &mut FuturesUnordered<JoinHandle<ProbeResult<()>>>,
    aborts: &[AbortHandle],
) -> ProbeResult<()> {
    while let Some(task) = tasks.next().await {
        let failure = match task {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => ProbeError::from(e),
        };
        for abort in aborts {
            abort.abort();
        }
        return Err(failure);
    }
    Ok(())
}
