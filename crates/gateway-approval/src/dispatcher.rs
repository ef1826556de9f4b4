//! Asynchronous request dispatcher.
//!
//! Calls move through three stages: issue (HTTP transport), decode
//! (normalization into an [`ApprovalResult`], see `result.rs`), and
//! complete (a bounded worker queue that invokes the caller's callback).
//! Callback code never runs on the transport task, and exactly one
//! callback fires per call regardless of outcome.

use crate::result::{apply_dry_run, decode_outcome, ApprovalResult, FetchOutcome};
use crate::ApiResult;
use gateway_core::{ApiStats, GatewayConfig};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, warn};

const COMPLETION_QUEUE_CAPACITY: usize = 1024;

const SLOW_CALL_WARN_MS: u64 = 500;
const CALLBACK_DELAY_WARN_MS: u64 = 1000;

/// Completion callback; invoked exactly once per issued call.
pub type Callback = Box<dyn FnOnce(ApprovalResult) + Send + 'static>;

struct Completion {
    result: ApprovalResult,
    callback: Callback,
    enqueued_at: Instant,
}

struct Inner {
    client: reqwest::Client,
    base_url: String,
    token: String,
    fail_open: bool,
    enabled: AtomicBool,
    dry_run: AtomicBool,
    stats: Arc<ApiStats>,
    completions: SyncSender<Completion>,
    queue_depth: Arc<AtomicU64>,
    handle: tokio::runtime::Handle,
}

/// Issues bearer-authenticated calls against the remote authorization
/// service and delivers normalized results through the completion workers.
///
/// Must be constructed from within a tokio runtime; `call` itself may then
/// be invoked from any thread.
pub struct RequestDispatcher {
    inner: Arc<Inner>,
}

impl RequestDispatcher {
    pub fn new(config: &GatewayConfig, stats: Arc<ApiStats>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        let (tx, rx) = std::sync::mpsc::sync_channel::<Completion>(COMPLETION_QUEUE_CAPACITY);
        let rx = Arc::new(Mutex::new(rx));
        let queue_depth = Arc::new(AtomicU64::new(0));

        for n in 0..config.worker_threads.max(1) {
            let rx = Arc::clone(&rx);
            let depth = Arc::clone(&queue_depth);
            std::thread::Builder::new()
                .name(format!("approval-callback-{}", n))
                .spawn(move || worker_loop(rx, depth))?;
        }

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                token: config.bearer_token().to_string(),
                fail_open: config.fail_open,
                enabled: AtomicBool::new(config.is_enabled()),
                dry_run: AtomicBool::new(config.dry_run),
                stats: Arc::clone(&stats),
                completions: tx,
                queue_depth,
                handle: tokio::runtime::Handle::current(),
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_dry_run(&self) -> bool {
        self.inner.dry_run.load(Ordering::Relaxed)
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        self.inner.dry_run.store(dry_run, Ordering::Relaxed);
    }

    pub fn fail_open(&self) -> bool {
        self.inner.fail_open
    }

    /// Issue one call. The callback receives exactly one result, delivered
    /// on a completion worker thread.
    ///
    /// While the gateway is disabled this synthesizes an ALLOW without any
    /// network activity; authentication-critical callers synthesize their
    /// own REJECT via [`RequestDispatcher::dispatch_synthetic`] instead.
    pub fn call(&self, src: &'static str, method: Method, path: String, body: Option<Value>, callback: Callback) {
        if !self.is_enabled() {
            debug!(src, "Gateway disabled, synthesizing ALLOW");
            self.dispatch_synthetic(ApprovalResult::disabled_allow(), callback);
            return;
        }

        let inner = Arc::clone(&self.inner);
        inner.stats.increment_trx();

        let path = if self.is_dry_run() {
            with_dry_run_params(&path)
        } else {
            path
        };
        let url = format!("{}{}", inner.base_url, path);

        let mut result = ApprovalResult::new();
        debug!(src, trx = %result.client_trx_id, path = %path, "API call start");

        let handle = inner.handle.clone();
        handle.spawn(async move {
            let started = Instant::now();
            let outcome = issue(&inner, src, &url, method.clone(), body).await;

            let counted = decode_outcome(outcome, inner.fail_open, &mut result);
            if counted {
                inner.stats.increment_err();
            }

            result.elapsed_ms = started.elapsed().as_millis() as u64;
            inner.stats.record_latency(result.elapsed_ms);

            if result.elapsed_ms > SLOW_CALL_WARN_MS {
                warn!(
                    src,
                    trx = %result.client_trx_id,
                    elapsed_ms = result.elapsed_ms,
                    path = %path,
                    "Slow API call"
                );
            }

            if inner.dry_run.load(Ordering::Relaxed) {
                debug!(
                    trx = %result.client_trx_id,
                    action = result.action.as_str(),
                    "Dry run: original result discarded"
                );
                apply_dry_run(&mut result);
            }

            debug!(
                src,
                trx = %result.client_trx_id,
                method = %method,
                path = %path,
                action = result.action.as_str(),
                elapsed_ms = result.elapsed_ms,
                "API call end"
            );

            enqueue(&inner, result, callback);
        });
    }

    /// Route a locally synthesized result through the completion queue, so
    /// disabled-mode callers still observe the normal delivery path.
    pub fn dispatch_synthetic(&self, result: ApprovalResult, callback: Callback) {
        enqueue(&self.inner, result, callback);
    }
}

/// Append the dry-run observation parameters to a request path.
fn with_dry_run_params(path: &str) -> String {
    if path.contains('?') {
        format!("{}&debug=1&dryrun=1", path)
    } else {
        format!("{}?debug=1&dryrun=1", path)
    }
}

/// Issue stage: perform the HTTP exchange, classifying the result without
/// interpreting it.
async fn issue(inner: &Inner, src: &'static str, url: &str, method: Method, body: Option<Value>) -> FetchOutcome {
    let mut request = inner.client.request(method, url).bearer_auth(&inner.token);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!(src, error = %e, "HTTP request failed");
            return FetchOutcome::TransportError {
                detail: format!("transport error: {}", e),
            };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        error!(src, status = status.as_u16(), "HTTP status returned");
        return FetchOutcome::TransportError {
            detail: format!("HTTP status {}", status.as_u16()),
        };
    }

    match response.json::<Value>().await {
        Ok(Value::Null) => FetchOutcome::NullBody,
        Ok(json) => FetchOutcome::Success(json),
        Err(e) => {
            error!(src, error = %e, "Failed reading response body");
            FetchOutcome::NullBody
        }
    }
}

fn enqueue(inner: &Arc<Inner>, result: ApprovalResult, callback: Callback) {
    let depth = inner.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
    if inner.stats.note_queue_depth(depth) {
        warn!(depth, "New peak API callback queue depth");
    }

    let completion = Completion {
        result,
        callback,
        enqueued_at: Instant::now(),
    };

    if let Err(send_err) = inner.completions.try_send(completion) {
        // Queue full or workers gone; the one-callback-per-call contract
        // still holds. Overflow deliveries go to the runtime's blocking
        // pool so callback code stays off the transport task even at
        // capacity.
        inner.queue_depth.fetch_sub(1, Ordering::Relaxed);
        error!("Completion queue unavailable, delivering on the blocking pool");
        let completion = match send_err {
            std::sync::mpsc::TrySendError::Full(c) => c,
            std::sync::mpsc::TrySendError::Disconnected(c) => c,
        };
        inner
            .handle
            .spawn_blocking(move || (completion.callback)(completion.result));
    }
}

fn worker_loop(rx: Arc<Mutex<Receiver<Completion>>>, depth: Arc<AtomicU64>) {
    loop {
        let received = {
            let guard = match rx.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            guard.recv()
        };

        let Ok(completion) = received else {
            return;
        };
        depth.fetch_sub(1, Ordering::Relaxed);

        let delay_ms = completion.enqueued_at.elapsed().as_millis() as u64;
        if delay_ms > CALLBACK_DELAY_WARN_MS {
            warn!(
                trx = %completion.result.client_trx_id,
                delay_ms,
                "Callback delivery delayed"
            );
        }

        (completion.callback)(completion.result);
    }
}
