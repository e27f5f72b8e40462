//! Integration tests for [`rbot_rubika::Poller`] over a scripted in-memory transport.
//!
//! Covers: cursor threading, dispatch of fetched updates, limit validation before any network call,
//! resilience to fetch failures, idempotent start, stop, restart while a fetch is in flight, and a
//! failing bot-info fetch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rbot_core::{BotError, FailureContext, Message, Transport, TransportError};
use rbot_dispatch::Dispatcher;
use rbot_rubika::{BotClient, Poller, PollingOptions};
use serde_json::{json, Value};
use tokio::sync::Semaphore;

/// Answers getMe with a fixed bot and getUpdates from a script; once the script is exhausted it
/// returns empty pages. Every call is recorded.
struct ScriptedTransport {
    calls: Mutex<Vec<(String, Value)>>,
    pages: Mutex<VecDeque<Result<Value, TransportError>>>,
    get_me_fails: bool,
}

impl ScriptedTransport {
    fn new(pages: Vec<Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            pages: Mutex::new(pages.into()),
            get_me_fails: false,
        })
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn update_requests(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(method, _)| method == "getUpdates")
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, method: &str, body: Value) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push((method.to_string(), body));
        match method {
            "getMe" if self.get_me_fails => Err(TransportError::HttpStatus { status: 401 }),
            "getMe" => Ok(json!({"bot": {"bot_id": "b1", "username": "echo_bot"}})),
            "getUpdates" => self
                .pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"updates": []}))),
            _ => Ok(json!({})),
        }
    }
}

/// Holds every getUpdates call until a gate permit is released and records the peak number of
/// calls in flight. Page N answers with cursor `cursor-N`.
struct GatedTransport {
    gate: Semaphore,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<Value>>,
}

impl GatedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn call(&self, method: &str, body: Value) -> Result<Value, TransportError> {
        if method != "getUpdates" {
            return Ok(json!({"bot": {"bot_id": "b1", "username": "gated_bot"}}));
        }
        let page = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(body);
            requests.len()
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.gate.acquire().await.expect("gate closed").forget();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(json!({"updates": [], "next_offset_id": format!("cursor-{page}")}))
    }
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

fn fast_options() -> PollingOptions {
    PollingOptions {
        interval: Duration::from_millis(10),
        limit: 100,
    }
}

/// Waits until `transport` has seen at least `count` getUpdates requests.
async fn wait_for_requests(transport: &ScriptedTransport, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while transport.update_requests().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("poller did not issue enough requests in time");
}

/// **Test: The cursor from one page is sent verbatim with the next request.**
///
/// **Setup:** page 1 carries one /start update and `next_offset_id: "X"`; page 2 has no cursor.
/// **Action:** start, wait for three requests, stop.
/// **Expected:** request 1 has no offset, requests 2 and 3 carry "X"; the /start handler ran once.
#[tokio::test]
async fn test_cursor_is_threaded_and_updates_dispatched() {
    let transport = ScriptedTransport::new(vec![
        Ok(json!({
            "updates": [{
                "type": "NewMessage",
                "chat_id": "c1",
                "new_message": {"message_id": "1", "sender_id": "u1", "text": "/start", "time": 1}
            }],
            "next_offset_id": "X"
        })),
        Ok(json!({"updates": []})),
    ]);
    let starts = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new();
    let counter = starts.clone();
    dispatcher
        .on_command("start", move |_message: Message| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), dispatcher);
    let handle = poller.start(fast_options()).unwrap().expect("first start spawns");
    wait_for_requests(&transport, 3).await;
    poller.stop();
    handle.await.unwrap().unwrap();

    let requests = transport.update_requests();
    assert_eq!(requests[0], json!({"limit": 100}));
    assert_eq!(requests[1], json!({"limit": 100, "offset_id": "X"}));
    assert_eq!(requests[2], json!({"limit": 100, "offset_id": "X"}));
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert!(!poller.is_running());
}

/// **Test: limit 0 or 101 fails before any network call.**
#[tokio::test]
async fn test_invalid_limit_fails_before_network() {
    let transport = ScriptedTransport::new(vec![]);
    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), Dispatcher::new());

    for limit in [0, 101] {
        let options = PollingOptions {
            limit,
            ..fast_options()
        };
        assert!(matches!(poller.run(options).await, Err(BotError::Validation(_))));
        assert!(matches!(poller.start(options), Err(BotError::Validation(_))));
    }

    assert!(transport.calls().is_empty());
    assert!(!poller.is_running());
}

/// **Test: A failed fetch is reported to the error hook and polling continues.**
///
/// **Setup:** page 1 times out, page 2 is empty.
/// **Action:** start, wait for two requests, stop.
/// **Expected:** one Polling failure reported; a second request was made.
#[tokio::test]
async fn test_fetch_failure_is_reported_and_loop_continues() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Timeout), Ok(json!({"updates": []}))]);
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();
    let dispatcher = Dispatcher::new().with_error_hook(move |err: &BotError, ctx: FailureContext<'_>| {
        if matches!(ctx, FailureContext::Polling) {
            sink.lock().unwrap().push(err.to_string());
        }
    });

    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), dispatcher);
    let handle = poller.start(fast_options()).unwrap().unwrap();
    wait_for_requests(&transport, 2).await;
    poller.stop();
    handle.await.unwrap().unwrap();

    let failures = failures.lock().unwrap().clone();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("timeout"), "got {failures:?}");
}

/// **Test: start while running is a no-op; stop wakes the loop from its sleep.**
///
/// **Setup:** one-hour interval so the loop would otherwise never come back.
/// **Action:** start twice, wait for the first request, stop.
/// **Expected:** second start returns None; the task finishes promptly after stop.
#[tokio::test]
async fn test_start_is_idempotent_and_stop_interrupts_sleep() {
    let transport = ScriptedTransport::new(vec![]);
    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), Dispatcher::new());
    let options = PollingOptions {
        interval: Duration::from_secs(3600),
        limit: 10,
    };

    let handle = poller.start(options).unwrap().unwrap();
    assert!(poller.is_running());
    assert!(poller.start(options).unwrap().is_none());
    wait_for_requests(&transport, 1).await;

    poller.stop();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("stop must interrupt the inter-cycle sleep")
        .unwrap()
        .unwrap();

    assert_eq!(transport.update_requests().len(), 1);
    let get_me_calls = transport.calls().iter().filter(|(m, _)| m == "getMe").count();
    assert_eq!(get_me_calls, 1);
}

/// **Test: Restarting while a fetch is in flight never runs two loops side by side.**
///
/// **Setup:** getUpdates blocks until the test releases it.
/// **Action:** start, wait for the first fetch, stop, start again, then release the first fetch.
/// **Expected:** the second loop only fetches after the first has exited, continues from
/// `cursor-1`, stays running when the first exits; at most one fetch is ever in flight.
#[tokio::test]
async fn test_restart_during_fetch_does_not_overlap_loops() {
    let transport = GatedTransport::new();
    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), Dispatcher::new());

    let first = poller.start(fast_options()).unwrap().unwrap();
    wait_until("first fetch", || transport.in_flight() == 1).await;

    poller.stop();
    let second = poller
        .start(fast_options())
        .unwrap()
        .expect("start after stop spawns a new loop");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.requests().len(), 1, "second loop fetched before the first exited");

    transport.gate.add_permits(1);
    first.await.unwrap().unwrap();
    assert!(poller.is_running(), "the stopped loop cleared the new loop's running state");

    wait_until("second fetch", || {
        transport.requests().len() == 2 && transport.in_flight() == 1
    })
    .await;
    assert_eq!(
        transport.requests()[1],
        json!({"limit": 100, "offset_id": "cursor-1"})
    );

    poller.stop();
    transport.gate.add_permits(100);
    second.await.unwrap().unwrap();

    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    assert!(!poller.is_running());
}

/// **Test: A stop that lands during a fetch does not cut the next run's first sleep short.**
///
/// **Setup:** one-hour interval; getUpdates blocks until released.
/// **Action:** start, stop mid-fetch, release, start again.
/// **Expected:** the second run makes one request and then sleeps; no immediate second fetch.
#[tokio::test]
async fn test_stop_during_fetch_leaves_no_pending_wake() {
    let transport = GatedTransport::new();
    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), Dispatcher::new());
    let options = PollingOptions {
        interval: Duration::from_secs(3600),
        limit: 10,
    };

    let first = poller.start(options).unwrap().unwrap();
    wait_until("first fetch", || transport.in_flight() == 1).await;
    poller.stop();
    transport.gate.add_permits(100);
    first.await.unwrap().unwrap();

    let second = poller.start(options).unwrap().unwrap();
    wait_until("second run's fetch", || transport.requests().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.requests().len(), 2, "second run skipped its inter-cycle sleep");

    poller.stop();
    tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .expect("stop must interrupt the inter-cycle sleep")
        .unwrap()
        .unwrap();
}

/// **Test: A failed bot-info fetch at startup is returned to the caller.**
#[tokio::test]
async fn test_bot_info_failure_surfaces() {
    let transport = Arc::new(ScriptedTransport {
        calls: Mutex::new(Vec::new()),
        pages: Mutex::new(VecDeque::new()),
        get_me_fails: true,
    });
    let poller = Poller::new(Arc::new(BotClient::new(transport.clone())), Dispatcher::new());

    let result = poller.run(fast_options()).await;

    assert!(matches!(result, Err(BotError::Auth(_))));
    assert!(!poller.is_running());
    assert!(transport.update_requests().is_empty());
}
