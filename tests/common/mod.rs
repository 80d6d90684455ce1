//! Заглушки HTTP-бэкенда для тестов: считают сессии, запросы и
//! пиковое число одновременно открытых сессий.
#![allow(dead_code)]

use fetch_pools::{
    config::repeated_urls,
    model::LineSink,
    AsyncSession,
    FetchError,
    Session,
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, Once,
    },
    thread::{self, ThreadId},
    time::Duration,
};

/// Текст, с которым падает `StubSession` на URL с `panic`
pub const STUB_PANIC: &str = "stub session blew up";

static QUIET_STUB_PANICS: Once = Once::new();

/// Один раз на процесс ставит хук, который молчит про паники заглушки
/// и передаёт остальные (например, упавшие assert) стандартному хуку.
pub fn silence_stub_panics() {
    QUIET_STUB_PANICS.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let from_stub = info
                .payload()
                .downcast_ref::<String>()
                .is_some_and(|msg| msg.contains(STUB_PANIC));
            if !from_stub {
                default_hook(info);
            }
        }));
    });
}

pub const SCENARIO_SITES: [&str; 2] = ["http://example.test/a", "http://example.test/b"];

pub fn scenario_urls() -> Vec<String> {
    repeated_urls(&SCENARIO_SITES[..], 80)
}

/// Синк, который складывает строки в вектор вместо stdout
pub fn collecting_sink() -> (LineSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = lines.clone();
    let sink: LineSink = Arc::new(move |line: &str| {
        captured.lock().unwrap().push(line.to_owned());
    });
    (sink, lines)
}

fn bump(counter: &AtomicUsize, peak: &AtomicUsize) {
    let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(now, Ordering::SeqCst);
}

#[derive(Default)]
pub struct StubBackend {
    pub sessions: AtomicUsize,
    pub fetches: AtomicUsize,
    pub open_sessions: AtomicUsize,
    pub peak_open_sessions: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub worker_names: Mutex<HashSet<String>>,
    pub thread_ids: Mutex<HashSet<ThreadId>>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `/a` -> 10 байт, `/b` -> 20, `unreachable` -> ошибка, `panic` -> паника
    fn respond(url: &str) -> Result<u64, FetchError> {
        if url.contains("unreachable") {
            return Err(FetchError::Request {
                url: url.to_owned(),
                message: "connection refused".to_owned(),
            });
        }
        if url.contains("panic") {
            panic!("{STUB_PANIC} on {url}");
        }
        if url.ends_with("/a") {
            Ok(10)
        } else if url.ends_with("/b") {
            Ok(20)
        } else {
            Ok(0)
        }
    }

    fn record_caller(&self) {
        let current = thread::current();
        if let Some(name) = current.name() {
            self.worker_names.lock().unwrap().insert(name.to_owned());
        }
        self.thread_ids.lock().unwrap().insert(current.id());
    }

    pub fn session(self: &Arc<Self>, delay: Duration) -> Result<StubSession, FetchError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        bump(&self.open_sessions, &self.peak_open_sessions);
        Ok(StubSession {
            backend: self.clone(),
            delay,
        })
    }

    pub fn async_session(self: &Arc<Self>) -> Result<AsyncStubSession, FetchError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        bump(&self.open_sessions, &self.peak_open_sessions);
        Ok(AsyncStubSession {
            backend: self.clone(),
        })
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct StubSession {
    backend: Arc<StubBackend>,
    delay: Duration,
}

impl Session for StubSession {
    fn get(&mut self, url: &str) -> Result<u64, FetchError> {
        self.backend.fetches.fetch_add(1, Ordering::SeqCst);
        self.backend.record_caller();
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        StubBackend::respond(url)
    }
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.backend.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct AsyncStubSession {
    backend: Arc<StubBackend>,
}

impl AsyncSession for AsyncStubSession {
    async fn get(&self, url: &str) -> Result<u64, FetchError> {
        self.backend.fetches.fetch_add(1, Ordering::SeqCst);
        self.backend.record_caller();
        bump(&self.backend.in_flight, &self.backend.peak_in_flight);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.backend.in_flight.fetch_sub(1, Ordering::SeqCst);
        StubBackend::respond(url)
    }
}

impl Drop for AsyncStubSession {
    fn drop(&mut self) {
        self.backend.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
