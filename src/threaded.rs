//! Пул OS-потоков: каждый воркер лениво создаёт свою сессию и
//! переиспользует её для всех своих задач.

use super::{
    config::Config,
    errors::FetchError,
    model::{
        stdout_sink,
        BatchReport,
        FetchOutcome,
        LineSink,
        Strategy,
    },
    queue::{next_task, task_queue, Task},
    session::{HttpSession, Session},
};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Instant,
};
use crossbeam::{
    channel::{self, Sender},
    deque::Injector,
};
use tracing::{debug, info, warn};


pub struct ThreadedFetcher {
    config: Config,
    sink: LineSink,
}

impl ThreadedFetcher {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sink: stdout_sink(),
        }
    }

    pub fn with_sink(mut self, sink: LineSink) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Загрузка через реальные `HttpSession`
    pub fn run(&self) -> Result<BatchReport, FetchError> {
        self.fetch_all(HttpSession::new)
    }

    /// Загружает все URL не более чем `effective_workers()` потоками.
    ///
    /// `make_session` вызывается внутри воркера при его первой задаче;
    /// полученная сессия живёт до выхода потока. Ошибки и паники отдельных
    /// загрузок попадают в отчёт и не останавливают батч.
    ///
    /// `Err` возвращается только если не удалось запустить ни одного потока.
    pub fn fetch_all<S, F>(&self, make_session: F) -> Result<BatchReport, FetchError>
    where
        S: Session,
        F: Fn() -> Result<S, FetchError> + Sync,
    {
        let start = Instant::now();
        let queue = task_queue(&self.config.urls);
        let workers = self.config.effective_workers();
        let sessions_created = AtomicUsize::new(0);
        let (tx, rx) = channel::unbounded();

        let (spawned, outcomes) = thread::scope(|s| -> Result<(usize, Vec<FetchOutcome>), FetchError> {
            let mut spawned = 0;
            for id in 0..workers {
                let name = format!("fetch-worker-{id}");
                let worker = Worker {
                    name: name.clone(),
                    queue: &queue,
                    make_session: &make_session,
                    sessions_created: &sessions_created,
                    sink: &self.sink,
                };
                let tx = tx.clone();
                match thread::Builder::new()
                    .name(name)
                    .spawn_scoped(s, move || worker.run(tx))
                {
                    Ok(_) => spawned += 1,
                    Err(e) if spawned == 0 => return Err(FetchError::Spawn(e.to_string())),
                    Err(e) => {
                        warn!(spawned, error = %e, "failed to spawn more fetch workers");
                        break;
                    }
                }
            }
            drop(tx);
            Ok((spawned, rx.iter().collect()))
        })?;

        let report = BatchReport::new(
            Strategy::Threads,
            outcomes,
            self.config.ordering,
            start.elapsed(),
            spawned,
            sessions_created.load(Ordering::Acquire),
        );
        info!(
            strategy = %report.strategy,
            total = report.total(),
            failed = report.failed(),
            sessions = report.sessions_created,
            "thread pool batch finished"
        );
        Ok(report)
    }
}


struct Worker<'a, F> {
    name: String,
    queue: &'a Injector<Task>,
    make_session: &'a F,
    sessions_created: &'a AtomicUsize,
    sink: &'a LineSink,
}

impl<S, F> Worker<'_, F>
where
    S: Session,
    F: Fn() -> Result<S, FetchError>,
{
    fn run(self, tx: Sender<FetchOutcome>) {
        debug!(worker = %self.name, "worker started");
        let mut session: Option<S> = None;
        let mut handled = 0usize;

        while let Some(task) = next_task(self.queue) {
            let result = match &mut session {
                Some(session) => fetch(session, &task.url),
                None => self
                    .create_session()
                    .and_then(|created| fetch(session.insert(created), &task.url)),
            };
            match &result {
                Ok(bytes) => (self.sink)(&format!("Read {bytes} from {}", task.url)),
                Err(e) => warn!(worker = %self.name, url = %task.url, error = %e, "fetch failed"),
            }
            handled += 1;

            let outcome = FetchOutcome {
                index: task.index,
                url: task.url,
                worker: self.name.clone(),
                result,
            };
            if tx.send(outcome).is_err() {
                break;
            }
        }

        debug!(worker = %self.name, handled, "worker finished");
    }

    fn create_session(&self) -> Result<S, FetchError> {
        let session = catch_unwind(AssertUnwindSafe(|| (self.make_session)()))
            .unwrap_or_else(|payload| Err(FetchError::from_panic(payload)))?;
        self.sessions_created.fetch_add(1, Ordering::Release);
        debug!(worker = %self.name, "session created");
        Ok(session)
    }
}

fn fetch<S: Session>(session: &mut S, url: &str) -> Result<u64, FetchError> {
    catch_unwind(AssertUnwindSafe(|| session.get(url)))
        .unwrap_or_else(|payload| Err(FetchError::from_panic(payload)))
}
