//! Пул OS-процессов. Каждый воркер — отдельный экземпляр программы,
//! запущенный как `{program} --worker-name {name}`; свою сессию он
//! создаёт сам и держит до выхода.

pub mod protocol;

use self::protocol::{read_message, write_message, WorkerReply, WorkerRequest};
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
};
use std::{
    io::BufReader,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Instant,
};
use crossbeam::{
    channel::{self, Sender},
    deque::Injector,
};
use tracing::{debug, info, warn};


/// Флаг, по которому программа переключается в режим воркера
pub const WORKER_NAME_FLAG: &str = "--worker-name";

const UNASSIGNED: &str = "unassigned";

pub struct ProcessFetcher {
    config: Config,
    program: PathBuf,
    sink: LineSink,
}

impl ProcessFetcher {
    /// `program` должна понимать `--worker-name` и говорить по `protocol`.
    pub fn new(config: Config, program: impl Into<PathBuf>) -> Self {
        Self {
            config,
            program: program.into(),
            sink: stdout_sink(),
        }
    }

    /// Воркеры — копии текущего исполняемого файла
    pub fn current_exe(config: Config) -> Result<Self, FetchError> {
        let program = std::env::current_exe().map_err(|e| FetchError::Spawn(e.to_string()))?;
        Ok(Self::new(config, program))
    }

    pub fn with_sink(mut self, sink: LineSink) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Раздаёт URL не более чем `effective_workers()` процессам.
    ///
    /// Возвращается только после того, как у каждого воркера закрыт stdin и
    /// процесс завершён. Задачи, которые не досталось ни одному живому
    /// воркеру, попадают в отчёт как `FetchError::NoWorkers`.
    pub fn fetch_all(&self) -> Result<BatchReport, FetchError> {
        let start = Instant::now();
        let queue = task_queue(&self.config.urls);

        let mut pool = Vec::with_capacity(self.config.effective_workers());
        for id in 1..=self.config.effective_workers() {
            match WorkerProcess::spawn(&self.program, format!("PoolWorker-{id}")) {
                Ok(process) => pool.push(process),
                Err(e) if pool.is_empty() => return Err(e),
                Err(e) => {
                    warn!(spawned = pool.len(), error = %e, "failed to spawn more worker processes");
                    break;
                }
            }
        }
        let workers = pool.len();

        let sessions_created = AtomicUsize::new(0);
        let (tx, rx) = channel::unbounded();
        let mut outcomes: Vec<FetchOutcome> = thread::scope(|s| {
            for process in pool.iter_mut() {
                let feeder = Feeder {
                    queue: &queue,
                    sessions_created: &sessions_created,
                    sink: &self.sink,
                };
                let tx = tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("feed-{}", process.name))
                    .spawn_scoped(s, move || feeder.drive(process, tx));
                if let Err(e) = spawned {
                    warn!(error = %e, "failed to spawn feeder thread");
                }
            }
            drop(tx);
            rx.iter().collect()
        });
        // закрывает stdin и дожидается каждого процесса
        drop(pool);

        while let Some(task) = next_task(&queue) {
            outcomes.push(FetchOutcome {
                index: task.index,
                url: task.url,
                worker: UNASSIGNED.to_owned(),
                result: Err(FetchError::NoWorkers),
            });
        }

        let report = BatchReport::new(
            Strategy::Processes,
            outcomes,
            self.config.ordering,
            start.elapsed(),
            workers,
            sessions_created.load(Ordering::Acquire),
        );
        info!(
            strategy = %report.strategy,
            total = report.total(),
            failed = report.failed(),
            sessions = report.sessions_created,
            "process pool batch finished"
        );
        Ok(report)
    }
}


struct WorkerProcess {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl WorkerProcess {
    fn spawn(program: &Path, name: String) -> Result<Self, FetchError> {
        let mut child = Command::new(program)
            .arg(WORKER_NAME_FLAG)
            .arg(&name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FetchError::Spawn(format!("{}: {e}", program.display())))?;

        match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => {
                debug!(worker = %name, pid = child.id(), "worker process spawned");
                Ok(Self {
                    name,
                    child,
                    stdin: Some(stdin),
                    stdout: BufReader::new(stdout),
                })
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                Err(FetchError::Spawn(format!("{name}: worker pipes unavailable")))
            }
        }
    }

    fn lost(&self) -> FetchError {
        FetchError::WorkerLost {
            name: self.name.clone(),
        }
    }

    /// Ждёт `Ready` от инициализатора воркера
    fn handshake(&mut self) -> Result<(), FetchError> {
        match read_message(&mut self.stdout)? {
            Some(WorkerReply::Ready { .. }) => Ok(()),
            Some(WorkerReply::InitFailed { error, .. }) => Err(error),
            Some(other) => Err(FetchError::Protocol(format!("unexpected handshake {other:?}"))),
            None => Err(self.lost()),
        }
    }

    fn fetch(&mut self, task: &Task) -> Result<u64, FetchError> {
        let request = WorkerRequest {
            index: task.index,
            url: task.url.clone(),
        };
        match self.stdin.as_mut() {
            Some(stdin) => write_message(stdin, &request).map_err(|_| FetchError::WorkerLost {
                name: self.name.clone(),
            })?,
            None => return Err(self.lost()),
        }

        match read_message(&mut self.stdout)? {
            Some(WorkerReply::Fetched { index, bytes }) if index == task.index => Ok(bytes),
            Some(WorkerReply::Failed { index, error }) if index == task.index => Err(error),
            Some(other) => Err(FetchError::Protocol(format!(
                "expected reply for task {}, got {other:?}",
                task.index
            ))),
            None => Err(self.lost()),
        }
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        drop(self.stdin.take());
        match self.child.wait() {
            Ok(status) if status.success() => debug!(worker = %self.name, "worker process exited"),
            Ok(status) => warn!(worker = %self.name, %status, "worker process exited abnormally"),
            Err(e) => warn!(worker = %self.name, error = %e, "failed to wait for worker process"),
        }
    }
}


/// Поток пула, который кормит один процесс задачами из общей очереди
struct Feeder<'a> {
    queue: &'a Injector<Task>,
    sessions_created: &'a AtomicUsize,
    sink: &'a LineSink,
}

impl Feeder<'_> {
    fn drive(self, process: &mut WorkerProcess, tx: Sender<FetchOutcome>) {
        if let Err(e) = process.handshake() {
            warn!(worker = %process.name, error = %e, "worker process failed to initialize");
            return;
        }
        self.sessions_created.fetch_add(1, Ordering::Release);

        while let Some(task) = next_task(self.queue) {
            let result = process.fetch(&task);
            let broken = matches!(
                result,
                Err(FetchError::WorkerLost { .. } | FetchError::Protocol(_))
            );
            match &result {
                Ok(bytes) => (self.sink)(&format!("{}:Read {bytes} from {}", process.name, task.url)),
                Err(e) => warn!(worker = %process.name, url = %task.url, error = %e, "fetch failed"),
            }

            let outcome = FetchOutcome {
                index: task.index,
                url: task.url,
                worker: process.name.clone(),
                result,
            };
            if tx.send(outcome).is_err() || broken {
                break;
            }
        }
    }
}
