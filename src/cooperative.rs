//! Один поток, кооперативная многозадачность: все загрузки — futures
//! одного `FuturesUnordered` на current-thread рантайме tokio.

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
    session::{AsyncHttpSession, AsyncSession},
};
use std::{
    panic::AssertUnwindSafe,
    time::Instant,
};
use futures::{
    FutureExt,
    stream::{FuturesUnordered, StreamExt},
};
use tokio::runtime::Builder;
use tracing::{info, warn};


const WORKER_NAME: &str = "cooperative";

pub struct CooperativeFetcher {
    config: Config,
    sink: LineSink,
}

impl CooperativeFetcher {
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

    /// Поднимает однопоточный рантайм и блокирует вызывающий поток до конца батча.
    pub fn run(&self) -> Result<BatchReport, FetchError> {
        self.block_on(AsyncHttpSession::new)
    }

    pub fn block_on<S, F>(&self, make_session: F) -> Result<BatchReport, FetchError>
    where
        S: AsyncSession,
        F: FnOnce() -> Result<S, FetchError>,
    {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Runtime(e.to_string()))?;
        rt.block_on(async move {
            let session = make_session()?;
            Ok::<_, FetchError>(self.fetch_all(session).await)
        })
    }

    /// Запускает по задаче на URL и ждёт, пока каждая завершится.
    ///
    /// Ошибка или паника одной задачи записывается в отчёт и не отменяет
    /// остальные. Сессия живёт до конца батча и дропается после него.
    pub async fn fetch_all<S: AsyncSession>(&self, session: S) -> BatchReport {
        let start = Instant::now();
        let session = &session;

        let mut pending: FuturesUnordered<_> = self
            .config
            .urls
            .iter()
            .enumerate()
            .map(|(index, url)| async move {
                let result = AssertUnwindSafe(session.get(url))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(FetchError::from_panic(payload)));
                (index, url, result)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(self.config.urls.len());
        while let Some((index, url, result)) = pending.next().await {
            match &result {
                Ok(bytes) => (self.sink)(&format!("Read {bytes} from {url}")),
                Err(e) => warn!(url = %url, error = %e, "fetch failed"),
            }
            outcomes.push(FetchOutcome {
                index,
                url: url.clone(),
                worker: WORKER_NAME.to_owned(),
                result,
            });
        }

        let report = BatchReport::new(
            Strategy::Cooperative,
            outcomes,
            self.config.ordering,
            start.elapsed(),
            1,
            1,
        );
        info!(
            strategy = %report.strategy,
            total = report.total(),
            failed = report.failed(),
            "cooperative batch finished"
        );
        report
    }
}
