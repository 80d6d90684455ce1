use super::errors::FetchError;
use std::{
    fmt,
    sync::Arc,
    time::Duration,
};


/// Куда печатаются строки `Read ... from ...`.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

pub fn stdout_sink() -> LineSink {
    Arc::new(|line: &str| println!("{line}"))
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Threads,
    Cooperative,
    Processes,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Threads => "threads",
            Strategy::Cooperative => "cooperative",
            Strategy::Processes => "processes",
        };
        f.write_str(name)
    }
}


/// Порядок исходов в отчёте
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinOrdering {
    /// По индексу задачи в списке URL
    Ordered,
    /// В порядке завершения
    #[default]
    UnOrdered,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub index: usize,
    pub url: String,
    pub worker: String,
    pub result: Result<u64, FetchError>,
}

impl FetchOutcome {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}


/// Итог одного батча: все исходы плюс время и число сессий.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub strategy: Strategy,
    pub outcomes: Vec<FetchOutcome>,
    pub elapsed: Duration,
    pub workers: usize,
    pub sessions_created: usize,
}

impl BatchReport {
    pub(crate) fn new(
        strategy: Strategy,
        mut outcomes: Vec<FetchOutcome>,
        ordering: JoinOrdering,
        elapsed: Duration,
        workers: usize,
        sessions_created: usize,
    ) -> Self {
        if ordering == JoinOrdering::Ordered {
            outcomes.sort_by_key(|o| o.index);
        }
        Self {
            strategy,
            outcomes,
            elapsed,
            workers,
            sessions_created,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.completed()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            return 1.0;
        }
        self.completed() as f64 / self.total() as f64
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Итоговая строка; потоковый вариант дописывает число потоков.
    pub fn summary(&self) -> String {
        let base = format!(
            "Downloaded {} in {} seconds",
            self.total(),
            self.elapsed.as_secs_f64()
        );
        match self.strategy {
            Strategy::Threads => format!("{base} using {} threads", self.workers),
            Strategy::Cooperative | Strategy::Processes => base,
        }
    }
}
