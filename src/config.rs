use super::model::JoinOrdering;


pub const DEFAULT_THREAD_WORKERS: usize = 40;
pub const DEFAULT_REPEAT: usize = 80;
pub const DEMO_SITES: [&str; 2] = [
    "https://www.jython.org",
    "http://olympus.realpython.org/dice",
];

/// `DEMO_SITES`, повторённые `repeat` раз
pub fn repeated_urls<S: AsRef<str>>(sites: &[S], repeat: usize) -> Vec<String> {
    let mut urls = Vec::with_capacity(sites.len() * repeat);
    for _ in 0..repeat {
        urls.extend(sites.iter().map(|s| s.as_ref().to_owned()));
    }
    urls
}

pub fn default_urls() -> Vec<String> {
    repeated_urls(&DEMO_SITES[..], DEFAULT_REPEAT)
}


/// Конфигурация батча
#[derive(Debug, Clone)]
pub struct Config {
    pub num_workers: usize,
    pub urls: Vec<String>,
    pub ordering: JoinOrdering,
}

impl Default for Config {
    fn default() -> Self {
        Self::threaded()
    }
}

impl Config {
    pub fn threaded() -> Self {
        Self {
            num_workers: DEFAULT_THREAD_WORKERS,
            urls: default_urls(),
            ordering: JoinOrdering::UnOrdered,
        }
    }

    /// Один поток, все задачи кооперативные
    pub fn cooperative() -> Self {
        Self {
            num_workers: 1,
            urls: default_urls(),
            ordering: JoinOrdering::UnOrdered,
        }
    }

    pub fn processes() -> Self {
        Self {
            num_workers: num_cpus::get(),
            urls: default_urls(),
            ordering: JoinOrdering::UnOrdered,
        }
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ordering(mut self, ordering: JoinOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Сколько воркеров реально запускать: не больше, чем задач, и хотя бы один.
    pub fn effective_workers(&self) -> usize {
        self.num_workers.max(1).min(self.urls.len())
    }
}
