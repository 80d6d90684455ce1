use super::config::{repeated_urls, Config, DEFAULT_REPEAT, DEMO_SITES};
use clap::Args;


/// Общие флаги трёх бинарников. Без флагов получается демо-батч
/// из `DEMO_SITES` x `DEFAULT_REPEAT`.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Size of the worker pool (threads or processes)
    #[arg(long)]
    pub workers: Option<usize>,

    /// URL to fetch; repeat the flag for several URLs. Replaces the demo sites
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// How many times the URL list is repeated
    #[arg(long, default_value_t = DEFAULT_REPEAT)]
    pub repeat: usize,
}

impl FetchArgs {
    /// Накладывает флаги на пресет `base`
    pub fn apply(&self, base: Config) -> Config {
        let urls = if self.urls.is_empty() {
            repeated_urls(&DEMO_SITES[..], self.repeat)
        } else {
            repeated_urls(&self.urls[..], self.repeat)
        };
        let config = base.with_urls(urls);
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }
}
