use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Логи в stderr: stdout занят строками `Read ...` и протоколом воркеров.
/// Фильтр берётся из `RUST_LOG`, иначе `warn`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
