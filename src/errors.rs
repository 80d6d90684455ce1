use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибка одной загрузки или запуска пула.
///
/// Все варианты несут строки, чтобы ошибку можно было положить в отчёт
/// и передать через границу процесса.
#[derive(Debug, PartialEq, Eq, Clone, Error, Serialize, Deserialize)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("failed to create HTTP session: {0}")]
    Session(String),

    #[error("fetch panicked: {0}")]
    Panic(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    #[error("worker {name} exited before finishing its task")]
    WorkerLost { name: String },

    #[error("worker protocol error: {0}")]
    Protocol(String),

    #[error("no worker left to run the task")]
    NoWorkers,

    #[error("failed to start runtime: {0}")]
    Runtime(String),
}

impl FetchError {
    pub(crate) fn request(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Request {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn body(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Body {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }

    /// Текст паники из payload `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic in fetch task".to_owned()
        };
        Self::Panic(message)
    }
}
