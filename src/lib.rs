//! Загрузка фиксированного списка URL тремя моделями конкурентности
//!
//! # Features
//! - `ThreadedFetcher`: пул OS-потоков, своя сессия у каждого потока
//! - `CooperativeFetcher`: один поток, кооперативные задачи с общей сессией
//! - `ProcessFetcher`: пул OS-процессов, сессия создаётся инициализатором процесса
//! - Ошибки отдельных загрузок собираются в `BatchReport`, батч не прерывается

pub mod cli;
pub mod config;
pub mod cooperative;
pub mod errors;
pub mod logging;
pub mod model;
pub mod process;
pub mod session;
pub mod threaded;

mod queue;

pub use config::Config;
pub use cooperative::CooperativeFetcher;
pub use errors::FetchError;
pub use model::{BatchReport, FetchOutcome, JoinOrdering, Strategy};
pub use process::ProcessFetcher;
pub use session::{AsyncHttpSession, AsyncSession, HttpSession, Session};
pub use threaded::ThreadedFetcher;
