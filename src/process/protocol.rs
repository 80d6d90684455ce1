//! Обмен с процессом-воркером: JSON по одной записи на строку
//! через stdin/stdout воркера.
//!
//! ```text
//! воркер -> пул : {"ready":{"worker":"PoolWorker-1"}}
//! пул -> воркер : {"index":0,"url":"http://..."}
//! воркер -> пул : {"fetched":{"index":0,"bytes":1024}}
//! ```
//!
//! Пул закрывает stdin воркера, когда задачи кончились; воркер выходит на EOF.

use crate::{
    errors::FetchError,
    session::Session,
};
use std::io::{BufRead, Write};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub index: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerReply {
    Ready { worker: String },
    InitFailed { worker: String, error: FetchError },
    Fetched { index: usize, bytes: u64 },
    Failed { index: usize, error: FetchError },
}


pub fn write_message<T, W>(output: &mut W, message: &T) -> Result<(), FetchError>
where
    T: Serialize,
    W: Write + ?Sized,
{
    let mut line = serde_json::to_vec(message).map_err(|e| FetchError::Protocol(e.to_string()))?;
    line.push(b'\n');
    output
        .write_all(&line)
        .and_then(|_| output.flush())
        .map_err(|e| FetchError::Protocol(e.to_string()))
}

/// `Ok(None)` на EOF
pub fn read_message<T, R>(input: &mut R) -> Result<Option<T>, FetchError>
where
    T: DeserializeOwned,
    R: BufRead + ?Sized,
{
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| FetchError::Protocol(e.to_string()))?;
    if read == 0 {
        return Ok(None);
    }
    serde_json::from_str(line.trim_end())
        .map(Some)
        .map_err(|e| FetchError::Protocol(format!("bad message {:?}: {e}", line.trim_end())))
}


/// Тело процесса-воркера.
///
/// Сначала один раз создаёт сессию (инициализатор процесса) и сообщает
/// `Ready`, затем обслуживает запросы до EOF на `input`. Возвращает число
/// обработанных запросов.
pub fn serve_worker<S, F, R, W>(
    name: &str,
    make_session: F,
    mut input: R,
    mut output: W,
) -> Result<usize, FetchError>
where
    S: Session,
    F: FnOnce() -> Result<S, FetchError>,
    R: BufRead,
    W: Write,
{
    let mut session = match make_session() {
        Ok(session) => session,
        Err(error) => {
            let reply = WorkerReply::InitFailed {
                worker: name.to_owned(),
                error: error.clone(),
            };
            write_message(&mut output, &reply)?;
            return Err(error);
        }
    };
    write_message(&mut output, &WorkerReply::Ready { worker: name.to_owned() })?;
    debug!(worker = name, "worker session ready");

    let mut handled = 0usize;
    while let Some(request) = read_message::<WorkerRequest, _>(&mut input)? {
        let reply = match session.get(&request.url) {
            Ok(bytes) => WorkerReply::Fetched {
                index: request.index,
                bytes,
            },
            Err(error) => WorkerReply::Failed {
                index: request.index,
                error,
            },
        };
        write_message(&mut output, &reply)?;
        handled += 1;
    }

    debug!(worker = name, handled, "worker input closed");
    Ok(handled)
}
