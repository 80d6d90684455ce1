//! HTTP-сессии: блокирующая для пулов потоков и процессов,
//! асинхронная для кооперативного варианта.

use super::errors::FetchError;
use std::future::Future;


/// Блокирующая сессия, которой владеет ровно один воркер.
///
/// `Send`/`Sync` не требуются: сессия создаётся внутри воркера
/// и никогда его не покидает.
pub trait Session {
    /// GET `url`, возвращает длину тела в байтах.
    fn get(&mut self, url: &str) -> Result<u64, FetchError>;
}

/// Сессия для одного потока-планировщика: все задачи берут её по `&`.
pub trait AsyncSession {
    fn get(&self, url: &str) -> impl Future<Output = Result<u64, FetchError>>;
}


fn user_agent() -> String {
    format!("fetch_pools/{}", env!("CARGO_PKG_VERSION"))
}

/// Сессия поверх `reqwest::blocking::Client` (keep-alive + cookies)
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::blocking::Client,
}

impl HttpSession {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent())
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Session for HttpSession {
    fn get(&mut self, url: &str) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::request(url, e))?;
        // статус не проверяется: тело не-2xx ответа тоже считается
        let body = response.bytes().map_err(|e| FetchError::body(url, e))?;
        Ok(body.len() as u64)
    }
}


#[derive(Debug, Clone)]
pub struct AsyncHttpSession {
    client: reqwest::Client,
}

impl AsyncHttpSession {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent())
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))?;
        Ok(Self { client })
    }
}

impl AsyncSession for AsyncHttpSession {
    async fn get(&self, url: &str) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::request(url, e))?;
        let body = response.bytes().await.map_err(|e| FetchError::body(url, e))?;
        Ok(body.len() as u64)
    }
}
