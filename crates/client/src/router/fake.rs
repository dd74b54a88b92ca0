//! In-crate test doubles for the router.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shellcache_core::{CacheStore, Error, Request, Response};
use url::Url;

use crate::fetch::Network;

pub const ORIGIN: &str = "http://127.0.0.1:5000";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub fn at(path: &str) -> Url {
    origin().join(path).unwrap()
}

/// Scripted network keyed by URL. Unknown URLs fail like an offline host.
#[derive(Default)]
pub struct FakeNetwork {
    replies: Mutex<HashMap<String, (u16, String)>>,
    redirects: Mutex<HashMap<String, Url>>,
    oversized: Mutex<HashSet<String>>,
    offline: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `path` on the test origin.
    pub fn serve(&self, path: &str, status: u16, body: &str) -> &Self {
        self.serve_url(at(path), status, body)
    }

    pub fn serve_url(&self, url: Url, status: u16, body: &str) -> &Self {
        self.replies.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// Answer requests for `path` as if redirected to `to`.
    pub fn redirect(&self, path: &str, to: Url) -> &Self {
        self.redirects.lock().unwrap().insert(at(path).to_string(), to);
        self
    }

    /// Fail `path` the way an over-limit body does.
    pub fn serve_oversized(&self, path: &str) -> &Self {
        self.oversized.lock().unwrap().insert(at(path).to_string());
        self
    }

    /// Hold every fetch for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.offline.lock().unwrap() {
            return Err(Error::Network(format!("{}: connection refused", request.url)));
        }

        let key = request.url.to_string();
        if self.oversized.lock().unwrap().contains(&key) {
            return Err(Error::FetchTooLarge(format!("{key}: body exceeds limit")));
        }
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        let final_url = self.redirects.lock().unwrap().get(&key).cloned();

        match reply {
            Some((status, body)) => Ok(Response::new(status, final_url.unwrap_or_else(|| request.url.clone()), body)
                .with_header("content-type", "text/plain")),
            None => Err(Error::Network(format!("{key}: no route to host"))),
        }
    }
}

/// A store whose every operation fails, as if the backing database were gone.
pub struct BrokenStore;

fn unavailable() -> Error {
    Error::CorruptEntry("store unavailable".into())
}

#[async_trait::async_trait]
impl CacheStore for BrokenStore {
    async fn open(&self, _bucket: &str) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn match_request(&self, _bucket: &str, _request: &Request) -> Result<Option<Response>, Error> {
        Err(unavailable())
    }

    async fn match_any(&self, _request: &Request) -> Result<Option<Response>, Error> {
        Err(unavailable())
    }

    async fn put(&self, _bucket: &str, _request: &Request, _response: &Response) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn put_all(&self, _bucket: &str, _entries: &[(Request, Response)]) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn delete(&self, _bucket: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }

    async fn entry_count(&self, _bucket: &str) -> Result<u64, Error> {
        Err(unavailable())
    }
}
