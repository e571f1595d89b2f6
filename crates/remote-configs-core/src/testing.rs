//! In-memory stand-ins for the store's collaborators.
//!
//! Host applications can use these to drive a `ConfigStore` in their own
//! tests without touching the disk or the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::{ApiError, NetworkProvider};
use crate::cache::{CacheError, CacheProvider};
use crate::clock::Clock;
use crate::snapshot::ConfigSnapshot;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, Default)]
struct CacheRecord {
    configs: Option<ConfigSnapshot>,
    last_modified: Option<DateTime<Utc>>,
}

/// Cache kept in memory. Writes are stamped with the shared clock.
pub struct FakeCacheProvider {
    record: Mutex<CacheRecord>,
    clock: Arc<dyn Clock>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FakeCacheProvider {
    pub fn new(
        configs: Option<ConfigSnapshot>,
        last_modified: Option<DateTime<Utc>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            record: Mutex::new(CacheRecord {
                configs,
                last_modified,
            }),
            clock,
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make every following `set` fail as if the disk were full.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<ConfigSnapshot> {
        lock(&self.record).configs.clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheProvider for FakeCacheProvider {
    async fn get(&self) -> Option<ConfigSnapshot> {
        lock(&self.record).configs.clone()
    }

    async fn set(&self, configs: &ConfigSnapshot) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::io(
                "fake-cache",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut record = lock(&self.record);
        record.configs = Some(configs.clone());
        record.last_modified = Some(self.clock.now());
        Ok(())
    }

    async fn last_modified(&self) -> Option<DateTime<Utc>> {
        lock(&self.record).last_modified
    }

    fn delete_cache_file(&self) -> Result<(), CacheError> {
        *lock(&self.record) = CacheRecord::default();
        Ok(())
    }
}

/// What `FakeNetworkProvider` answers with.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Configs(ConfigSnapshot),
    /// Success status with no usable body.
    Empty,
    /// Transport or status failure.
    Fail,
    /// Never completes.
    Hang,
}

/// Network provider with a scripted response.
pub struct FakeNetworkProvider {
    response: Mutex<FakeResponse>,
    requests: Mutex<Vec<(String, HashMap<String, String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeNetworkProvider {
    pub fn new(response: FakeResponse) -> Self {
        Self {
            response: Mutex::new(response),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_response(&self, response: FakeResponse) {
        *lock(&self.response) = response;
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn last_request(&self) -> Option<(String, HashMap<String, String>)> {
        lock(&self.requests).last().cloned()
    }

    /// Highest number of requests that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts one running request for as long as it lives, so a request future
/// dropped mid-flight is still taken off the count.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> (Self, usize) {
        let running = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (Self(counter), running)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkProvider for FakeNetworkProvider {
    async fn request_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Option<ConfigSnapshot>, ApiError> {
        lock(&self.requests).push((url.to_string(), headers.clone()));
        let (_in_flight, running) = InFlight::enter(&self.in_flight);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        // Give other tasks a chance to run while this request is "on the wire"
        tokio::task::yield_now().await;

        let response = lock(&self.response).clone();
        match response {
            FakeResponse::Configs(configs) => Ok(Some(configs)),
            FakeResponse::Empty => Ok(None),
            FakeResponse::Fail => Err(ApiError::ServerError("fake outage".to_string())),
            FakeResponse::Hang => std::future::pending().await,
        }
    }
}
