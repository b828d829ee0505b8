//! Test doubles and common utilities for contract tests
//!
//! The fakes here count every call and share their state through `Clone`,
//! so a test can hand one copy to the reconciler and keep another to
//! inspect afterwards.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zonesync_core::config::ReconcileConfig;
use zonesync_core::error::{Error, Result};
use zonesync_core::{CycleContext, DnsRecord, IpResolver, Reconciler, ZoneRecordSource};

pub const ZONE: &str = "z1";
pub const NAME: &str = "home.example.com";

/// What a [`FakeResolver`] does when called
#[derive(Clone)]
enum ResolverBehavior {
    Return(IpAddr),
    Fail(String),
    Hang,
}

/// A scripted IP resolver
#[derive(Clone)]
pub struct FakeResolver {
    behavior: Arc<Mutex<ResolverBehavior>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeResolver {
    fn with(behavior: ResolverBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always resolve to `ip`
    pub fn returning(ip: &str) -> Self {
        Self::with(ResolverBehavior::Return(ip.parse().expect("valid test IP")))
    }

    /// Always fail with a transport-style error
    pub fn failing(message: &str) -> Self {
        Self::with(ResolverBehavior::Fail(message.to_string()))
    }

    /// Never complete
    pub fn hanging() -> Self {
        Self::with(ResolverBehavior::Hang)
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the address returned from now on
    pub fn set_ip(&self, ip: &str) {
        *self.behavior.lock().unwrap() = ResolverBehavior::Return(ip.parse().expect("valid test IP"));
    }

    /// Get the number of times resolve() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for FakeResolver {
    async fn resolve(&self, _ctx: &CycleContext) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ResolverBehavior::Return(ip) => Ok(ip),
            ResolverBehavior::Fail(message) => Err(Error::resolution(message)),
            ResolverBehavior::Hang => std::future::pending().await,
        }
    }

    fn resolver_name(&self) -> &'static str {
        "fake"
    }
}

/// One recorded update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub content: String,
}

#[derive(Default)]
struct ZoneState {
    records: Vec<DnsRecord>,
    list_error: Option<String>,
    hang_on_list: bool,
    hang_on_update: bool,
    failing_updates: HashSet<String>,
    listed_zones: Vec<String>,
    updates: Vec<UpdateCall>,
}

/// An in-memory zone that applies updates to its own records
#[derive(Clone, Default)]
pub struct FakeZoneSource {
    state: Arc<Mutex<ZoneState>>,
    list_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
}

impl FakeZoneSource {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        let source = Self::default();
        source.state.lock().unwrap().records = records;
        source
    }

    /// Make list_records() fail
    pub fn failing_list(self, message: &str) -> Self {
        self.state.lock().unwrap().list_error = Some(message.to_string());
        self
    }

    /// Make list_records() never complete
    pub fn hanging_list(self) -> Self {
        self.state.lock().unwrap().hang_on_list = true;
        self
    }

    /// Make update_record() never complete
    pub fn hanging_updates(self) -> Self {
        self.state.lock().unwrap().hang_on_update = true;
        self
    }

    /// Make update_record() fail for one record
    pub fn failing_update_for(self, record_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(record_id.to_string());
        self
    }

    /// Get the number of times list_records() was called
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Every update call, in order
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Zone ids passed to list_records()
    pub fn listed_zones(&self) -> Vec<String> {
        self.state.lock().unwrap().listed_zones.clone()
    }

    /// Current content of a record
    pub fn content_of(&self, record_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl ZoneRecordSource for FakeZoneSource {
    async fn list_records(&self, zone_id: &str, _ctx: &CycleContext) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let (hang, outcome) = {
            let mut state = self.state.lock().unwrap();
            state.listed_zones.push(zone_id.to_string());
            let outcome = match &state.list_error {
                Some(message) => Err(Error::provider("fake", message.clone())),
                None => Ok(state.records.clone()),
            };
            (state.hang_on_list, outcome)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        outcome
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
        _ctx: &CycleContext,
    ) -> Result<DnsRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let (hang, outcome) = {
            let mut state = self.state.lock().unwrap();
            state.updates.push(UpdateCall {
                zone_id: zone_id.to_string(),
                record_id: record_id.to_string(),
                content: content.to_string(),
            });

            let outcome = if state.failing_updates.contains(record_id) {
                Err(Error::provider("fake", "Authentication failed"))
            } else {
                match state.records.iter_mut().find(|r| r.id == record_id) {
                    Some(record) => {
                        record.content = content.to_string();
                        Ok(record.clone())
                    }
                    None => Err(Error::provider("fake", format!("no record {}", record_id))),
                }
            };
            (state.hang_on_update, outcome)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        outcome
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// An A record in the test zone
pub fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord::new(id, name, "A", content)
}

/// The reference configuration: zone z1, home.example.com, 300s
pub fn config() -> ReconcileConfig {
    ReconcileConfig::new(ZONE, NAME, Duration::from_secs(300))
}

/// A reconciler wired to clones of the given fakes
pub fn reconciler(resolver: &FakeResolver, zone: &FakeZoneSource) -> Reconciler {
    Reconciler::new(Box::new(resolver.clone()), Box::new(zone.clone()))
}

/// A context for cycle 1 with the reference budget
pub fn context() -> CycleContext {
    CycleContext::new(1, config().cycle_budget())
}
