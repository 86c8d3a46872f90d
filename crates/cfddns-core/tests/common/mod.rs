//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles record every call behind shared `Arc` counters so a test can
//! hand one copy to the reconciler and inspect another.

#![allow(dead_code)]

use cfddns_core::config::{DdnsConfig, RecordTarget};
use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{IpResolver, RecordStore};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A resolver that replays scripted answers, repeating the last one forever
pub struct ScriptedIpResolver {
    answers: Arc<Mutex<VecDeque<Result<Ipv4Addr>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpResolver {
    /// A resolver that always answers `ip`
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::scripted(vec![Ok(ip)])
    }

    /// A resolver that always fails
    pub fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(Error::network(message))])
    }

    /// A resolver that answers in order, then repeats the final answer
    pub fn scripted(answers: Vec<Result<Ipv4Addr>>) -> Self {
        assert!(!answers.is_empty(), "at least one answer is required");
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new resolver that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            answers: Arc::clone(&other.answers),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap()
        }
    }

    fn resolver_name(&self) -> &str {
        "scripted"
    }
}

/// One recorded write_record() call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub record_id: String,
    pub name: String,
    pub ip: String,
    pub ttl: u32,
}

/// An in-memory record store keyed by record id that tracks calls
pub struct MockRecordStore {
    /// Stored content per record id
    contents: Arc<Mutex<HashMap<String, String>>>,
    /// Record ids whose reads fail
    failing_reads: Arc<Mutex<Vec<String>>>,
    /// Record ids whose writes fail
    failing_writes: Arc<Mutex<Vec<String>>>,
    /// Record ids in read order
    reads: Arc<Mutex<Vec<String>>>,
    /// Recorded writes in call order
    writes: Arc<Mutex<Vec<WriteCall>>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            contents: Arc::new(Mutex::new(HashMap::new())),
            failing_reads: Arc::new(Mutex::new(Vec::new())),
            failing_writes: Arc::new(Mutex::new(Vec::new())),
            reads: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed the stored content of a record
    pub fn with_content(self, record_id: &str, content: &str) -> Self {
        self.contents
            .lock()
            .unwrap()
            .insert(record_id.to_string(), content.to_string());
        self
    }

    /// Make every read of a record fail (simulated timeout)
    pub fn with_failing_read(self, record_id: &str) -> Self {
        self.failing_reads.lock().unwrap().push(record_id.to_string());
        self
    }

    /// Make every write of a record fail
    pub fn with_failing_write(self, record_id: &str) -> Self {
        self.failing_writes.lock().unwrap().push(record_id.to_string());
        self
    }

    /// Current stored content of a record
    pub fn content(&self, record_id: &str) -> Option<String> {
        self.contents.lock().unwrap().get(record_id).cloned()
    }

    /// Record ids read so far, in order
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    /// Writes issued so far, in order
    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    /// Get the number of times write_record() was called
    pub fn write_call_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// Create a new MockRecordStore that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            contents: Arc::clone(&other.contents),
            failing_reads: Arc::clone(&other.failing_reads),
            failing_writes: Arc::clone(&other.failing_writes),
            reads: Arc::clone(&other.reads),
            writes: Arc::clone(&other.writes),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn read_record(&self, target: &RecordTarget) -> Result<String> {
        self.reads.lock().unwrap().push(target.record_id.clone());

        if self.failing_reads.lock().unwrap().contains(&target.record_id) {
            return Err(Error::provider(&target.name, "operation timed out"));
        }

        self.contents
            .lock()
            .unwrap()
            .get(&target.record_id)
            .cloned()
            .ok_or_else(|| Error::provider_status(&target.name, 404, "DNS record not found"))
    }

    async fn write_record(&self, target: &RecordTarget, ip: &str, ttl: u32) -> Result<()> {
        self.writes.lock().unwrap().push(WriteCall {
            record_id: target.record_id.clone(),
            name: target.name.clone(),
            ip: ip.to_string(),
            ttl,
        });

        if self.failing_writes.lock().unwrap().contains(&target.record_id) {
            return Err(Error::provider_status(&target.name, 500, "Cloudflare server error"));
        }

        self.contents
            .lock()
            .unwrap()
            .insert(target.record_id.clone(), ip.to_string());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a configuration for the given records
pub fn config_for(records: &[(&str, &str, &str)]) -> DdnsConfig {
    DdnsConfig::new(
        "test-token",
        records
            .iter()
            .map(|(zone, record, name)| RecordTarget::new(*zone, *record, *name))
            .collect(),
    )
}
