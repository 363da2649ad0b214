//! # In-Memory Object Store
//!
//! Process-local backend used for development clusters and tests.
//!
//! Every call is recorded in a journal, including calls that fail, so callers
//! can assert on exactly which backend operations a reconciliation issued.
//! Clones share the same state.

use crate::crd::ObjectTarget;
use crate::provider::ObjectStore;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Kind of backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Store,
    Delete,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: Operation,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<(String, String), Vec<u8>>,
    journal: Vec<BackendCall>,
    unavailable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Stored payload for `bucket/key`
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// All calls issued so far, oldest first
    #[must_use]
    pub fn journal(&self) -> Vec<BackendCall> {
        self.lock().journal.clone()
    }

    /// Number of calls issued so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().journal.len()
    }

    /// Number of calls of one kind issued so far
    #[must_use]
    pub fn calls_of(&self, operation: Operation) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn record(state: &mut MemoryState, operation: Operation, target: &ObjectTarget) {
        state.journal.push(BackendCall {
            operation,
            bucket: target.bucket.clone(),
            key: target.key.clone(),
        });
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn store(&self, payload: &[u8], target: &ObjectTarget) -> Result<()> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Store, target);
        if state.unavailable {
            bail!("memory backend unavailable");
        }
        state.objects.insert(
            (target.bucket.clone(), target.key.clone()),
            payload.to_vec(),
        );
        debug!(
            "Stored {} bytes at {}/{}",
            payload.len(),
            target.bucket,
            target.key
        );
        Ok(())
    }

    async fn delete(&self, target: &ObjectTarget) -> Result<()> {
        let mut state = self.lock();
        Self::record(&mut state, Operation::Delete, target);
        if state.unavailable {
            bail!("memory backend unavailable");
        }
        // Absent objects are fine, delete is idempotent
        let removed = state
            .objects
            .remove(&(target.bucket.clone(), target.key.clone()))
            .is_some();
        debug!(
            "Deleted {}/{} (existed: {})",
            target.bucket, target.key, removed
        );
        Ok(())
    }
}
