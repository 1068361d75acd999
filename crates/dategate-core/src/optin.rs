//! Opt-in flag capability.
//!
//! The flag is written by an external collaborator (the acceptance UI) and
//! only read by the gate. Only the literal value `"true"` means accepted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::DatabaseError;
use crate::storage::Database;

/// Stored value meaning "accepted".
pub const ACCEPTED_VALUE: &str = "true";

pub trait OptInFlag {
    fn read(&self) -> bool;
}

impl<F: OptInFlag + ?Sized> OptInFlag for &F {
    fn read(&self) -> bool {
        (**self).read()
    }
}

impl<F: OptInFlag + ?Sized> OptInFlag for Arc<F> {
    fn read(&self) -> bool {
        (**self).read()
    }
}

/// A fixed answer, for one-shot checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticOptIn(pub bool);

impl OptInFlag for StaticOptIn {
    fn read(&self) -> bool {
        self.0
    }
}

impl OptInFlag for AtomicBool {
    fn read(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Interpret a raw stored value.
pub fn is_accepted(raw: Option<&str>) -> bool {
    raw == Some(ACCEPTED_VALUE)
}

/// Flag persisted in the device-local key-value store.
pub struct StoredOptIn {
    db: Database,
    key: String,
}

impl StoredOptIn {
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored value as-is, `None` if absent.
    pub fn raw(&self) -> Result<Option<String>, DatabaseError> {
        self.db.kv_get(&self.key)
    }

    pub fn accept(&self) -> Result<(), DatabaseError> {
        self.db.kv_set(&self.key, ACCEPTED_VALUE)
    }

    /// Forget the acceptance. Absent and `"false"` read the same.
    pub fn revoke(&self) -> Result<bool, DatabaseError> {
        self.db.kv_delete(&self.key)
    }
}

impl OptInFlag for StoredOptIn {
    fn read(&self) -> bool {
        match self.raw() {
            Ok(raw) => is_accepted(raw.as_deref()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "opt-in flag unreadable, treating as not accepted");
                false
            }
        }
    }
}
