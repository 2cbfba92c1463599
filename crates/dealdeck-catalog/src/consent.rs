//! Consent flags, persisted apart from favorites.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::ClientStorage;

pub const CONSENT_KEY: &str = "dealdeck.consent";

/// `analytics` stays `None` until the visitor answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentFlags {
    #[serde(default)]
    pub analytics: Option<bool>,
    #[serde(default)]
    pub toast_shown: bool,
}

#[derive(Debug)]
pub struct ConsentStore<S> {
    storage: S,
    flags: ConsentFlags,
}

impl<S: ClientStorage> ConsentStore<S> {
    pub fn hydrate(storage: S) -> Self {
        let flags = match storage.get(CONSENT_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding malformed consent data");
                ConsentFlags::default()
            }),
            Ok(None) => ConsentFlags::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read consent flags; using defaults");
                ConsentFlags::default()
            }
        };
        Self { storage, flags }
    }

    #[must_use]
    pub fn flags(&self) -> ConsentFlags {
        self.flags
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the flags cannot be persisted.
    pub fn set_analytics(&mut self, granted: bool) -> Result<(), StorageError> {
        self.update(ConsentFlags {
            analytics: Some(granted),
            ..self.flags
        })
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the flags cannot be persisted.
    pub fn mark_toast_shown(&mut self) -> Result<(), StorageError> {
        self.update(ConsentFlags {
            toast_shown: true,
            ..self.flags
        })
    }

    /// Forgets every answer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the key cannot be removed.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.storage.remove(CONSENT_KEY)?;
        self.flags = ConsentFlags::default();
        Ok(())
    }

    fn update(&mut self, next: ConsentFlags) -> Result<(), StorageError> {
        if next == self.flags {
            return Ok(());
        }
        let raw = serde_json::to_string(&next).map_err(|source| StorageError::Serialize {
            key: CONSENT_KEY.to_string(),
            source,
        })?;
        self.storage.set(CONSENT_KEY, &raw)?;
        self.flags = next;
        Ok(())
    }
}
