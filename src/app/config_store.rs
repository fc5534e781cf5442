//! Persistent tunables with per-field pending-publish tracking.
//!
//! The configuration lives in one JSON document under
//! `dewvent::config.json`.  Loading is tolerant per field: a missing or
//! out-of-range value defaults that field only.  A missing or unparseable
//! document is an error, and the caller is expected to [`reset`] and
//! persist the defaults.
//!
//! Every accepted mutation marks the touched field pending; the remote
//! surface clears a flag only after the broker confirmed the publication.
//!
//! [`reset`]: ConfigStore::reset

use log::{info, warn};
use serde_json::{Map, Value};

use crate::config::{ConfigField, FieldValue, OperatingMode, VentConfig};

use super::ports::{ConfigError, StorageError, StoragePort};

pub const CONFIG_NAMESPACE: &str = "dewvent";
pub const CONFIG_KEY: &str = "config.json";

/// Upper bound for the stored document.
const MAX_DOC_SIZE: usize = 1024;

// ───────────────────────────────────────────────────────────────
// Pending-publish flags
// ───────────────────────────────────────────────────────────────

/// One bit per [`ConfigField`], see [`ConfigField::mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingPublish(u16);

impl PendingPublish {
    pub const NONE: Self = Self(0);

    /// Every field pending (boot, reset).
    pub fn all() -> Self {
        Self(ConfigField::ALL.iter().fold(0, |acc, f| acc | f.mask()))
    }

    pub fn mark(&mut self, field: ConfigField) {
        self.0 |= field.mask();
    }

    pub fn clear(&mut self, field: ConfigField) {
        self.0 &= !field.mask();
    }

    pub fn contains(self, field: ConfigField) -> bool {
        self.0 & field.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Pending fields in publication order.
    pub fn fields(self) -> impl Iterator<Item = ConfigField> {
        ConfigField::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

// ───────────────────────────────────────────────────────────────
// Document parsing
// ───────────────────────────────────────────────────────────────

/// Decode a stored document into a configuration.
///
/// Only a non-JSON or non-object document is an error; each field that is
/// missing, of the wrong type or out of range takes its default.
pub fn parse_document(bytes: &[u8]) -> Result<VentConfig, ConfigError> {
    if bytes.is_empty() {
        return Err(ConfigError::NotFound);
    }
    let value: Value = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
    let Value::Object(doc) = value else {
        return Err(ConfigError::Corrupted);
    };

    let mut config = VentConfig::default();
    for field in ConfigField::ALL {
        match field_from_document(&doc, field) {
            Some(v) => config.set(field, v),
            None => warn!(
                "Stored '{}' missing or invalid, using default {}",
                field.storage_key(),
                config.get(field)
            ),
        }
    }
    Ok(config)
}

fn field_from_document(doc: &Map<String, Value>, field: ConfigField) -> Option<FieldValue> {
    let raw = doc.get(field.storage_key())?;
    let value = if field == ConfigField::Mode {
        FieldValue::Mode(OperatingMode::parse_or_auto(raw.as_str()?))
    } else {
        let n = match raw.as_i64() {
            Some(n) => n,
            None => raw.as_f64().filter(|f| f.is_finite())?.trunc() as i64,
        };
        FieldValue::Int(i32::try_from(n).ok()?)
    };
    field.validate(value).ok()
}

// ───────────────────────────────────────────────────────────────
// ConfigStore
// ───────────────────────────────────────────────────────────────

/// In-memory configuration plus its persistence and publish bookkeeping.
pub struct ConfigStore {
    config: VentConfig,
    pending: PendingPublish,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Defaults, with every field pending publication.
    pub fn new() -> Self {
        Self {
            config: VentConfig::default(),
            pending: PendingPublish::all(),
        }
    }

    pub fn config(&self) -> &VentConfig {
        &self.config
    }

    /// Replace the in-memory values with the stored document.
    pub fn load(&mut self, storage: &impl StoragePort) -> Result<(), ConfigError> {
        let mut buf = [0u8; MAX_DOC_SIZE];
        let len = match storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Err(ConfigError::NotFound),
            Err(e) => return Err(e.into()),
        };
        self.config = parse_document(&buf[..len])?;
        info!("Config loaded ({} bytes)", len);
        Ok(())
    }

    /// Load, or fall back to defaults and persist them.
    pub fn load_or_reset(&mut self, storage: &mut impl StoragePort) -> Result<(), ConfigError> {
        match self.load(storage) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Config unavailable ({}), writing defaults", e);
                self.reset(storage)
            }
        }
    }

    /// Persist the full document.
    pub fn save(&self, storage: &mut impl StoragePort) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec(&self.config).map_err(|_| ConfigError::Corrupted)?;
        storage.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)?;
        info!("Config saved ({} bytes)", bytes.len());
        Ok(())
    }

    /// Restore defaults, mark everything pending and persist.
    pub fn reset(&mut self, storage: &mut impl StoragePort) -> Result<(), ConfigError> {
        self.config = VentConfig::default();
        self.pending = PendingPublish::all();
        info!("Config reset to defaults");
        self.save(storage)
    }

    /// Apply a textual value from the remote channel.
    ///
    /// On a validation error nothing changes.  If only the save fails the
    /// new value stays in memory and is still marked pending.
    pub fn set_field(
        &mut self,
        field: ConfigField,
        raw: &str,
        storage: &mut impl StoragePort,
    ) -> Result<FieldValue, ConfigError> {
        let value = field.parse(raw)?;
        self.config.set(field, value);
        self.pending.mark(field);
        info!("Config '{}' set to {}", field.remote_name(), value);
        self.save(storage)?;
        Ok(value)
    }

    pub fn pending(&self) -> PendingPublish {
        self.pending
    }

    pub fn clear_pending(&mut self, field: ConfigField) {
        self.pending.clear(field);
    }
}
