//! Module configuration.
//!
//! All fields have defaults, so an empty document is a valid configuration:
//!
//! ```yaml
//! name: pflog
//! mtu: 33216
//! max_unit: 32767
//! max_interfaces: 1024
//! initial_units: 1
//! queue_len: 50
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::header::{IFNAMSIZ, PFLOG_HDRLEN};
use crate::interface::{DEFAULT_QUEUE_LEN, PFLOG_MTU};

/// Highest unit number a cloner accepts.
pub const IF_MAXUNIT: u32 = 0x7fff;

/// Settings applied when the module loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PflogConfig {
    /// Base interface name; units are appended.
    pub name: String,
    /// MTU given to every interface at creation.
    pub mtu: u32,
    /// Highest unit number accepted.
    pub max_unit: u32,
    /// Maximum number of live interfaces.
    pub max_interfaces: usize,
    /// Interfaces created on load, as units `0..initial_units`.
    pub initial_units: u32,
    /// Send queue bound per interface.
    pub queue_len: usize,
}

impl Default for PflogConfig {
    fn default() -> Self {
        Self {
            name: "pflog".to_string(),
            mtu: PFLOG_MTU,
            max_unit: IF_MAXUNIT,
            max_interfaces: 1024,
            initial_units: 1,
            queue_len: DEFAULT_QUEUE_LEN,
        }
    }
}

impl PflogConfig {
    /// Check that the configuration can produce valid interfaces.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("empty interface name".to_string()));
        }
        if self.name.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "interface name {:?} must not end with a digit",
                self.name
            )));
        }
        if self.name.contains('\0') {
            return Err(Error::Config("interface name contains NUL".to_string()));
        }
        let longest = self.name.len() + self.max_unit.to_string().len();
        if longest >= IFNAMSIZ {
            return Err(Error::Config(format!(
                "name {:?} with unit {} exceeds {} characters",
                self.name,
                self.max_unit,
                IFNAMSIZ - 1
            )));
        }
        if (self.mtu as usize) < PFLOG_HDRLEN {
            return Err(Error::Config(format!(
                "mtu {} smaller than header length {}",
                self.mtu, PFLOG_HDRLEN
            )));
        }
        if self.initial_units as usize > self.max_interfaces
            || self.initial_units > self.max_unit.saturating_add(1)
        {
            return Err(Error::Config(format!(
                "initial_units {} exceeds interface limits",
                self.initial_units
            )));
        }
        Ok(())
    }
}
