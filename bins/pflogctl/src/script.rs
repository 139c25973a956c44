//! Replay scripts.
//!
//! A script is a list of steps applied in order to a freshly loaded module:
//!
//! ```yaml
//! steps:
//!   - attach: { unit: 0 }
//!   - configure: { unit: 0, request: { set-flags: 1 } }
//!   - inject:
//!       packet: "aabb"
//!       decision:
//!         interface: em0
//!         family: inet
//!         action: pass
//!         reason: match
//!         direction: out
//!         matched_rule: { number: 3 }
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use pflog::{ControlRequest, Decision};
use serde::{Deserialize, de::DeserializeOwned};

/// A parsed replay script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub steps: Vec<Step>,
}

/// One event applied to the module.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Clone-create; no unit means the lowest free one.
    Create {
        unit: Option<u32>,
    },
    Destroy {
        unit: u32,
    },
    Configure {
        unit: u32,
        request: ControlRequest,
    },
    /// Attach a capture consumer owned by the tool.
    Attach {
        unit: u32,
    },
    Detach {
        unit: u32,
    },
    /// Log a packet; no unit means the default interface.
    Inject {
        unit: Option<u32>,
        packet: String,
        decision: Decision,
    },
    /// Put `count` copies of a packet on the send queue.
    Enqueue {
        unit: u32,
        packet: String,
        #[serde(default = "one")]
        count: usize,
    },
    Drain {
        unit: u32,
    },
}

fn one() -> usize {
    1
}

impl Step {
    /// Short name for operator messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Destroy { .. } => "destroy",
            Self::Configure { .. } => "configure",
            Self::Attach { .. } => "attach",
            Self::Detach { .. } => "detach",
            Self::Inject { .. } => "inject",
            Self::Enqueue { .. } => "enqueue",
            Self::Drain { .. } => "drain",
        }
    }
}

/// Load a YAML or JSON document, chosen by file extension.
pub fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&text, path)
}

fn parse<T: DeserializeOwned>(text: &str, path: &Path) -> anyhow::Result<T> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(text)
            .with_context(|| format!("parsing {} as JSON", path.display())),
        _ => serde_yaml::from_str(text)
            .with_context(|| format!("parsing {} as YAML", path.display())),
    }
}

/// Decode a hex string; whitespace and `:` separators are ignored.
pub fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = s
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits in {:?}", s);
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16).with_context(|| format!("invalid hex byte {:?}", pair))
        })
        .collect()
}
