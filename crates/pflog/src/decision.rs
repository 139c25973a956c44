//! Filter decision records handed to the logging interface.
//!
//! A [`Decision`] describes why the packet filter logged a packet: the
//! verdict, the reason, the direction, and which rule matched. When the
//! match happened inside an anchor, the anchor rule and the ruleset it
//! delegates to are recorded as well.
//!
//! # Example
//!
//! ```
//! use pflog::decision::{Action, AddressFamily, Decision, Direction, Reason};
//!
//! let decision = Decision::new("em0", AddressFamily::Inet, Action::Drop, Reason::Match, Direction::In)
//!     .matched(12)
//!     .anchor(4)
//!     .ruleset("spamd");
//! assert_eq!(decision.matched_rule.map(|r| r.number), Some(12));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Internet protocol family (BSD `sa_family_t` numbering).
pub const AF_INET: u8 = 2;
/// Internet protocol version 6 family.
pub const AF_INET6: u8 = 28;

/// Address family of the logged packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressFamily {
    /// IPv4.
    Inet,
    /// IPv6.
    Inet6,
    /// Any other family, carried verbatim.
    Other(u8),
}

impl AddressFamily {
    /// Wire value.
    pub fn number(self) -> u8 {
        match self {
            Self::Inet => AF_INET,
            Self::Inet6 => AF_INET6,
            Self::Other(n) => n,
        }
    }

    /// Decode a wire value.
    pub fn from_number(n: u8) -> Self {
        match n {
            AF_INET => Self::Inet,
            AF_INET6 => Self::Inet6,
            n => Self::Other(n),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet => write!(f, "inet"),
            Self::Inet6 => write!(f, "inet6"),
            Self::Other(n) => write!(f, "af{}", n),
        }
    }
}

/// Filter verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Action {
    Pass = 0,
    Drop = 1,
    Scrub = 2,
    Nat = 3,
    NoNat = 4,
    Binat = 5,
    NoBinat = 6,
    Rdr = 7,
    NoRdr = 8,
    SynproxyDrop = 9,
}

impl Action {
    /// Decode a wire value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Pass,
            1 => Self::Drop,
            2 => Self::Scrub,
            3 => Self::Nat,
            4 => Self::NoNat,
            5 => Self::Binat,
            6 => Self::NoBinat,
            7 => Self::Rdr,
            8 => Self::NoRdr,
            9 => Self::SynproxyDrop,
            _ => return None,
        })
    }

    /// Name as printed by pf tooling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Drop => "block",
            Self::Scrub => "scrub",
            Self::Nat => "nat",
            Self::NoNat => "nat",
            Self::Binat => "binat",
            Self::NoBinat => "binat",
            Self::Rdr => "rdr",
            Self::NoRdr => "rdr",
            Self::SynproxyDrop => "synproxy-drop",
        }
    }
}

/// Why the verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Reason {
    Match = 0,
    BadOffset = 1,
    Fragment = 2,
    Short = 3,
    Normalize = 4,
    Memory = 5,
}

impl Reason {
    /// Decode a wire value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Match,
            1 => Self::BadOffset,
            2 => Self::Fragment,
            3 => Self::Short,
            4 => Self::Normalize,
            5 => Self::Memory,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::BadOffset => "bad-offset",
            Self::Fragment => "fragment",
            Self::Short => "short",
            Self::Normalize => "normalize",
            Self::Memory => "memory",
        }
    }
}

/// Packet direction relative to the logged-from interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Direction {
    InOut = 0,
    In = 1,
    Out = 2,
}

impl Direction {
    /// Decode a wire value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::InOut,
            1 => Self::In,
            2 => Self::Out,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::InOut => "in/out",
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// A filter rule, identified by its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub number: u32,
}

/// A named sub-ruleset reached through an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    pub name: String,
}

/// The packet filter's verdict for one logged packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Name of the interface the packet was seen on.
    pub interface: String,
    pub family: AddressFamily,
    pub action: Action,
    pub reason: Reason,
    pub direction: Direction,
    /// Rule that produced the verdict. Required for injection.
    #[serde(default)]
    pub matched_rule: Option<Rule>,
    /// Anchor rule through which `matched_rule` was reached.
    #[serde(default)]
    pub anchor_rule: Option<Rule>,
    /// Ruleset owning `matched_rule` when an anchor was involved.
    #[serde(default)]
    pub ruleset: Option<Ruleset>,
}

impl Decision {
    /// Create a decision with no rule information yet.
    pub fn new(
        interface: impl Into<String>,
        family: AddressFamily,
        action: Action,
        reason: Reason,
        direction: Direction,
    ) -> Self {
        Self {
            interface: interface.into(),
            family,
            action,
            reason,
            direction,
            matched_rule: None,
            anchor_rule: None,
            ruleset: None,
        }
    }

    /// Set the matched rule number.
    pub fn matched(mut self, number: u32) -> Self {
        self.matched_rule = Some(Rule { number });
        self
    }

    /// Set the anchor rule number.
    pub fn anchor(mut self, number: u32) -> Self {
        self.anchor_rule = Some(Rule { number });
        self
    }

    /// Set the ruleset name.
    pub fn ruleset(mut self, name: impl Into<String>) -> Self {
        self.ruleset = Some(Ruleset { name: name.into() });
        self
    }
}
