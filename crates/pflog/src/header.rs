//! pflog header codec (`DLT_PFLOG`).
//!
//! Every record handed to a capture consumer starts with a fixed 48-byte
//! header describing the filter decision, followed by the raw packet:
//!
//! ```text
//!  0      1      2      3      4                  20                 36
//! +------+------+------+------+------------------+------------------+
//! |length|  af  |action|reason|  ifname (16)     |  ruleset (16)    |
//! +------+------+------+------+------------------+------------------+
//! 36            40            44     45
//! +-------------+-------------+------+--------------------+
//! | rulenr (BE) |subrulenr(BE)| dir  |  pad (3)           |
//! +-------------+-------------+------+--------------------+
//! ```
//!
//! `length` holds the unpadded size (45); decoders find the payload at
//! `length` rounded up to a 4-byte boundary.

use zerocopy::byteorder::network_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::decision::{Action, AddressFamily, Decision, Direction, Reason};
use crate::error::{Error, Result};

/// Width of the interface name field.
pub const IFNAMSIZ: usize = 16;

/// Width of the ruleset name field.
pub const PF_RULESET_NAME_SIZE: usize = 16;

/// Header size without trailing padding; the value of the `length` field.
pub const PFLOG_REAL_HDRLEN: usize = 45;

/// Header size on the tap, padded to a 4-byte boundary.
pub const PFLOG_HDRLEN: usize = std::mem::size_of::<PflogHdr>();

/// `subrule_number` value meaning "no anchor involved".
pub const NO_SUBRULE: u32 = u32::MAX;

/// Link type of pflog captures.
pub const DLT_PFLOG: u32 = 117;

/// Round a header length up to the alignment used on the tap.
#[inline]
pub const fn pflog_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Wire layout of the pflog header (mirrors struct pfloghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct PflogHdr {
    length: u8,
    af: u8,
    action: u8,
    reason: u8,
    ifname: [u8; IFNAMSIZ],
    ruleset: [u8; PF_RULESET_NAME_SIZE],
    rulenr: U32,
    subrulenr: U32,
    dir: u8,
    pad: [u8; 3],
}

/// Decoded pflog header.
///
/// Numeric fields are kept as raw wire values so that unknown verdicts or
/// families survive a decode/encode cycle; the typed accessors interpret
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeader {
    pub length: u8,
    pub af: u8,
    pub action: u8,
    pub reason: u8,
    pub ifname: [u8; IFNAMSIZ],
    pub ruleset: [u8; PF_RULESET_NAME_SIZE],
    pub rule_number: u32,
    pub subrule_number: u32,
    pub dir: u8,
}

impl LogHeader {
    /// Build the header for one logged packet.
    ///
    /// Without an anchor the matched rule is reported as the rule number and
    /// the sub-rule fields carry the "none" markers. With an anchor the anchor
    /// is the rule number, the matched rule becomes the sub-rule, and the
    /// ruleset name is copied when known.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        ifname: &str,
        af: AddressFamily,
        action: Action,
        reason: Reason,
        dir: Direction,
        matched_rule: u32,
        anchor_rule: Option<u32>,
        ruleset: Option<&str>,
    ) -> Self {
        let (rule_number, subrule_number, ruleset) = match anchor_rule {
            None => (matched_rule, NO_SUBRULE, [0u8; PF_RULESET_NAME_SIZE]),
            Some(anchor) => (
                anchor,
                matched_rule,
                ruleset
                    .map(fixed_field::<PF_RULESET_NAME_SIZE>)
                    .unwrap_or_default(),
            ),
        };

        Self {
            length: PFLOG_REAL_HDRLEN as u8,
            af: af.number(),
            action: action as u8,
            reason: reason as u8,
            ifname: fixed_field::<IFNAMSIZ>(ifname),
            ruleset,
            rule_number,
            subrule_number,
            dir: dir as u8,
        }
    }

    /// Build the header for a decision record.
    ///
    /// Returns `None` if the decision has no matched rule.
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        let matched = decision.matched_rule?;
        Some(Self::build(
            &decision.interface,
            decision.family,
            decision.action,
            decision.reason,
            decision.direction,
            matched.number,
            decision.anchor_rule.map(|r| r.number),
            decision.ruleset.as_ref().map(|r| r.name.as_str()),
        ))
    }

    /// Serialize to the 48-byte wire form.
    pub fn to_bytes(&self) -> [u8; PFLOG_HDRLEN] {
        let hdr = PflogHdr {
            length: self.length,
            af: self.af,
            action: self.action,
            reason: self.reason,
            ifname: self.ifname,
            ruleset: self.ruleset,
            rulenr: U32::new(self.rule_number),
            subrulenr: U32::new(self.subrule_number),
            dir: self.dir,
            pad: [0; 3],
        };
        let mut out = [0u8; PFLOG_HDRLEN];
        out.copy_from_slice(hdr.as_bytes());
        out
    }

    /// Parse a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (hdr, _) = PflogHdr::ref_from_prefix(data).map_err(|_| Error::Truncated {
            expected: PFLOG_HDRLEN,
            actual: data.len(),
        })?;

        if (hdr.length as usize) < PFLOG_REAL_HDRLEN {
            return Err(Error::InvalidHeader(format!(
                "length field {} below minimum {}",
                hdr.length, PFLOG_REAL_HDRLEN
            )));
        }

        Ok(Self {
            length: hdr.length,
            af: hdr.af,
            action: hdr.action,
            reason: hdr.reason,
            ifname: hdr.ifname,
            ruleset: hdr.ruleset,
            rule_number: hdr.rulenr.get(),
            subrule_number: hdr.subrulenr.get(),
            dir: hdr.dir,
        })
    }

    /// Offset of the packet within a record carrying this header.
    pub fn payload_offset(&self) -> usize {
        pflog_align(self.length as usize)
    }

    /// Whether an anchor rule was involved.
    pub fn has_subrule(&self) -> bool {
        self.subrule_number != NO_SUBRULE
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::from_number(self.af)
    }

    pub fn action(&self) -> Option<Action> {
        Action::from_u8(self.action)
    }

    pub fn reason(&self) -> Option<Reason> {
        Reason::from_u8(self.reason)
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_u8(self.dir)
    }

    /// Logged-from interface name, up to the first NUL.
    pub fn ifname(&self) -> String {
        field_str(&self.ifname)
    }

    /// Ruleset name, empty when no anchor was involved.
    pub fn ruleset_name(&self) -> String {
        field_str(&self.ruleset)
    }
}

/// Copy a name into a fixed field, truncating and zero padding.
fn fixed_field<const N: usize>(name: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = name.as_bytes();
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

fn field_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
