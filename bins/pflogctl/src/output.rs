//! Text and JSON rendering of delivered records.

use pflog::{CaptureRecord, LogHeader, StatsSnapshot};
use serde::Serialize;

/// Flattened view of one record for JSON output.
#[derive(Debug, Serialize)]
pub struct RecordView {
    /// Logging interface that delivered the record, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pflog: Option<String>,
    pub ifname: String,
    pub family: String,
    pub action: String,
    pub reason: String,
    pub direction: String,
    pub rule: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subrule: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<String>,
    pub length: usize,
}

impl RecordView {
    pub fn new(pflog: Option<String>, record: &CaptureRecord) -> Self {
        let h = &record.header;
        Self {
            pflog,
            ifname: h.ifname(),
            family: h.family().to_string(),
            action: action_name(h),
            reason: reason_name(h),
            direction: direction_name(h),
            rule: h.rule_number,
            subrule: h.has_subrule().then_some(h.subrule_number),
            ruleset: h.has_subrule().then(|| h.ruleset_name()),
            length: record.packet.len(),
        }
    }
}

fn action_name(h: &LogHeader) -> String {
    h.action()
        .map(|a| a.name().to_string())
        .unwrap_or_else(|| format!("action{}", h.action))
}

fn reason_name(h: &LogHeader) -> String {
    h.reason()
        .map(|r| r.name().to_string())
        .unwrap_or_else(|| format!("reason{}", h.reason))
}

fn direction_name(h: &LogHeader) -> String {
    h.direction()
        .map(|d| d.name().to_string())
        .unwrap_or_else(|| format!("dir{}", h.dir))
}

/// One line in the style of a pflog capture reader.
///
/// `pflog0: rule 8.ftp-proxy.3(match): pass out on em0: inet 2 bytes`
pub fn format_text(view: &RecordView) -> String {
    let rule = match (view.subrule, &view.ruleset) {
        (Some(sub), Some(rs)) => format!("{}.{}.{}", view.rule, rs, sub),
        _ => view.rule.to_string(),
    };
    let prefix = view
        .pflog
        .as_deref()
        .map(|p| format!("{}: ", p))
        .unwrap_or_default();
    format!(
        "{}rule {}({}): {} {} on {}: {} {} bytes",
        prefix, rule, view.reason, view.action, view.direction, view.ifname, view.family, view.length
    )
}

/// Print a record in the requested format.
pub fn print_record(view: &RecordView, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(view)?);
    } else {
        println!("{}", format_text(view));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatsView<'a> {
    interface: &'a str,
    #[serde(flatten)]
    stats: &'a StatsSnapshot,
}

/// Print final counters for one interface.
pub fn print_stats(name: &str, stats: &StatsSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        let view = StatsView {
            interface: name,
            stats,
        };
        println!("{}", serde_json::to_string(&view)?);
    } else {
        println!(
            "{}: delivered {} ({} bytes), dropped {}, unobserved {}, discarded {} output {} queued",
            name,
            stats.delivered,
            stats.delivered_bytes,
            stats.consumer_drops,
            stats.unobserved,
            stats.output_discards,
            stats.queue_drops
        );
    }
    Ok(())
}
