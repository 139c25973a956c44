//! Decode command - show the fields of one pflog record.

use clap::Args;
use pflog::CaptureRecord;

use crate::output::{RecordView, print_record};
use crate::script::parse_hex;

#[derive(Args)]
pub struct DecodeArgs {
    /// Record bytes as hex (header followed by packet).
    pub hex: String,

    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let bytes = parse_hex(&args.hex)?;
    let record = CaptureRecord::parse(&bytes)?;
    print_record(&RecordView::new(None, &record), args.json)
}
