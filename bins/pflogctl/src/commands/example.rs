//! Example command - print example configuration and script files.

use clap::{Args, ValueEnum};

#[derive(Args)]
pub struct ExampleArgs {
    /// Which example to print
    #[arg(value_enum, default_value = "script")]
    pub kind: ExampleKind,
}

#[derive(Clone, ValueEnum)]
pub enum ExampleKind {
    /// Module configuration
    Config,
    /// Replay script
    Script,
}

pub fn run(args: ExampleArgs) -> anyhow::Result<()> {
    match args.kind {
        ExampleKind::Config => println!("{}", CONFIG_EXAMPLE),
        ExampleKind::Script => println!("{}", SCRIPT_EXAMPLE),
    }
    Ok(())
}

pub const CONFIG_EXAMPLE: &str = r#"# pflog module configuration
# Every field is optional.

name: pflog
mtu: 33216
max_unit: 32767
max_interfaces: 1024
# pflog0 .. pflog(N-1) are created on load
initial_units: 1
queue_len: 50
"#;

pub const SCRIPT_EXAMPLE: &str = r#"# pflogctl replay script, run with: pflogctl replay --script FILE

steps:
  # pflog0 already exists; bring it up and watch it
  - configure: { unit: 0, request: { set-flags: 1 } }
  - attach: { unit: 0 }

  # A blocked inbound packet matched by rule 3
  - inject:
      packet: "45000014000040004001f96cc0000201c0000202"
      decision:
        interface: em0
        family: inet
        action: drop
        reason: match
        direction: in
        matched_rule: { number: 3 }

  # A pass inside the ftp-proxy anchor
  - inject:
      packet: "aabb"
      decision:
        interface: em1
        family: inet
        action: pass
        reason: match
        direction: out
        matched_rule: { number: 1 }
        anchor_rule: { number: 12 }
        ruleset: { name: ftp-proxy }

  # A second logging interface with nobody listening
  - create: { unit: 1 }
  - inject:
      unit: 1
      packet: "00"
      decision:
        interface: em0
        family: inet6
        action: drop
        reason: short
        direction: in
        matched_rule: { number: 7 }

  # Anything sent out is discarded
  - enqueue: { unit: 0, packet: "deadbeef", count: 3 }
  - drain: { unit: 0 }

  # Errors are reported and the replay continues
  - configure: { unit: 0, request: { set-mtu: 1500 } }
  - destroy: { unit: 1 }
  - destroy: { unit: 1 }
"#;
