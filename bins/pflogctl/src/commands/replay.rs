//! Replay command - apply a script of events to a loaded module.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use bytes::Bytes;
use clap::Args;
use pflog::{
    CaptureConsumer, CaptureRecord, Control, DeliveryError, LogHeader, PflogConfig, PflogModule,
};
use tokio::sync::mpsc;

use crate::output::{RecordView, print_record, print_stats};
use crate::pcap::PcapWriter;
use crate::script::{self, Script, Step, parse_hex};

#[derive(Args)]
pub struct ReplayArgs {
    /// Script of events (YAML, or JSON by extension).
    #[arg(short, long)]
    pub script: PathBuf,

    /// Module configuration; defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output JSON lines.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Also write delivered records to a pcap file.
    #[arg(short = 'w', long, value_name = "FILE")]
    pub pcap: Option<PathBuf>,

    /// Records buffered between interfaces and the printer before dropping.
    #[arg(long, default_value_t = 1024)]
    pub buffer: usize,

    /// Stop at the first failing step and exit non-zero.
    #[arg(long)]
    pub strict: bool,
}

/// Consumer that tags each record with the delivering interface.
struct TaggedConsumer {
    pflog: String,
    tx: mpsc::Sender<(String, CaptureRecord)>,
}

impl CaptureConsumer for TaggedConsumer {
    fn deliver(&self, header: &LogHeader, packet: &[u8]) -> Result<(), DeliveryError> {
        let record = CaptureRecord {
            header: *header,
            packet: Bytes::copy_from_slice(packet),
        };
        self.tx
            .try_send((self.pflog.clone(), record))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }
}

/// Consumers owned by the tool; interfaces only hold weak references.
struct Consumers {
    tx: mpsc::Sender<(String, CaptureRecord)>,
    attached: HashMap<u32, Arc<dyn CaptureConsumer>>,
}

impl Consumers {
    fn attach(&mut self, control: &Control, unit: u32) -> pflog::Result<()> {
        let pflog = control.registry().get(unit)?.name().to_string();
        let consumer: Arc<dyn CaptureConsumer> = Arc::new(TaggedConsumer {
            pflog,
            tx: self.tx.clone(),
        });
        control.attach(unit, &consumer)?;
        self.attached.insert(unit, consumer);
        Ok(())
    }

    fn release(&mut self, unit: u32) {
        self.attached.remove(&unit);
    }
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let config: PflogConfig = match &args.config {
        Some(path) => script::load(path)?,
        None => PflogConfig::default(),
    };
    let script: Script = script::load(&args.script)?;

    let module = PflogModule::load(config).context("loading pflog module")?;
    let control = module.control();

    let (tx, mut rx) = mpsc::channel::<(String, CaptureRecord)>(args.buffer.max(1));
    let mut pcap = match &args.pcap {
        Some(path) => Some(
            PcapWriter::create(path, module.registry().config().mtu)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => None,
    };
    let json = args.json;

    let printer = tokio::spawn(async move {
        while let Some((pflog, record)) = rx.recv().await {
            print_record(&RecordView::new(Some(pflog), &record), json)?;
            if let Some(writer) = pcap.as_mut() {
                writer.write(&record)?;
            }
        }
        if let Some(writer) = pcap {
            let records = writer.records();
            writer.finish()?;
            tracing::info!(records, "pcap written");
        }
        anyhow::Ok(())
    });

    let mut consumers = Consumers {
        tx,
        attached: HashMap::new(),
    };

    let mut failed = 0usize;
    for (i, step) in script.steps.iter().enumerate() {
        if let Err(e) = apply(&control, &mut consumers, step) {
            failed += 1;
            let kind = e
                .downcast_ref::<pflog::Error>()
                .map(pflog::Error::kind)
                .unwrap_or("Script");
            eprintln!("step {} ({}): {}: {:#}", i + 1, step.name(), kind, e);
            if args.strict {
                break;
            }
        }
    }

    let stats: Vec<_> = control
        .list()
        .into_iter()
        .filter_map(|id| control.stats(id.unit).ok().map(|s| (id.name, s)))
        .collect();

    // Closing every sender lets the printer finish.
    drop(consumers);
    let destroyed = module.unload();
    tracing::debug!(destroyed, "module unloaded");
    printer.await.context("printer task")??;

    for (name, snapshot) in &stats {
        print_stats(name, snapshot, json)?;
    }

    if failed > 0 && args.strict {
        bail!("{} step(s) failed", failed);
    }
    Ok(())
}

fn apply(control: &Control, consumers: &mut Consumers, step: &Step) -> anyhow::Result<()> {
    match step {
        Step::Create { unit } => {
            let id = control.create(*unit)?;
            tracing::debug!(interface = %id, "step created");
        }
        Step::Destroy { unit } => {
            control.destroy(*unit)?;
            consumers.release(*unit);
        }
        Step::Configure { unit, request } => control.configure(*unit, *request)?,
        Step::Attach { unit } => consumers.attach(control, *unit)?,
        Step::Detach { unit } => {
            control.detach(*unit)?;
            consumers.release(*unit);
        }
        Step::Inject {
            unit,
            packet,
            decision,
        } => {
            let packet = parse_hex(packet)?;
            let delivery = control.inject(*unit, &packet, decision)?;
            tracing::debug!(?delivery, "step injected");
        }
        Step::Enqueue { unit, packet, count } => {
            let packet = Bytes::from(parse_hex(packet)?);
            for _ in 0..*count {
                control.enqueue(*unit, packet.clone())?;
            }
        }
        Step::Drain { unit } => {
            let discarded = control.drain(*unit)?;
            tracing::debug!(unit, discarded, "step drained");
        }
    }
    Ok(())
}
