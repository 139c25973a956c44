//! Parallel injection, and injection alongside control-plane work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc as std_mpsc};
use std::thread;
use std::time::{Duration, Instant};

use pflog::{Control, ControlRequest, Delivery, Error, IfFlags};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::common::{consumer, drain_records, module_with, pass_out};

#[test]
fn test_parallel_inject_same_interface() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(10_000);
    control.attach(0, &consumer).unwrap();

    let threads: Vec<_> = (0..8u32)
        .map(|t| {
            let control = control.clone();
            thread::spawn(move || {
                for i in 0..500u32 {
                    let packet = (t * 1000 + i).to_be_bytes();
                    let delivery = control.inject(Some(0), &packet, &pass_out(t)).unwrap();
                    assert_eq!(delivery, Delivery::Delivered);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(drain_records(&mut rx).len(), 4000);
    assert_eq!(control.stats(0).unwrap().delivered, 4000);
}

#[test]
fn test_full_consumer_never_blocks() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(10);
    control.attach(0, &consumer).unwrap();

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let control = control.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    control.inject(None, &[1], &pass_out(1)).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let stats = control.stats(0).unwrap();
    assert_eq!(stats.delivered, 10);
    assert_eq!(stats.consumer_drops, 390);
    assert_eq!(drain_records(&mut rx).len(), 10);
}

#[test]
fn test_inject_races_destroy() {
    let module = module_with(2);
    let control = module.control();
    let stop = Arc::new(AtomicBool::new(false));

    let injectors: Vec<_> = (0..4)
        .map(|_| {
            let control = control.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut other_ok = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    match control.inject(Some(0), &[1], &pass_out(1)) {
                        Ok(_) | Err(Error::NotFound { unit: 0 }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                    control.inject(Some(1), &[1], &pass_out(1)).unwrap();
                    other_ok += 1;
                }
                other_ok
            })
        })
        .collect();

    for _ in 0..200 {
        control.destroy(0).unwrap();
        control.create(Some(0)).unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    for t in injectors {
        t.join().unwrap();
    }
    assert_eq!(control.list().len(), 2);
}

/// Layer that reports each event and then stalls the logging thread.
struct StallingLayer {
    started: std_mpsc::Sender<()>,
    stall: Duration,
}

impl<S: Subscriber> Layer<S> for StallingLayer {
    fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
        let _ = self.started.send(());
        thread::sleep(self.stall);
    }
}

/// Run `op` on a thread whose subscriber stalls on every event, and time an
/// injection into unit 0 while that thread is stuck logging.
fn inject_while_logging<F>(control: &Control, op: F) -> Duration
where
    F: FnOnce(&Control) + Send + 'static,
{
    let (started, logging) = std_mpsc::channel();
    let subscriber = tracing_subscriber::registry().with(StallingLayer {
        started,
        stall: Duration::from_millis(300),
    });

    let worker = {
        let control = control.clone();
        thread::spawn(move || tracing::subscriber::with_default(subscriber, || op(&control)))
    };
    logging
        .recv_timeout(Duration::from_secs(5))
        .expect("control operation logged");

    let start = Instant::now();
    control.inject(Some(0), &[1], &pass_out(1)).unwrap();
    let elapsed = start.elapsed();

    worker.join().unwrap();
    elapsed
}

#[test]
fn test_control_plane_does_not_block_inject() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(16);
    control.attach(0, &consumer).unwrap();

    let waited = inject_while_logging(&control, |c| {
        c.create(Some(1)).unwrap();
    });
    assert!(waited < Duration::from_millis(100), "inject waited {waited:?} on create");

    let waited = inject_while_logging(&control, |c| {
        c.configure(1, ControlRequest::SetFlags(IfFlags::UP)).unwrap();
    });
    assert!(waited < Duration::from_millis(100), "inject waited {waited:?} on configure");

    let waited = inject_while_logging(&control, |c| {
        c.destroy(1).unwrap();
    });
    assert!(waited < Duration::from_millis(100), "inject waited {waited:?} on destroy");

    assert_eq!(drain_records(&mut rx).len(), 3);
    assert_eq!(control.list().len(), 1);
}
