//! End-to-end flows through the control surface.

use bytes::Bytes;
use pflog::header::{NO_SUBRULE, PF_RULESET_NAME_SIZE};
use pflog::interface::PFLOG_MTU;
use pflog::{ControlRequest, Delivery, Error, IfFlags, RouteEntry, RouteRequest};

use crate::common::{consumer, drain_records, module_with, pass_out};

#[tokio::test]
async fn test_inject_single_record() {
    let module = module_with(0);
    let control = module.control();
    let id = control.create(Some(0)).unwrap();
    assert_eq!(id.name, "pflog0");

    let (consumer, mut rx) = consumer(16);
    control.attach(0, &consumer).unwrap();

    let delivery = control.inject(Some(0), &[0xaa, 0xbb], &pass_out(3)).unwrap();
    assert_eq!(delivery, Delivery::Delivered);

    let record = rx.recv().await.unwrap();
    assert_eq!(record.header.rule_number, 3);
    assert_eq!(record.header.subrule_number, NO_SUBRULE);
    assert_eq!(record.header.ruleset, [0u8; PF_RULESET_NAME_SIZE]);
    assert_eq!(record.header.ifname(), "em0");
    assert_eq!(&record.packet[..], &[0xaa, 0xbb]);
}

#[test]
fn test_default_moves_after_destroy() {
    let module = module_with(0);
    let control = module.control();
    control.create(Some(0)).unwrap();
    control.create(Some(1)).unwrap();

    let (c0, mut rx0) = consumer(16);
    let (c1, mut rx1) = consumer(16);
    control.attach(0, &c0).unwrap();
    control.attach(1, &c1).unwrap();

    control.destroy(0).unwrap();
    assert_eq!(control.registry().pick_default().unwrap().unit(), 1);

    control.inject(None, &[1, 2, 3], &pass_out(5)).unwrap();
    assert!(drain_records(&mut rx0).is_empty());
    let records = drain_records(&mut rx1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].header.rule_number, 5);
}

#[test]
fn test_inject_destroyed_unit() {
    let module = module_with(1);
    let control = module.control();
    control.destroy(0).unwrap();

    let err = control.inject(Some(0), &[1], &pass_out(1)).unwrap_err();
    assert!(matches!(err, Error::NotFound { unit: 0 }));

    let err = control.inject(None, &[1], &pass_out(1)).unwrap_err();
    assert!(matches!(err, Error::NoDefaultInterface));
}

#[test]
fn test_inject_without_consumer_produces_nothing() {
    let module = module_with(1);
    let control = module.control();
    let delivery = control.inject(Some(0), &[9], &pass_out(1)).unwrap();
    assert_eq!(delivery, Delivery::NoConsumer);
    assert_eq!(control.stats(0).unwrap().unobserved, 1);
    assert_eq!(control.stats(0).unwrap().delivered, 0);
}

#[test]
fn test_anchor_without_ruleset_zeroes_name() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(4);
    control.attach(0, &consumer).unwrap();

    control
        .inject(Some(0), &[1], &pass_out(3).anchor(11))
        .unwrap();
    control
        .inject(Some(0), &[1], &pass_out(3).anchor(11).ruleset("relayd"))
        .unwrap();

    let records = drain_records(&mut rx);
    assert_eq!(records[0].header.rule_number, 11);
    assert_eq!(records[0].header.subrule_number, 3);
    assert_eq!(records[0].header.ruleset, [0u8; PF_RULESET_NAME_SIZE]);
    assert_eq!(records[1].header.ruleset_name(), "relayd");
}

#[test]
fn test_set_flags_for_every_instance() {
    let module = module_with(3);
    let control = module.control();
    for id in control.list() {
        control
            .configure(id.unit, ControlRequest::SetFlags(IfFlags::UP))
            .unwrap();
        let ifp = control.registry().get(id.unit).unwrap();
        assert!(ifp.is_running());

        control
            .configure(id.unit, ControlRequest::SetFlags(IfFlags::empty()))
            .unwrap();
        assert!(!ifp.is_running());
        assert!(!ifp.is_up());
    }
}

#[test]
fn test_unsupported_configure_is_reported() {
    let module = module_with(1);
    let control = module.control();
    let err = control
        .configure(0, ControlRequest::Other(0x8020_6910))
        .unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
}

#[test]
fn test_drain_never_reaches_consumer() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(16);
    control.attach(0, &consumer).unwrap();

    for _ in 0..7 {
        assert!(control.enqueue(0, Bytes::from_static(b"out")).unwrap());
    }
    assert_eq!(control.drain(0).unwrap(), 7);
    assert_eq!(control.stats(0).unwrap().queue_drops, 7);

    control.output(0, Bytes::from_static(b"out")).unwrap();
    assert_eq!(control.stats(0).unwrap().output_discards, 1);
    assert!(drain_records(&mut rx).is_empty());
}

#[test]
fn test_route_hint_through_control() {
    let module = module_with(1);
    let control = module.control();
    let mut route = RouteEntry::new("2001:db8::".parse().unwrap(), 32);
    control
        .route_mtu_hint(0, RouteRequest::Change, Some(&mut route))
        .unwrap();
    assert_eq!(route.mtu, Some(PFLOG_MTU));
}

#[test]
fn test_destroy_detaches_consumer() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, _rx) = consumer(4);
    control.attach(0, &consumer).unwrap();
    let ifp = control.registry().get(0).unwrap();
    assert!(ifp.has_consumer());

    control.destroy(0).unwrap();
    assert!(!ifp.has_consumer());
    assert!(ifp.inject(&[1], &pass_out(1)).unwrap_err().is_not_found());
}

#[test]
fn test_unload_destroys_everything() {
    let module = module_with(4);
    let control = module.control();
    assert_eq!(module.unload(), 4);
    assert!(control.list().is_empty());
    assert!(control.create(None).is_ok());
}
