//! Records as an external `DLT_PFLOG` decoder sees them.

use pflog::decision::{Action, AddressFamily, Decision, Direction, Reason};
use pflog::header::{PFLOG_HDRLEN, PFLOG_REAL_HDRLEN};
use pflog::{CaptureRecord, Error};

use crate::common::{consumer, drain_records, module_with};

#[test]
fn test_wire_record_layout() {
    let module = module_with(1);
    let control = module.control();
    let (consumer, mut rx) = consumer(4);
    control.attach(0, &consumer).unwrap();

    let decision = Decision::new(
        "vlan100",
        AddressFamily::Inet6,
        Action::Drop,
        Reason::Fragment,
        Direction::In,
    )
    .matched(0x11)
    .anchor(0x22)
    .ruleset("ftp-proxy/1");
    let packet = [0x60, 0, 0, 0, 0, 8, 17, 64];
    control.inject(None, &packet, &decision).unwrap();

    let record = drain_records(&mut rx).remove(0);
    let wire = record.to_bytes();
    assert_eq!(wire.len(), PFLOG_HDRLEN + packet.len());
    assert_eq!(wire[0] as usize, PFLOG_REAL_HDRLEN);
    assert_eq!(wire[1], 28);
    assert_eq!(wire[2], Action::Drop as u8);
    assert_eq!(wire[3], Reason::Fragment as u8);
    assert_eq!(&wire[4..11], b"vlan100");
    assert!(wire[11..20].iter().all(|&b| b == 0));
    assert_eq!(&wire[20..31], b"ftp-proxy/1");
    assert_eq!(&wire[36..40], &[0, 0, 0, 0x22]);
    assert_eq!(&wire[40..44], &[0, 0, 0, 0x11]);
    assert_eq!(wire[44], Direction::In as u8);
    assert_eq!(&wire[PFLOG_HDRLEN..], &packet);

    let decoded = CaptureRecord::parse(&wire).unwrap();
    assert_eq!(decoded, record);
    assert_eq!(decoded.header.family(), AddressFamily::Inet6);
    assert_eq!(decoded.header.reason(), Some(Reason::Fragment));
}

#[test]
fn test_decode_short_record() {
    let err = CaptureRecord::parse(&[45, 2, 0]).unwrap_err();
    assert!(matches!(err, Error::Truncated { expected: 48, .. }));
}
