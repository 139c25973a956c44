//! Capture consumers: where logged records go.
//!
//! A logging interface never owns its consumer. It holds a [`Weak`]
//! reference set by [`PseudoInterface::attach`](crate::PseudoInterface::attach)
//! and forwards each record through [`CaptureConsumer::deliver`], which must
//! not block: a consumer that cannot take a record right now reports
//! [`DeliveryError::Full`] and the record is counted as dropped.
//!
//! [`Weak`]: std::sync::Weak

use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::header::{LogHeader, PFLOG_HDRLEN};

/// Why a consumer refused a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// No room for the record right now.
    #[error("consumer buffer full")]
    Full,
    /// The consumer has shut down.
    #[error("consumer closed")]
    Closed,
}

/// Receiver of header + packet records.
pub trait CaptureConsumer: Send + Sync {
    /// Accept one record without blocking.
    fn deliver(&self, header: &LogHeader, packet: &[u8]) -> std::result::Result<(), DeliveryError>;
}

/// One logged packet as seen by a capture consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub header: LogHeader,
    pub packet: Bytes,
}

impl CaptureRecord {
    /// Total wire length: padded header plus packet.
    pub fn wire_len(&self) -> usize {
        PFLOG_HDRLEN + self.packet.len()
    }

    /// Serialize as header immediately followed by the packet.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_slice(&self.header.to_bytes());
        buf.put_slice(&self.packet);
        buf.freeze()
    }

    /// Split a wire record into header and packet.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = LogHeader::parse(data)?;
        let offset = header.payload_offset();
        if data.len() < offset {
            return Err(Error::Truncated {
                expected: offset,
                actual: data.len(),
            });
        }
        Ok(Self {
            header,
            packet: Bytes::copy_from_slice(&data[offset..]),
        })
    }
}

/// Consumer backed by a bounded channel.
///
/// Delivery uses `try_send`, so a slow reader causes drops rather than
/// stalling the packet filter.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<CaptureRecord>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiving half of its channel.
    ///
    /// `capacity` must be non-zero.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CaptureRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl CaptureConsumer for ChannelConsumer {
    fn deliver(&self, header: &LogHeader, packet: &[u8]) -> std::result::Result<(), DeliveryError> {
        let record = CaptureRecord {
            header: *header,
            packet: Bytes::copy_from_slice(packet),
        };
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
