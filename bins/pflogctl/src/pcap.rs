//! Minimal pcap file writer for `DLT_PFLOG` captures.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};
use pflog::CaptureRecord;
use pflog::header::DLT_PFLOG;

const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;

/// Writes capture records as a classic little-endian pcap file.
pub struct PcapWriter<W: Write> {
    out: W,
    snaplen: u32,
    records: u64,
}

impl PcapWriter<BufWriter<File>> {
    /// Create `path`, truncating it.
    pub fn create(path: &Path, snaplen: u32) -> anyhow::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), snaplen)
    }
}

impl<W: Write> PcapWriter<W> {
    /// Write the file header and return the writer.
    pub fn new(mut out: W, snaplen: u32) -> anyhow::Result<Self> {
        let mut hdr = BytesMut::with_capacity(24);
        hdr.put_u32_le(PCAP_MAGIC);
        hdr.put_u16_le(PCAP_VERSION_MAJOR);
        hdr.put_u16_le(PCAP_VERSION_MINOR);
        hdr.put_i32_le(0); // thiszone
        hdr.put_u32_le(0); // sigfigs
        hdr.put_u32_le(snaplen);
        hdr.put_u32_le(DLT_PFLOG);
        out.write_all(&hdr)?;
        Ok(Self {
            out,
            snaplen,
            records: 0,
        })
    }

    /// Append one record stamped with the current time.
    pub fn write(&mut self, record: &CaptureRecord) -> anyhow::Result<()> {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?;
        let data = record.to_bytes();
        let caplen = data.len().min(self.snaplen as usize);

        let mut hdr = BytesMut::with_capacity(16);
        hdr.put_u32_le(ts.as_secs() as u32);
        hdr.put_u32_le(ts.subsec_micros());
        hdr.put_u32_le(caplen as u32);
        hdr.put_u32_le(data.len() as u32);
        self.out.write_all(&hdr)?;
        self.out.write_all(&data[..caplen])?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
