//! Packed little-endian wire format for the five KV operations (spec §4.8).
//!
//! Every request begins with a single opcode byte (`{0..=4}`), followed by
//! fixed-width fields — no length prefix is needed since each opcode's
//! payload shape is known up front. Every reply is `{status: u8, val: u64}`;
//! `SCAN`'s reply additionally carries a `count: u64` followed by that many
//! `u64` values, per the spec's "value payload pre-agreed separately" note.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// The five RPC request ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Get = 0,
    Put = 1,
    Update = 2,
    Delete = 3,
    Scan = 4,
}

impl Opcode {
    fn from_byte(b: u8) -> io::Result<Self> {
        match b {
            0 => Ok(Opcode::Get),
            1 => Ok(Opcode::Put),
            2 => Ok(Opcode::Update),
            3 => Ok(Opcode::Delete),
            4 => Ok(Opcode::Scan),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown rpc opcode {other}"),
            )),
        }
    }
}

/// A decoded request, carrying only the fields its opcode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Get { key: u64 },
    Put { key: u64, val: u64 },
    Update { key: u64, val: u64 },
    Delete { key: u64 },
    Scan { key: u64, n: u64 },
}

impl Request {
    /// Reads one opcode-prefixed request off `stream`. Returns `Ok(None)` on
    /// a clean EOF before any bytes were read (the connection's normal close
    /// signal); any other read failure, including a partial opcode, is an
    /// `Err`.
    pub async fn read_from<S: AsyncReadExt + Unpin>(stream: &mut S) -> io::Result<Option<Self>> {
        let mut opcode_buf = [0u8; 1];
        let n = stream.read(&mut opcode_buf).await?;
        if n == 0 {
            return Ok(None);
        }
        let opcode = Opcode::from_byte(opcode_buf[0])?;
        let request = match opcode {
            Opcode::Get => Request::Get {
                key: read_u64(stream).await?,
            },
            Opcode::Put => {
                let key = read_u64(stream).await?;
                let val = read_u64(stream).await?;
                Request::Put { key, val }
            }
            Opcode::Update => {
                let key = read_u64(stream).await?;
                let val = read_u64(stream).await?;
                Request::Update { key, val }
            }
            Opcode::Delete => Request::Delete {
                key: read_u64(stream).await?,
            },
            Opcode::Scan => {
                let key = read_u64(stream).await?;
                let n = read_u64(stream).await?;
                Request::Scan { key, n }
            }
        };
        Ok(Some(request))
    }

    /// Encodes this request as the client would send it.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(17);
        match *self {
            Request::Get { key } => {
                out.push(Opcode::Get as u8);
                out.extend_from_slice(&key.to_le_bytes());
            }
            Request::Put { key, val } => {
                out.push(Opcode::Put as u8);
                out.extend_from_slice(&key.to_le_bytes());
                out.extend_from_slice(&val.to_le_bytes());
            }
            Request::Update { key, val } => {
                out.push(Opcode::Update as u8);
                out.extend_from_slice(&key.to_le_bytes());
                out.extend_from_slice(&val.to_le_bytes());
            }
            Request::Delete { key } => {
                out.push(Opcode::Delete as u8);
                out.extend_from_slice(&key.to_le_bytes());
            }
            Request::Scan { key, n } => {
                out.push(Opcode::Scan as u8);
                out.extend_from_slice(&key.to_le_bytes());
                out.extend_from_slice(&n.to_le_bytes());
            }
        }
        out
    }
}

/// `{status: u8, val: u64}`. `status = 1` means present/succeeded; `status =
/// 0` means absent/no-op. `PUT`'s status is always `1`; `DELETE`'s `val` is
/// always `0`. For `SCAN` replies, `val` is unused (always `0`) and the
/// scanned values follow as a separate `count | values` block, written by
/// [`Reply::write_scan_values`] / read by [`Reply::read_scan_values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub status: u8,
    pub val: u64,
}

impl Reply {
    pub fn present(val: u64) -> Self {
        Self { status: 1, val }
    }

    pub fn absent() -> Self {
        Self { status: 0, val: 0 }
    }

    pub fn encode(&self) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[0] = self.status;
        out[1..9].copy_from_slice(&self.val.to_le_bytes());
        out
    }

    pub async fn write_to<S: AsyncWriteExt + Unpin>(&self, stream: &mut S) -> io::Result<()> {
        stream.write_all(&self.encode()).await
    }

    pub async fn read_from<S: AsyncReadExt + Unpin>(stream: &mut S) -> io::Result<Self> {
        let mut buf = [0u8; 9];
        stream.read_exact(&mut buf).await?;
        Ok(Self {
            status: buf[0],
            val: u64::from_le_bytes(buf[1..9].try_into().unwrap()),
        })
    }

    /// Writes a `SCAN` reply's value payload: `count: u64` then that many
    /// little-endian `u64` values.
    pub async fn write_scan_values<S: AsyncWriteExt + Unpin>(
        stream: &mut S,
        values: &[u64],
    ) -> io::Result<()> {
        stream
            .write_all(&(values.len() as u64).to_le_bytes())
            .await?;
        for v in values {
            stream.write_all(&v.to_le_bytes()).await?;
        }
        Ok(())
    }

    pub async fn read_scan_values<S: AsyncReadExt + Unpin>(
        stream: &mut S,
    ) -> io::Result<Vec<u64>> {
        let count = read_u64(stream).await? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(read_u64(stream).await?);
        }
        Ok(out)
    }
}

async fn read_u64<S: AsyncReadExt + Unpin>(stream: &mut S) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf).await?;
    Ok(u64::from_le_bytes(buf))
}
