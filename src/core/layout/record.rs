//! GDSII stream records.
//!
//! Every record is `[u16 length][u8 record type][u8 data type][payload]`,
//! big-endian, where the length includes the 4-byte header. Records are kept
//! verbatim so a stream can be written back byte-for-byte.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use crate::error::{Error, Result};

#[allow(dead_code)]
pub mod record_type {
    pub const HEADER: u8 = 0x00;
    pub const BGNLIB: u8 = 0x01;
    pub const LIBNAME: u8 = 0x02;
    pub const UNITS: u8 = 0x03;
    pub const ENDLIB: u8 = 0x04;
    pub const BGNSTR: u8 = 0x05;
    pub const STRNAME: u8 = 0x06;
    pub const ENDSTR: u8 = 0x07;
    pub const BOUNDARY: u8 = 0x08;
    pub const PATH: u8 = 0x09;
    pub const SREF: u8 = 0x0A;
    pub const AREF: u8 = 0x0B;
    pub const TEXT: u8 = 0x0C;
    pub const LAYER: u8 = 0x0D;
    pub const DATATYPE: u8 = 0x0E;
    pub const WIDTH: u8 = 0x0F;
    pub const XY: u8 = 0x10;
    pub const ENDEL: u8 = 0x11;
    pub const SNAME: u8 = 0x12;
    pub const COLROW: u8 = 0x13;
    pub const NODE: u8 = 0x15;
    pub const TEXTTYPE: u8 = 0x16;
    pub const STRING: u8 = 0x19;
    pub const STRANS: u8 = 0x1A;
    pub const BOX: u8 = 0x2D;
    pub const BOXTYPE: u8 = 0x2E;
}

#[allow(dead_code)]
pub mod data_type {
    pub const NO_DATA: u8 = 0x00;
    pub const BIT_ARRAY: u8 = 0x01;
    pub const INT16: u8 = 0x02;
    pub const INT32: u8 = 0x03;
    pub const REAL8: u8 = 0x05;
    pub const ASCII: u8 = 0x06;
}

/// Largest payload a record can carry: the length field is a u16 and must stay even.
pub const MAX_PAYLOAD: usize = 0xFFFE - 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub rtype: u8,
    pub dtype: u8,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(rtype: u8, dtype: u8, data: Vec<u8>) -> Self {
        Self { rtype, dtype, data }
    }

    /// ASCII record, NUL-padded to an even length.
    pub fn ascii(rtype: u8, value: &str) -> Self {
        Self::new(rtype, data_type::ASCII, encode_ascii(value))
    }

    /// Payload as a string with the trailing NUL padding removed.
    pub fn as_ascii(&self) -> String {
        let end = self
            .data
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.data.len()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<BigEndian>(self.encoded_len() as u16)?;
        w.write_u8(self.rtype)?;
        w.write_u8(self.dtype)?;
        w.write_all(&self.data)
    }
}

pub fn encode_ascii(value: &str) -> Vec<u8> {
    let mut data = value.as_bytes().to_vec();
    if data.len() % 2 == 1 {
        data.push(0);
    }
    data
}

/// A parsed stream: every record up to and including ENDLIB, plus whatever
/// bytes follow it (tape-block padding in most files).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    pub records: Vec<Record>,
    pub trailer: Vec<u8>,
}

impl Stream {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.records.iter().map(Record::encoded_len).sum::<usize>() + self.trailer.len(),
        );
        for record in &self.records {
            // Writing into a Vec cannot fail.
            let _ = record.write_to(&mut out);
        }
        out.extend_from_slice(&self.trailer);
        out
    }
}

pub fn read_stream(bytes: &[u8]) -> Result<Stream> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();

    loop {
        let offset = cursor.position();
        if offset as usize >= bytes.len() {
            return Err(Error::layout_invalid("stream ends before ENDLIB"));
        }

        let length = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| truncated(offset))? as usize;
        if length < 4 {
            return Err(Error::layout_invalid(format!(
                "record at offset {} has length {}",
                offset, length
            )));
        }
        if length % 2 == 1 {
            return Err(Error::layout_invalid(format!(
                "record at offset {} has odd length {}",
                offset, length
            )));
        }

        let rtype = cursor.read_u8().map_err(|_| truncated(offset))?;
        let dtype = cursor.read_u8().map_err(|_| truncated(offset))?;
        let mut data = vec![0u8; length - 4];
        cursor.read_exact(&mut data).map_err(|_| truncated(offset))?;

        records.push(Record { rtype, dtype, data });

        if rtype == record_type::ENDLIB {
            break;
        }
    }

    let rest = cursor.position() as usize;
    Ok(Stream {
        records,
        trailer: bytes[rest..].to_vec(),
    })
}

fn truncated(offset: u64) -> Error {
    Error::layout_invalid(format!("record at offset {} is truncated", offset))
}
