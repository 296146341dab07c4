// Binary layout: header and footer parsing, whole-buffer validation.
//
// A serialized index is
//
//   header (16 bytes) | node region | footer (24 bytes)
//
// header:  cookie1 u32 LE | cookie2 u32 LE | version u32 LE | reserved u32
// footer:  root address u64 LE | key count u64 LE | cookie1 u32 LE | reserved u32
//
// Validation is eager: `validate` walks the entire node region once, checking
// every node record and every transition target, so a corrupted or foreign
// buffer is rejected before any traversal is attempted.

use std::io;

use hashbrown::HashSet;

use crate::node;

/// Header magic constants (little-endian).
const COOKIE1: u32 = 0x0015_F7A2;
const COOKIE2: u32 = 0x0042_9D1B;

/// Supported format version.
pub const VERSION: u32 = 1;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of the binary footer in bytes.
pub const FOOTER_SIZE: usize = 24;

/// Error type for open-time format validation.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid magic number in index header")]
    InvalidMagic,
    #[error("unsupported format version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u32, actual: u32 },
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("footer magic mismatch")]
    InvalidFooter,
    #[error("truncated node record at offset {offset}")]
    TruncatedNode { offset: usize },
    #[error("malformed node record at offset {offset}: {reason}")]
    MalformedNode { offset: usize, reason: &'static str },
    #[error("root address {addr} does not point at a node")]
    BadRootAddress { addr: usize },
}

/// Values recovered from a validated buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub root_addr: usize,
    pub key_count: u64,
}

/// Write the fixed header. The builder calls this before the first node.
pub fn write_header(wtr: &mut impl io::Write) -> io::Result<()> {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(&COOKIE1.to_le_bytes());
    buf[4..8].copy_from_slice(&COOKIE2.to_le_bytes());
    buf[8..12].copy_from_slice(&VERSION.to_le_bytes());
    wtr.write_all(&buf)
}

/// Write the footer sealing a finished index.
pub fn write_footer(wtr: &mut impl io::Write, root_addr: usize, key_count: u64) -> io::Result<()> {
    let mut buf = [0u8; FOOTER_SIZE];
    buf[0..8].copy_from_slice(&(root_addr as u64).to_le_bytes());
    buf[8..16].copy_from_slice(&key_count.to_le_bytes());
    buf[16..20].copy_from_slice(&COOKIE1.to_le_bytes());
    wtr.write_all(&buf)
}

/// Validate an entire serialized index and return its metadata.
///
/// Checks the header cookies and version, the footer magic, then decodes
/// every node record in order. Transition targets must point at node
/// boundaries seen earlier in the region, and the root address must be a
/// node boundary itself.
pub fn validate(data: &[u8]) -> Result<Meta, FormatError> {
    let min = HEADER_SIZE + FOOTER_SIZE;
    if data.len() < min {
        return Err(FormatError::TooShort { expected: min, actual: data.len() });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FormatError::InvalidMagic);
    }
    let version = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion { expected: VERSION, actual: version });
    }

    let footer = &data[data.len() - FOOTER_SIZE..];
    let root_addr = u64::from_le_bytes([
        footer[0], footer[1], footer[2], footer[3], footer[4], footer[5], footer[6], footer[7],
    ]) as usize;
    let key_count = u64::from_le_bytes([
        footer[8], footer[9], footer[10], footer[11], footer[12], footer[13], footer[14],
        footer[15],
    ]);
    let footer_cookie = u32::from_le_bytes([footer[16], footer[17], footer[18], footer[19]]);
    if footer_cookie != COOKIE1 {
        return Err(FormatError::InvalidFooter);
    }

    let region_end = data.len() - FOOTER_SIZE;
    let mut starts = HashSet::new();
    let mut pos = HEADER_SIZE;
    while pos < region_end {
        let end = node::check_node(data, pos, region_end, &starts)?;
        starts.insert(pos);
        pos = end;
    }
    if !starts.contains(&root_addr) {
        return Err(FormatError::BadRootAddress { addr: root_addr });
    }
    Ok(Meta { root_addr, key_count })
}
