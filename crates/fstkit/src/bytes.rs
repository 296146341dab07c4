// LEB128 unsigned varint codec used by the node serializer.

/// Maximum encoded length of a u64 varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `v` to `buf` as an LEB128 varint.
pub fn write_uvarint(buf: &mut Vec<u8>, mut v: u64) {
    loop {
        let b = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(b);
            return;
        }
        buf.push(b | 0x80);
    }
}

/// Decode a varint starting at `pos`. Returns the value and the position
/// just past it.
///
/// The buffer must have been validated beforehand; this is the traversal
/// fast path and performs no bounds or overflow checking of its own beyond
/// slice indexing.
#[inline]
pub fn uvarint(data: &[u8], mut pos: usize) -> (u64, usize) {
    let mut v: u64 = 0;
    let mut shift = 0;
    loop {
        let b = data[pos];
        pos += 1;
        v |= u64::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return (v, pos);
        }
        shift += 7;
    }
}

/// Checked decode used during open-time validation.
///
/// Returns `None` if the varint runs past `end` or is longer than a u64
/// can hold.
pub fn checked_uvarint(data: &[u8], mut pos: usize, end: usize) -> Option<(u64, usize)> {
    let mut v: u64 = 0;
    let mut shift = 0u32;
    loop {
        if pos >= end || shift >= 7 * MAX_VARINT_LEN as u32 {
            return None;
        }
        let b = data[pos];
        pos += 1;
        v |= u64::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return Some((v, pos));
        }
        shift += 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_small() {
        for v in [0u64, 1, 127, 128, 300, 16_383, 16_384] {
            let mut buf = Vec::new();
            write_uvarint(&mut buf, v);
            let (got, pos) = uvarint(&buf, 0);
            assert_eq!(got, v);
            assert_eq!(pos, buf.len());
        }
    }

    #[test]
    fn round_trip_max() {
        let mut buf = Vec::new();
        write_uvarint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        let (got, _) = uvarint(&buf, 0);
        assert_eq!(got, u64::MAX);
    }

    #[test]
    fn single_byte_values_encode_as_one_byte() {
        for v in 0..128u64 {
            let mut buf = Vec::new();
            write_uvarint(&mut buf, v);
            assert_eq!(buf.len(), 1);
        }
    }

    #[test]
    fn checked_rejects_truncation() {
        let mut buf = Vec::new();
        write_uvarint(&mut buf, 1 << 40);
        assert!(checked_uvarint(&buf, 0, buf.len() - 1).is_none());
        assert!(checked_uvarint(&buf, 0, buf.len()).is_some());
    }

    #[test]
    fn checked_rejects_overlong() {
        // Eleven continuation bytes can never be a valid u64 varint.
        let buf = vec![0x80u8; 12];
        assert!(checked_uvarint(&buf, 0, buf.len()).is_none());
    }
}
