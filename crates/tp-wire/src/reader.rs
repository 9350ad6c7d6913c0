//! Byte cursors used by the record codecs.

use crate::packet::PacketBuf;

// ---------------------------------------------------------------------------
// WireReader: cursor over a received byte slice
// ---------------------------------------------------------------------------

/// Reads little-endian fields from a slice whose length has already been
/// checked against the record size. Reads past the end yield zero rather
/// than panicking.
pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn read_u8(&mut self) -> u8 {
        let v = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        v
    }

    pub(crate) fn read_i8(&mut self) -> i8 {
        self.read_u8() as i8
    }

    pub(crate) fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub(crate) fn read_u16_le(&mut self) -> u16 {
        u16::from_le_bytes([self.read_u8(), self.read_u8()])
    }

    pub(crate) fn read_u32_le(&mut self) -> u32 {
        u32::from_le_bytes([
            self.read_u8(),
            self.read_u8(),
            self.read_u8(),
            self.read_u8(),
        ])
    }
}

// ---------------------------------------------------------------------------
// WireWriter: appends fields to an outgoing packet
// ---------------------------------------------------------------------------

pub(crate) struct WireWriter<'a> {
    buf: &'a mut PacketBuf,
}

impl<'a> WireWriter<'a> {
    pub(crate) fn new(buf: &'a mut PacketBuf) -> Self {
        Self { buf }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        // Capacity is MAX_PACKET_LEN, the size of the largest packet.
        let pushed = self.buf.extend_from_slice(bytes);
        debug_assert!(pushed.is_ok(), "packet exceeds MAX_PACKET_LEN");
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }

    pub(crate) fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub(crate) fn write_u16_le(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u32_le(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut r = WireReader::new(&data);
        assert_eq!(r.read_u16_le(), 0x1234);
        assert_eq!(r.read_u32_le(), 0x1234_5678);
    }

    #[test]
    fn read_past_end_is_zero() {
        let mut r = WireReader::new(&[0xFF]);
        assert_eq!(r.read_u8(), 0xFF);
        assert_eq!(r.read_u8(), 0);
        assert!(!r.read_bool());
    }

    #[test]
    fn writer_appends_in_order() {
        let mut buf = PacketBuf::new();
        let mut w = WireWriter::new(&mut buf);
        w.write_u8(2);
        w.write_u16_le(0x0102);
        w.write_i8(-1);
        assert_eq!(buf.as_slice(), &[2, 0x02, 0x01, 0xFF]);
    }
}
