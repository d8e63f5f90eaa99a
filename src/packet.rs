/// Bounds-checked datagram view
///
/// `PacketView` wraps one received datagram and tracks a read cursor. All
/// reads are checked against the buffer length and return `None` on underrun;
/// the session layer maps that into typed errors with context. Views are
/// cheap to copy and never own the bytes.

use byteorder::{BigEndian, ByteOrder};

#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketView<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        PacketView { buf, pos: 0 }
    }

    /// Total datagram length, independent of the cursor.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left between the cursor and the end of the datagram.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Unread bytes as a raw slice.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(BigEndian::read_u16(bytes))
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(BigEndian::read_u32(bytes))
    }

    /// Read exactly `N` bytes into a fixed array.
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    /// Carve a sub-view scoped to the next `len` bytes and advance past it.
    pub fn sub_view(&mut self, len: usize) -> Option<PacketView<'a>> {
        let bytes = self.take(len)?;
        Some(PacketView::new(bytes))
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance_cursor() {
        let buf = [0x01, 0x02, 0x00, 0x00, 0x00, 0x2a];
        let mut view = PacketView::new(&buf);
        assert_eq!(view.read_u16(), Some(0x0102));
        assert_eq!(view.remaining(), 4);
        assert_eq!(view.read_u32(), Some(42));
        assert_eq!(view.remaining(), 0);
    }

    #[test]
    fn test_underrun_returns_none() {
        let buf = [0x01];
        let mut view = PacketView::new(&buf);
        assert_eq!(view.read_u16(), None);
        // A failed read does not move the cursor.
        assert_eq!(view.remaining(), 1);
    }

    #[test]
    fn test_sub_view_is_scoped() {
        let buf = [0xaa, 0xbb, 0xcc, 0xdd];
        let mut view = PacketView::new(&buf);
        let sub = view.sub_view(2).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.as_slice(), &[0xaa, 0xbb]);
        assert_eq!(view.remaining(), 2);
        assert!(view.sub_view(3).is_none());
    }

    #[test]
    fn test_read_array() {
        let buf = [1, 2, 3];
        let mut view = PacketView::new(&buf);
        assert_eq!(view.read_array::<2>(), Some([1, 2]));
        assert_eq!(view.read_array::<2>(), None);
    }
}
