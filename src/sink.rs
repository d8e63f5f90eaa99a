/// Downstream message capability
///
/// The session hands every in-order application message to a `MessageSink`.
/// Concrete sinks are whatever sits next in the pipeline: an order book
/// builder, another protocol layer, or a recorder in tests.

use crate::packet::PacketView;

pub trait MessageSink {
    /// Consume one application message. Returns the number of bytes the sink
    /// processed; the session compares this against the wire-declared length
    /// for observability but never uses it for framing.
    fn consume(&mut self, payload: PacketView<'_>) -> usize;
}

/// Records every payload it receives. Used by tests and the replay demo.
#[derive(Debug, Default)]
pub struct VecSink {
    messages: Vec<Vec<u8>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Vec<u8>] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageSink for VecSink {
    fn consume(&mut self, payload: PacketView<'_>) -> usize {
        let bytes = payload.as_slice();
        self.messages.push(bytes.to_vec());
        bytes.len()
    }
}

/// Discards everything. Useful for benchmarks and drain-only consumers.
#[derive(Debug, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn consume(&mut self, payload: PacketView<'_>) -> usize {
        payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_records_in_order() {
        let mut sink = VecSink::new();
        assert_eq!(sink.consume(PacketView::new(b"AA")), 2);
        assert_eq!(sink.consume(PacketView::new(b"BBB")), 3);
        assert_eq!(sink.messages(), &[b"AA".to_vec(), b"BBB".to_vec()]);
    }

    #[test]
    fn test_null_sink_reports_full_length() {
        let mut sink = NullSink;
        assert_eq!(sink.consume(PacketView::new(b"whatever")), 8);
    }
}
