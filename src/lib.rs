/// mold-feed - Sequenced Market-Data Packet Session
///
/// Reassembly layer for a sequenced, packet-oriented multicast transport
/// carrying ordered exchange messages. Turns lossy, possibly-duplicated UDP
/// datagrams into a strictly ordered, exactly-once message stream for a
/// downstream consumer. Features include:
/// - Big-endian header decode and length-prefixed message framing
/// - Packet classification: normal, duplicate, gap, heartbeat, end-of-session
/// - Strict gap-free ordering (drop-and-stall on loss, never best-effort)
/// - Session rollover detection with sequence reset
/// - Gap range bookkeeping for an out-of-band retransmission client
/// - Per-session statistics

pub mod packet;
pub mod sink;
pub mod session;
pub mod gap_tracker;
pub mod stats;

pub use packet::PacketView;
pub use sink::{MessageSink, NullSink, VecSink};
pub use session::{
    MoldSession, ParseError, Parsed, SessionEvent, SessionId, END_OF_SESSION_COUNT,
    HEADER_SIZE, HEARTBEAT_COUNT, INITIAL_SEQUENCE, SESSION_ID_LEN,
};
pub use gap_tracker::GapTracker;
pub use stats::{LatencyStats, SessionStats};
