/// Sequenced packet session
///
/// One `MoldSession` reassembles a single sequence-numbered downlink stream:
/// it decodes the 16-byte packet header, classifies the packet (normal,
/// duplicate, gap, heartbeat, end-of-session) and forwards in-order messages
/// to the downstream sink exactly once. Gap recovery itself lives elsewhere;
/// this layer only detects loss and refuses to forward out of order.
///
/// Packet header: 16 bytes
///   - session id: 10 bytes, opaque, right-padded
///   - sequence: u32 big-endian, sequence of the first message in the packet
///   - message count: u16 big-endian; 0 = heartbeat, 0xFFFF = end of session
///
/// Each message is framed as a u16 big-endian length followed by the payload.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::packet::PacketView;
use crate::sink::MessageSink;
use crate::stats::SessionStats;

pub const HEADER_SIZE: usize = 16;
pub const SESSION_ID_LEN: usize = 10;

/// `message_count` marking a heartbeat packet.
pub const HEARTBEAT_COUNT: u16 = 0;
/// `message_count` marking the end-of-session tombstone.
pub const END_OF_SESSION_COUNT: u16 = 0xFFFF;
/// Sequence number of the first message in a fresh session.
pub const INITIAL_SEQUENCE: u32 = 1;

/// Opaque 10-byte transport session identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_LEN]);

impl SessionId {
    pub fn new(bytes: [u8; SESSION_ID_LEN]) -> Self {
        SessionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // On the wire the id is alphanumeric, right-padded with spaces.
        let trimmed = self
            .0
            .iter()
            .take_while(|&&b| b != b' ' && b != 0)
            .copied()
            .collect::<Vec<u8>>();
        write!(f, "{}", String::from_utf8_lossy(&trimmed))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated packet: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed frame: declared length {declared} exceeds remaining {remaining} bytes")]
    Malformed { declared: u16, remaining: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Non-fatal condition surfaced alongside a successful parse. At most one per
/// call; terminal conditions take precedence over informational ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// One or more messages were lost upstream. The session will not forward
    /// anything until the missing range is recovered out of band.
    Gap { expected: u32, received: u32 },
    /// The transport session id changed mid-stream; the sequence was reset to
    /// the incoming packet's.
    SessionChanged { previous: SessionId, current: SessionId },
    /// End-of-session tombstone processed; the session forwards nothing more.
    EndOfSession,
    /// The sink reported consuming a different byte count than the wire
    /// declared. Wire length stays authoritative.
    FramingMismatch { declared: u16, reported: usize },
}

/// Outcome of one `parse` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed {
    /// Bytes of the datagram consumed by this call.
    pub consumed: usize,
    pub event: Option<SessionEvent>,
}

/// Per-session reassembly state. One instance per logical feed session,
/// driven from a single thread; no internal locking.
#[derive(Debug)]
pub struct MoldSession<S: MessageSink> {
    sink: S,
    expected_seq: u32,
    last_session_id: Option<SessionId>,
    terminated: bool,
    stats: SessionStats,
}

impl<S: MessageSink> MoldSession<S> {
    pub fn new(sink: S) -> Self {
        Self::with_sequence(sink, INITIAL_SEQUENCE)
    }

    /// Start at a known sequence, e.g. when resuming after out-of-band
    /// recovery.
    pub fn with_sequence(sink: S, sequence: u32) -> Self {
        MoldSession {
            sink,
            expected_seq: sequence,
            last_session_id: None,
            terminated: false,
            stats: SessionStats::new(),
        }
    }

    /// Next sequence number this session will accept.
    pub fn expected_sequence(&self) -> u32 {
        self.expected_seq
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Mutable access for the driving loop, e.g. to record parse latency or
    /// reset counters between reporting intervals.
    pub fn stats_mut(&mut self) -> &mut SessionStats {
        &mut self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one datagram. Returns how many bytes of it were consumed and
    /// at most one condition for the caller to act on. Session state is only
    /// mutated after the packet validates, so a `Truncated` or `Malformed`
    /// packet can simply be dropped and the stream continues.
    pub fn parse(&mut self, packet: PacketView<'_>) -> ParseResult<Parsed> {
        let mut view = packet;
        if view.remaining() < HEADER_SIZE {
            return Err(ParseError::Truncated {
                need: HEADER_SIZE,
                have: view.remaining(),
            });
        }
        if self.terminated {
            // Tombstone already seen; the whole datagram is swallowed.
            return Ok(Parsed {
                consumed: packet.len(),
                event: None,
            });
        }

        let truncated = ParseError::Truncated {
            need: HEADER_SIZE,
            have: view.remaining(),
        };
        let session_id = SessionId::new(view.read_array().ok_or(truncated)?);
        let sequence = view.read_u32().ok_or(truncated)?;
        let count = view.read_u16().ok_or(truncated)?;

        self.stats.record_packet(packet.len());

        // A changed session id resets sequencing, but the reset is committed
        // only once the packet proves well formed: a dropped garbage datagram
        // must not re-seat the session.
        let rollover = match self.last_session_id {
            Some(previous) if previous != session_id => Some(SessionEvent::SessionChanged {
                previous,
                current: session_id,
            }),
            _ => None,
        };
        let expected = if rollover.is_some() {
            sequence
        } else {
            self.expected_seq
        };

        if sequence == expected {
            match count {
                HEARTBEAT_COUNT => {
                    let event = self.accept_session_id(session_id, sequence, rollover);
                    self.stats.record_heartbeat();
                    Ok(Parsed {
                        consumed: HEADER_SIZE,
                        event,
                    })
                }
                END_OF_SESSION_COUNT => {
                    self.accept_session_id(session_id, sequence, rollover);
                    debug!(%session_id, sequence, "end of session");
                    self.terminated = true;
                    Ok(Parsed {
                        consumed: HEADER_SIZE,
                        event: Some(SessionEvent::EndOfSession),
                    })
                }
                _ => {
                    // Every frame must validate before any state mutation or
                    // sink call, so a bad packet delivers nothing and can
                    // simply be dropped.
                    let mut probe = view;
                    for _ in 0..count {
                        Self::next_frame(&mut probe)?;
                    }
                    let event = self.accept_session_id(session_id, sequence, rollover);
                    let (consumed, mismatch) = self.forward_frames(view, count)?;
                    Ok(Parsed {
                        consumed,
                        event: event.or(mismatch),
                    })
                }
            }
        } else if sequence < expected {
            // Retransmission of data already delivered; never re-forwarded.
            self.accept_session_id(session_id, sequence, rollover);
            debug!(sequence, expected = self.expected_seq, "stale packet dropped");
            self.stats.record_duplicate();
            Ok(Parsed {
                consumed: packet.len(),
                event: None,
            })
        } else {
            self.accept_session_id(session_id, sequence, rollover);
            let missing = sequence - expected;
            debug!(sequence, expected, missing, "gap detected");
            self.stats.record_gap(missing);
            Ok(Parsed {
                consumed: packet.len(),
                event: Some(SessionEvent::Gap {
                    expected,
                    received: sequence,
                }),
            })
        }
    }

    /// Commit the packet's session id, applying the rollover sequence reset.
    /// Called only once the packet is known good.
    fn accept_session_id(
        &mut self,
        session_id: SessionId,
        sequence: u32,
        rollover: Option<SessionEvent>,
    ) -> Option<SessionEvent> {
        if let Some(SessionEvent::SessionChanged { previous, .. }) = rollover {
            debug!(%previous, current = %session_id, sequence, "session id changed, resetting sequence");
            self.expected_seq = sequence;
        }
        self.last_session_id = Some(session_id);
        rollover
    }

    /// Forward `count` length-prefixed frames to the sink. The caller has
    /// already validated every frame length against the buffer.
    fn forward_frames(
        &mut self,
        frames: PacketView<'_>,
        count: u16,
    ) -> ParseResult<(usize, Option<SessionEvent>)> {
        let mut walk = frames;
        let mut consumed = HEADER_SIZE;
        let mut mismatch = None;
        for _ in 0..count {
            let (declared, payload) = Self::next_frame(&mut walk)?;
            let reported = self.sink.consume(payload);
            if reported != declared as usize {
                warn!(declared, reported, "sink consumption disagrees with wire length");
                self.stats.record_framing_mismatch();
                if mismatch.is_none() {
                    mismatch = Some(SessionEvent::FramingMismatch { declared, reported });
                }
            }
            consumed += 2 + declared as usize;
            self.stats.record_message(declared as usize);
        }

        // The transport restarts sessions rather than wrapping, but a stream
        // seated near u32::MAX must not panic on a valid packet.
        self.expected_seq = self.expected_seq.wrapping_add(u32::from(count));
        Ok((consumed, mismatch))
    }

    fn next_frame<'a>(view: &mut PacketView<'a>) -> ParseResult<(u16, PacketView<'a>)> {
        let have = view.remaining();
        let declared = view.read_u16().ok_or(ParseError::Truncated { need: 2, have })?;
        let remaining = view.remaining();
        let payload = view
            .sub_view(declared as usize)
            .ok_or(ParseError::Malformed { declared, remaining })?;
        Ok((declared, payload))
    }
}
