/// Synthetic feed replay
///
/// Generates a sequenced packet stream with configurable loss and duplication,
/// replays it through a session, and answers gap events by re-feeding the
/// lost packets, standing in for the out-of-band retransmission server.
/// Useful for eyeballing gap handling and for quick latency numbers.
///
/// Usage: feed_replay [packet_count] [loss_pct] [dup_pct]

use std::collections::HashMap;
use std::env;
use std::time::Instant;

use byteorder::{BigEndian, ByteOrder};
use rand::Rng;

use mold_feed::{GapTracker, MoldSession, NullSink, PacketView, SessionEvent, HEADER_SIZE};

fn build_packet(seq: u32, payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = vec![b' '; HEADER_SIZE];
    buf[..6].copy_from_slice(b"REPLAY");
    BigEndian::write_u32(&mut buf[10..14], seq);
    BigEndian::write_u16(&mut buf[14..16], payloads.len() as u16);
    for payload in payloads {
        let mut len = [0u8; 2];
        BigEndian::write_u16(&mut len, payload.len() as u16);
        buf.extend_from_slice(&len);
        buf.extend_from_slice(payload);
    }
    buf
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let packet_count: usize = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(10000);
    let loss_pct: u32 = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(1);
    let dup_pct: u32 = args.get(3).and_then(|a| a.parse().ok()).unwrap_or(2);

    let mut rng = rand::thread_rng();

    // Generate the ideal stream first, then degrade it.
    let mut stream: Vec<(u32, Vec<u8>)> = Vec::with_capacity(packet_count);
    let mut seq = 1u32;
    for _ in 0..packet_count {
        let msg_count = rng.gen_range(1..=8);
        let payloads: Vec<Vec<u8>> = (0..msg_count)
            .map(|_| {
                let len = rng.gen_range(8..=64);
                (0..len).map(|_| rng.gen::<u8>()).collect()
            })
            .collect();
        stream.push((seq, build_packet(seq, &payloads)));
        seq += msg_count as u32;
    }
    let by_seq: HashMap<u32, &[u8]> = stream.iter().map(|(s, buf)| (*s, buf.as_slice())).collect();

    let mut degraded: Vec<&[u8]> = Vec::with_capacity(stream.len());
    for (_, buf) in &stream {
        if rng.gen_range(0..100) < loss_pct {
            continue; // lost in transit
        }
        degraded.push(buf);
        if rng.gen_range(0..100) < dup_pct {
            degraded.push(buf); // retransmitted duplicate
        }
    }

    println!(
        "Replaying {} datagrams ({} generated, {}% loss, {}% duplication)",
        degraded.len(),
        stream.len(),
        loss_pct,
        dup_pct
    );

    let mut session = MoldSession::new(NullSink);
    let mut tracker = GapTracker::new();

    for buf in &degraded {
        let start = Instant::now();
        match session.parse(PacketView::new(buf)) {
            Ok(parsed) => {
                if let Some(SessionEvent::Gap { expected, received }) = parsed.event {
                    tracker.record(expected, received);
                    // Stand-in retransmission server: re-feed the lost range,
                    // then the packet that exposed the gap.
                    let mut next = expected;
                    while next < received {
                        let Some(lost) = by_seq.get(&next) else { break };
                        session.parse(PacketView::new(lost)).ok();
                        if session.expected_sequence() == next {
                            break;
                        }
                        next = session.expected_sequence();
                    }
                    session.parse(PacketView::new(buf)).ok();
                    tracker.resolve(session.expected_sequence());
                }
            }
            Err(e) => eprintln!("dropped packet: {}", e),
        }
        let micros = start.elapsed().as_micros() as u64;
        session.stats_mut().record_parse_latency(micros);
    }

    session.stats().print_summary();

    println!("\nUnresolved gaps: {} ranges", tracker.gap_count());
    for (start, end) in tracker.gaps() {
        println!("  missing {}..={}", start, end);
    }
}
