/// Parse throughput and per-path latency benchmarks

use byteorder::{BigEndian, ByteOrder};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mold_feed::{MoldSession, NullSink, PacketView, END_OF_SESSION_COUNT, HEARTBEAT_COUNT};

fn build_packet(seq: u32, count: u16, payload_len: usize) -> Vec<u8> {
    let mut buf = vec![b' '; 16];
    buf[..6].copy_from_slice(b"BENCH1");
    BigEndian::write_u32(&mut buf[10..14], seq);
    BigEndian::write_u16(&mut buf[14..16], count);
    if count != HEARTBEAT_COUNT && count != END_OF_SESSION_COUNT {
        for _ in 0..count {
            let mut len = [0u8; 2];
            BigEndian::write_u16(&mut len, payload_len as u16);
            buf.extend_from_slice(&len);
            buf.extend(std::iter::repeat(0xABu8).take(payload_len));
        }
    }
    buf
}

/// One packet per entry, sequences already in order.
fn build_stream(packets: usize, msgs_per_packet: u16) -> Vec<Vec<u8>> {
    let mut seq = 1u32;
    (0..packets)
        .map(|_| {
            let buf = build_packet(seq, msgs_per_packet, 40);
            seq += u32::from(msgs_per_packet);
            buf
        })
        .collect()
}

fn bench_parse_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_throughput");

    for msgs_per_packet in [1u16, 10, 100].iter() {
        let stream = black_box(build_stream(1000, *msgs_per_packet));

        group.bench_with_input(
            BenchmarkId::from_parameter(msgs_per_packet),
            msgs_per_packet,
            |b, _| {
                b.iter(|| {
                    let mut session = MoldSession::new(NullSink);
                    let mut forwarded = 0u64;
                    for buf in &stream {
                        if let Ok(parsed) = session.parse(PacketView::new(buf)) {
                            forwarded += parsed.consumed as u64;
                        }
                    }
                    forwarded
                });
            },
        );
    }
    group.finish();
}

fn bench_packet_classes(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_classes");

    let normal = build_packet(1, 1, 40);
    let heartbeat = build_packet(1, HEARTBEAT_COUNT, 0);
    let duplicate = build_packet(0, 1, 40);
    let gapped = build_packet(1000, 1, 40);

    group.bench_function("normal", |b| {
        b.iter(|| {
            let mut session = MoldSession::new(NullSink);
            session.parse(black_box(PacketView::new(&normal)))
        })
    });

    group.bench_function("heartbeat", |b| {
        b.iter(|| {
            let mut session = MoldSession::new(NullSink);
            session.parse(black_box(PacketView::new(&heartbeat)))
        })
    });

    group.bench_function("duplicate", |b| {
        b.iter(|| {
            let mut session = MoldSession::with_sequence(NullSink, 100);
            session.parse(black_box(PacketView::new(&duplicate)))
        })
    });

    group.bench_function("gap", |b| {
        b.iter(|| {
            let mut session = MoldSession::new(NullSink);
            session.parse(black_box(PacketView::new(&gapped)))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse_throughput, bench_packet_classes);
criterion_main!(benches);
