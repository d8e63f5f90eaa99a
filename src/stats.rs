/// Session statistics
///
/// Counts what the session saw (packets by class, messages and bytes
/// forwarded, framing mismatches) and tracks parse latency over a sliding
/// window. Observability only; nothing here feeds back into sequencing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW_SIZE: usize = 10000;

#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

#[derive(Debug, Clone)]
pub struct SessionStats {
    start_time: Option<Instant>,
    total_packets: u64,
    total_packet_bytes: u64,

    messages_forwarded: u64,
    bytes_forwarded: u64,

    heartbeats: u64,
    duplicates: u64,
    gap_events: u32,
    messages_missing: u32,
    framing_mismatches: u64,

    // Parse latencies (microseconds), recorded by the driving loop.
    parse_latencies: VecDeque<u64>,
}

impl SessionStats {
    pub fn new() -> Self {
        SessionStats {
            start_time: None,
            total_packets: 0,
            total_packet_bytes: 0,
            messages_forwarded: 0,
            bytes_forwarded: 0,
            heartbeats: 0,
            duplicates: 0,
            gap_events: 0,
            messages_missing: 0,
            framing_mismatches: 0,
            parse_latencies: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    pub fn record_packet(&mut self, size: usize) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.total_packets += 1;
        self.total_packet_bytes += size as u64;
    }

    pub fn record_message(&mut self, size: usize) {
        self.messages_forwarded += 1;
        self.bytes_forwarded += size as u64;
    }

    pub fn record_heartbeat(&mut self) {
        self.heartbeats += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_gap(&mut self, missing: u32) {
        self.gap_events += 1;
        self.messages_missing = self.messages_missing.wrapping_add(missing);
    }

    pub fn record_framing_mismatch(&mut self) {
        self.framing_mismatches += 1;
    }

    /// Record one parse call's latency in microseconds.
    pub fn record_parse_latency(&mut self, micros: u64) {
        if self.parse_latencies.len() >= WINDOW_SIZE {
            self.parse_latencies.pop_front();
        }
        self.parse_latencies.push_back(micros);
    }

    pub fn packets_per_sec(&self) -> f64 {
        self.rate(self.total_packets)
    }

    pub fn messages_per_sec(&self) -> f64 {
        self.rate(self.messages_forwarded)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.rate(self.total_packet_bytes)
    }

    fn rate(&self, count: u64) -> f64 {
        match self.start_time {
            None => 0.0,
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    count as f64 / elapsed
                } else {
                    0.0
                }
            }
        }
    }

    pub fn parse_latency_stats(&self) -> Option<LatencyStats> {
        if self.parse_latencies.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.parse_latencies.iter().copied().collect();
        sorted.sort_unstable();

        Some(LatencyStats {
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            mean_us: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_us: sorted[sorted.len() / 2],
            p99_us: sorted[(sorted.len() * 99) / 100],
        })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| st.elapsed())
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn total_packet_bytes(&self) -> u64 {
        self.total_packet_bytes
    }

    pub fn messages_forwarded(&self) -> u64 {
        self.messages_forwarded
    }

    pub fn bytes_forwarded(&self) -> u64 {
        self.bytes_forwarded
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn gap_events(&self) -> u32 {
        self.gap_events
    }

    /// Total messages known lost across all gap events.
    pub fn messages_missing(&self) -> u32 {
        self.messages_missing
    }

    pub fn framing_mismatches(&self) -> u64 {
        self.framing_mismatches
    }

    pub fn reset(&mut self) {
        *self = SessionStats::new();
    }

    pub fn print_summary(&self) {
        println!("=== Session Statistics ===");
        println!(
            "Packets: {} ({} bytes)",
            self.total_packets, self.total_packet_bytes
        );
        println!(
            "Messages forwarded: {} ({} bytes)",
            self.messages_forwarded, self.bytes_forwarded
        );
        println!("Heartbeats: {}", self.heartbeats);
        println!("Duplicates dropped: {}", self.duplicates);
        println!(
            "Gaps: {} events, {} messages missing",
            self.gap_events, self.messages_missing
        );
        println!("Framing mismatches: {}", self.framing_mismatches);
        println!("Elapsed: {:?}", self.elapsed());
        println!("Packets/sec: {:.2}", self.packets_per_sec());
        println!("Messages/sec: {:.2}", self.messages_per_sec());

        if let Some(stats) = self.parse_latency_stats() {
            println!("\nParse Latency (us):");
            println!(
                "  Min: {}, Max: {}, Mean: {:.2}",
                stats.min_us, stats.max_us, stats.mean_us
            );
            println!("  P50: {}, P99: {}", stats.p50_us, stats.p99_us);
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
