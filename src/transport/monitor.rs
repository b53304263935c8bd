// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet-level runtime statistics: drop/out-of-order classification and
//! RFC 3550 jitter, ported from the source's `PacketMonitor`.

use std::time::Instant;

/// Rolling counters exposed to callers as a stable snapshot, matching the
/// fields the source's `PacketMonitor` tracks internally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketStats {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub bytes_in_interval: u64,
    pub dropped: u64,
    pub out_of_order: u64,
    pub last_seq: u16,
    pub last_inter_arrival: f64,
    pub avg_jitter: f64,
}

/// Tracks sequence continuity and inter-arrival jitter for one reader.
/// Not thread-safe: owned exclusively by the reader driving a single
/// stream sink, per §5.
pub struct PacketMonitor {
    packet_count: u64,
    last_seq_number: u16,
    dropped_packets: u64,
    out_of_order_packets: u64,

    start_time: Option<Instant>,
    last_packet_time: Option<Instant>,
    last_bandwidth_time: Option<Instant>,

    bytes_received: u64,
    bytes_received_in_interval: u64,

    last_jitter: f64,
    avg_jitter: f64,
}

impl Default for PacketMonitor {
    fn default() -> Self {
        PacketMonitor {
            packet_count: 0,
            last_seq_number: 0,
            dropped_packets: 0,
            out_of_order_packets: 0,
            start_time: None,
            last_packet_time: None,
            last_bandwidth_time: None,
            bytes_received: 0,
            bytes_received_in_interval: 0,
            last_jitter: 0.0,
            avg_jitter: 0.0,
        }
    }
}

impl PacketMonitor {
    pub fn new() -> Self {
        PacketMonitor::default()
    }

    /// Marks the epoch against which `Runtime` in `format_stats` is measured.
    pub fn start_monitoring(&mut self) {
        let now = Instant::now();
        self.start_time = Some(now);
        self.last_bandwidth_time = Some(now);
    }

    /// Folds one incoming packet into the running statistics.
    ///
    /// The first call after construction (or after `start_monitoring`)
    /// seeds timing state and skips gap/jitter logic, mirroring the
    /// source's `packet_count_ == 0` special case.
    pub fn process_packet(&mut self, seq_number: u16, bytes_read: usize) {
        let now = Instant::now();

        if self.packet_count == 0 {
            self.last_packet_time = Some(now);
            log::debug!("[packet-monitor] first packet, seq={}", seq_number);
        } else {
            let last = self.last_packet_time.unwrap_or(now);
            let interval = now.duration_since(last).as_secs_f64();

            if self.packet_count > 1 {
                let jitter_diff = (interval - self.last_jitter).abs();
                self.avg_jitter += (jitter_diff - self.avg_jitter) / 16.0;
            }
            self.last_jitter = interval;
            self.last_packet_time = Some(now);

            let expected = self.last_seq_number.wrapping_add(1);
            if seq_number != expected {
                if seq_number > expected {
                    self.dropped_packets += (seq_number.wrapping_sub(expected)) as u64;
                } else {
                    self.out_of_order_packets += 1;
                }
            }
        }

        self.packet_count += 1;
        self.bytes_received += bytes_read as u64;
        self.bytes_received_in_interval += bytes_read as u64;
        self.last_seq_number = seq_number;
    }

    /// Point-in-time snapshot of the counters.
    pub fn stats(&self) -> PacketStats {
        PacketStats {
            packets_received: self.packet_count,
            bytes_received: self.bytes_received,
            bytes_in_interval: self.bytes_received_in_interval,
            dropped: self.dropped_packets,
            out_of_order: self.out_of_order_packets,
            last_seq: self.last_seq_number,
            last_inter_arrival: self.last_jitter,
            avg_jitter: self.avg_jitter,
        }
    }

    /// Formats the single-line status the source prints to a terminal,
    /// without the `\r`/clear-line control sequence (a CLI concern, out
    /// of scope here).
    pub fn format_stats(&self) -> String {
        let now = Instant::now();
        let start = self.start_time.unwrap_or(now);
        let runtime = now.duration_since(start).as_secs_f64();

        let drop_percent =
            (self.dropped_packets as f64 / self.packet_count.max(1) as f64) * 100.0;

        let bandwidth_start = self.last_bandwidth_time.unwrap_or(now);
        let dt_sec = now.duration_since(bandwidth_start).as_secs_f64();
        let mbit_per_sec = if dt_sec > 0.0 {
            let bytes_per_second = self.bytes_received_in_interval as f64 / dt_sec;
            (bytes_per_second * 8.0) / 1_000_000.0
        } else {
            0.0
        };

        let jitter_ms = self.avg_jitter * 1000.0;

        format!(
            "Runtime {:.1}s | Dropped: {}/{} ({:.1}%) | Mbit/sec: {:.1} | Jitter: {:.2} ms | Out of Order: {}",
            runtime,
            self.dropped_packets,
            self.packet_count,
            drop_percent,
            mbit_per_sec,
            jitter_ms,
            self.out_of_order_packets
        )
    }

    /// Emits `format_stats()` and resets the interval bandwidth counters.
    pub fn print_stats(&mut self) -> String {
        let line = self.format_stats();
        self.bytes_received_in_interval = 0;
        self.last_bandwidth_time = Some(Instant::now());
        line
    }
}
