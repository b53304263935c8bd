// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram stream endpoints: source (host→device), sink (device→host),
//! and the packet monitor that rides along with a sink's reads.

pub mod monitor;
pub mod sink;
pub mod source;

pub use monitor::{PacketMonitor, PacketStats};
pub use sink::StreamSink;
pub use source::StreamSource;

/// Default stream sink listen port when none is configured.
pub const DEFAULT_SINK_PORT: u16 = 50038;

/// Preferred stream sink receive buffer size, in bytes. Best-effort: the
/// OS may grant less.
pub const DEFAULT_RECV_BUFFER_BYTES: usize = 5 * 1024 * 1024;

/// Minimum scratch buffer size for a single datagram read.
pub const MIN_READ_BUFFER_BYTES: usize = 8 * 1024;

/// Poll deadline applied to every blocking-style read, per §4.8.
pub const READ_POLL_DEADLINE_MS: i32 = 1;
