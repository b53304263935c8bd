// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tap client: an opaque high-throughput byte-stream endpoint over a
//! pub/sub transport, connected to a named endpoint the device
//! advertises (§4.10).
//!
//! The concrete pub/sub wire protocol is not a production collaborator
//! this crate ships (no example repo's pub/sub stack — DDS reader/writer
//! entities carry a much heavier QoS/discovery model than a single named
//! byte-stream tap needs); it is represented by the [`TapTransport`] seam,
//! mirroring [`crate::device::RpcTransport`].

use std::time::Duration;

use crate::error::{deadline_exceeded, failed_precondition, invalid_argument, SynapseResult};

/// Large receive buffer requested on constrained platforms (e.g.
/// Windows), per §4.10.
pub const RECV_BUFFER_BYTES_CONSTRAINED: usize = 2 * 1024 * 1024;

/// Large receive buffer requested on unconstrained platforms.
pub const RECV_BUFFER_BYTES_DEFAULT: usize = 16 * 1024 * 1024;

/// Minimum receive high-water mark, in messages.
pub const RECV_HIGH_WATER_MARK: u32 = 5_000;

/// TCP keepalive idle time before probes begin.
pub const KEEPALIVE_IDLE: Duration = Duration::from_secs(60);

/// Whether a tap carries data from the device to the host, or accepts
/// data from the host to push to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapRole {
    /// Device→host: the tap client subscribes with an empty topic filter.
    Producer,
    /// Host→device: the tap client publishes, non-blocking.
    Consumer,
}

/// One tap endpoint advertised by a device, as returned by `list_taps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapConnection {
    pub name: String,
    pub role: TapRole,
    pub endpoint: String,
}

/// Socket-option intentions a concrete [`TapTransport`] is expected to
/// apply once connected, scaled by platform per §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapSocketOptions {
    pub recv_buffer_bytes: usize,
    pub recv_high_water_mark: u32,
    pub keepalive_idle: Duration,
}

impl TapSocketOptions {
    /// Buffer sizing per platform: constrained on Windows, generous
    /// elsewhere, matching the source's `#ifdef _WIN32` split.
    pub fn for_platform() -> Self {
        let recv_buffer_bytes = if cfg!(windows) {
            RECV_BUFFER_BYTES_CONSTRAINED
        } else {
            RECV_BUFFER_BYTES_DEFAULT
        };
        TapSocketOptions {
            recv_buffer_bytes,
            recv_high_water_mark: RECV_HIGH_WATER_MARK,
            keepalive_idle: KEEPALIVE_IDLE,
        }
    }
}

/// Pluggable pub/sub transport underlying a connected [`Tap`]. The crate
/// does not ship a production implementation: the wire protocol used by
/// named device taps is an external collaborator.
pub trait TapTransport: Send {
    /// Opens a subscriber (producer tap) or publisher (consumer tap)
    /// socket against `endpoint`, applying `options`.
    fn connect(&mut self, endpoint: &str, role: TapRole, options: TapSocketOptions) -> SynapseResult<()>;

    /// Blocking receive with a timeout; only valid for producer taps.
    /// `EAGAIN`/timeout → `deadline_exceeded`.
    fn recv(&mut self, timeout: Duration) -> SynapseResult<Vec<u8>>;

    /// Non-blocking send; only valid for consumer taps.
    fn send(&mut self, data: &[u8]) -> SynapseResult<()>;

    /// Tears down the socket; implicitly dropped on `Tap` destruction.
    fn disconnect(&mut self);
}

/// Rewrites `endpoint`'s host to `device_host`, preserving its scheme and
/// port, mirroring the source's regex-based endpoint rewrite (the
/// advertised endpoint names whatever interface the device bound to
/// internally; the host always replaces it with the device's own URI
/// host before connecting).
pub fn rewrite_endpoint_host(endpoint: &str, device_host: &str) -> SynapseResult<String> {
    let (scheme, rest) = endpoint
        .split_once("://")
        .ok_or_else(|| invalid_argument(format!("endpoint has no scheme: {}", endpoint)))?;
    let port = rest
        .rsplit_once(':')
        .map(|(_, port)| port)
        .ok_or_else(|| invalid_argument(format!("endpoint has no port: {}", endpoint)))?;
    Ok(format!("{}://{}:{}", scheme, device_host, port))
}

/// Strips an optional `:port` suffix from a device URI, returning just
/// the host portion.
fn device_host(device_uri: &str) -> &str {
    device_uri.split_once(':').map_or(device_uri, |(host, _)| host)
}

/// A client connected to a named device tap. Producer taps emit data
/// (e.g. broadband neural data); consumer taps accept data (e.g.
/// stimulation commands). Only one role is ever active on a given
/// connection — calling `read` on a consumer or `send` on a producer is
/// `invalid_argument`, and using either before `connect` is
/// `failed_precondition`.
pub struct Tap<T: TapTransport> {
    device_uri: String,
    transport: T,
    connected: Option<TapConnection>,
}

impl<T: TapTransport> Tap<T> {
    pub fn new(device_uri: impl Into<String>, transport: T) -> Self {
        Tap {
            device_uri: device_uri.into(),
            transport,
            connected: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    pub fn connected_tap(&self) -> Option<&TapConnection> {
        self.connected.as_ref()
    }

    /// Connects to `tap` after rewriting its advertised endpoint host to
    /// this client's device URI host, applying the platform socket
    /// options.
    pub fn connect(&mut self, tap: &TapConnection) -> SynapseResult<()> {
        let endpoint = rewrite_endpoint_host(&tap.endpoint, device_host(&self.device_uri))?;
        self.transport
            .connect(&endpoint, tap.role, TapSocketOptions::for_platform())?;
        self.connected = Some(TapConnection {
            endpoint,
            ..tap.clone()
        });
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.connected.is_some() {
            self.transport.disconnect();
            self.connected = None;
        }
    }

    /// Blocking receive with `timeout`. Only valid for [`TapRole::Producer`].
    pub fn read(&mut self, timeout: Duration) -> SynapseResult<Vec<u8>> {
        let tap = self
            .connected
            .as_ref()
            .ok_or_else(|| failed_precondition("not connected to any tap"))?;
        if tap.role == TapRole::Consumer {
            return Err(invalid_argument("cannot read from consumer tap"));
        }
        self.transport.recv(timeout)
    }

    /// Sends `data`. Only valid for [`TapRole::Consumer`].
    pub fn send(&mut self, data: &[u8]) -> SynapseResult<()> {
        let tap = self
            .connected
            .as_ref()
            .ok_or_else(|| failed_precondition("not connected to any tap"))?;
        if tap.role != TapRole::Consumer {
            return Err(invalid_argument("can only send to consumer tap"));
        }
        self.transport.send(data)
    }

    /// Reads up to `max_messages`, stopping early the first time the
    /// transport reports no message ready within `timeout`. Errors other
    /// than timeout are swallowed, mirroring the source's `read_batch`,
    /// which returns a plain count rather than propagating failures.
    pub fn read_batch(&mut self, max_messages: usize, timeout: Duration) -> Vec<Vec<u8>> {
        let mut out = Vec::with_capacity(max_messages);
        while out.len() < max_messages {
            match self.read(timeout) {
                Ok(msg) => out.push(msg),
                Err(_) => break,
            }
        }
        out
    }
}

/// Finds the tap named `name` among `taps`, mirroring the source's
/// `list_taps` + linear-search-by-name pattern (the list itself is
/// fetched over [`crate::device::Device::query`], an opaque pass-through
/// not reproduced here).
pub fn find_tap<'a>(taps: &'a [TapConnection], name: &str) -> SynapseResult<&'a TapConnection> {
    taps.iter()
        .find(|t| t.name == name)
        .ok_or_else(|| crate::error::Status::new(crate::error::StatusCode::NotFound, format!("tap '{}' not found", name)))
}
