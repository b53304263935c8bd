// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device discovery announcement parsing (§6).
//!
//! Discovery itself (sending the broadcast, listening on the well-known
//! multicast group, and driving the host-side collection loop) is a
//! thin shell over [`crate::transport`]; the parsing and validation
//! grammar is the part with real substance, and is specified in full.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{internal, invalid_argument, SynapseResult};

/// Capability prefix every advertisement must carry before its version
/// digits, e.g. `SYN1.2.3`.
pub const CAPABILITY_PREFIX: &str = "SYN";

/// Well-known multicast group devices announce themselves on.
pub const DISCOVERY_GROUP: &str = "224.0.0.245";

/// Well-known discovery port.
pub const DISCOVERY_PORT: u16 = 6470;

/// Default discovery timeout, per §6.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(10_000);

/// A device discovered on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAdvertisement {
    pub serial: String,
    pub capability: String,
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Parses one announcement's whitespace-separated ASCII tokens.
///
/// Grammar: `ID <serial> <capability> <port> <name...>`. `host` is the
/// source IP the datagram arrived from, not carried in the payload
/// itself. Validation:
///
/// - the first token must be the literal `ID`;
/// - `capability` must carry the [`CAPABILITY_PREFIX`] as the letter
///   run before its first digit;
/// - `port` must parse as an integer in `1..=65535`;
/// - every remaining token is joined with single spaces into `name`.
pub fn parse(host: &str, tokens: &[String]) -> SynapseResult<DeviceAdvertisement> {
    if tokens.len() < 5 {
        return Err(invalid_argument("invalid response from server"));
    }

    if tokens[0] != "ID" {
        return Err(invalid_argument(format!(
            "invalid response from server (expected ID, got {{{}}})",
            tokens[0]
        )));
    }

    let serial = tokens[1].clone();
    let capability = tokens[2].clone();

    if !validate_capability(&capability) {
        return Err(invalid_argument(format!(
            "invalid capability in response from server ({})",
            capability
        )));
    }

    let port: u32 = tokens[3]
        .parse()
        .map_err(|_| invalid_argument("invalid port in response from server"))?;
    if port < 1 || port > 65535 {
        return Err(invalid_argument("invalid port in response from server"));
    }

    let name = tokens[4..].join(" ");

    Ok(DeviceAdvertisement {
        serial,
        capability,
        name,
        host: host.to_string(),
        port: port as u16,
    })
}

/// True if `capability` begins with [`CAPABILITY_PREFIX`] immediately
/// before its first ASCII digit, e.g. `SYN1.2.3` but not `FOO1.2.3` or
/// a string with no digits at all.
fn validate_capability(capability: &str) -> bool {
    match capability.find(|c: char| c.is_ascii_digit()) {
        Some(i) if i > 0 => &capability[..i] == CAPABILITY_PREFIX,
        _ => false,
    }
}

/// Splits a received datagram into whitespace-separated tokens, mirroring
/// the source's `istringstream >> token` loop.
fn tokenize(payload: &str) -> Vec<String> {
    payload.split_whitespace().map(str::to_string).collect()
}

/// Listens on the well-known discovery multicast group and collects
/// validated advertisements until `timeout` elapses. Duplicate
/// suppression keys on `(serial, host)` within the window.
pub fn discover(timeout: Duration) -> SynapseResult<Vec<DeviceAdvertisement>> {
    let group: Ipv4Addr = DISCOVERY_GROUP
        .parse()
        .expect("DISCOVERY_GROUP is a valid literal");

    let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| internal(format!("error creating socket: {}", e)))?;
    socket2
        .set_reuse_address(true)
        .map_err(|e| internal(format!("SO_REUSEADDR failed: {}", e)))?;
    socket2
        .bind(&SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT)).into())
        .map_err(|e| internal(format!("bind failed: {}", e)))?;
    socket2
        .set_read_timeout(Some(Duration::from_millis(200)))
        .map_err(|e| internal(format!("set_read_timeout failed: {}", e)))?;

    let socket: UdpSocket = socket2.into();
    socket
        .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
        .map_err(|e| internal(format!("IP_ADD_MEMBERSHIP failed: {}", e)))?;

    let mut discovered = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut buffer = [0u8; 1024];
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let (n, from) = match socket.recv_from(&mut buffer) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                log::debug!("[discovery] recv_from failed: {}", e);
                continue;
            }
        };

        let text = String::from_utf8_lossy(&buffer[..n]);
        let tokens = tokenize(&text);
        let host = from.ip().to_string();

        match parse(&host, &tokens) {
            Ok(ad) => {
                let key = (ad.serial.clone(), ad.host.clone());
                if seen.insert(key) {
                    discovered.push(ad);
                }
            }
            Err(e) => log::debug!("[discovery] ignoring malformed announcement: {}", e),
        }
    }

    Ok(discovered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_well_formed_announcement() {
        let ad = parse(
            "192.168.1.1",
            &toks(&["ID", "ABC123", "SYN1.2.3", "8080", "test-device-1"]),
        )
        .unwrap();
        assert_eq!(ad.serial, "ABC123");
        assert_eq!(ad.capability, "SYN1.2.3");
        assert_eq!(ad.port, 8080);
        assert_eq!(ad.name, "test-device-1");
        assert_eq!(ad.host, "192.168.1.1");
    }

    #[test]
    fn multi_word_name_is_joined() {
        let ad = parse(
            "10.0.0.1",
            &toks(&["ID", "S1", "SYN2.0", "100", "left", "array"]),
        )
        .unwrap();
        assert_eq!(ad.name, "left array");
    }

    #[test]
    fn rejects_missing_id_token() {
        let err = parse("h", &toks(&["HI", "S1", "SYN1.0", "100", "n"])).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn rejects_port_out_of_range() {
        let err = parse(
            "h",
            &toks(&["ID", "ABC123", "SYN1.2.3", "100000", "test-device-1"]),
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn rejects_capability_missing_prefix() {
        let err = parse("h", &toks(&["ID", "S1", "XYZ1.0", "100", "n"])).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn rejects_capability_with_no_digits() {
        let err = parse("h", &toks(&["ID", "S1", "SYN", "100", "n"])).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn rejects_too_few_tokens() {
        let err = parse("h", &toks(&["ID", "S1"])).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }
}
