// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream source: host→device datagram sender.

use std::net::{SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{internal, unavailable, SynapseResult};

/// Destination a [`StreamSource`] writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Unicast(SocketAddr),
    Multicast(SocketAddr),
}

/// Host→device datagram sender. The socket is created lazily on first
/// write, matching the source's init-on-demand lifecycle.
pub struct StreamSource {
    destination: Destination,
    socket: Option<UdpSocket>,
}

impl StreamSource {
    pub fn new(destination: Destination) -> Self {
        StreamSource {
            destination,
            socket: None,
        }
    }

    /// Creates the underlying socket if it does not already exist:
    /// `SO_REUSEADDR` and (where available) `SO_REUSEPORT`, non-blocking.
    pub fn init(&mut self) -> SynapseResult<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| internal(format!("socket creation failed: {}", e)))?;
        socket2
            .set_reuse_address(true)
            .map_err(|e| internal(format!("SO_REUSEADDR failed: {}", e)))?;
        #[cfg(unix)]
        if let Err(e) = socket2.set_reuse_port(true) {
            log::debug!("[stream-source] SO_REUSEPORT unavailable: {}", e);
        }
        socket2
            .set_nonblocking(true)
            .map_err(|e| internal(format!("set_nonblocking failed: {}", e)))?;

        let bind_addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
        socket2
            .bind(&bind_addr.into())
            .map_err(|e| internal(format!("bind failed: {}", e)))?;

        log::debug!(
            "[stream-source] init destination={:?}",
            self.destination
        );
        self.socket = Some(socket2.into());
        Ok(())
    }

    /// Sends `bytes` as a single datagram, initializing the socket on
    /// first use. `EAGAIN`/`EWOULDBLOCK` → `unavailable`; other errors
    /// → `internal` with the OS errno embedded.
    pub fn write(&mut self, bytes: &[u8]) -> SynapseResult<usize> {
        self.init()?;
        let socket = self.socket.as_ref().expect("initialized above");

        let dest = match self.destination {
            Destination::Unicast(addr) | Destination::Multicast(addr) => addr,
        };

        match socket.send_to(bytes, dest) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(unavailable("stream source write would block"))
            }
            Err(e) => Err(internal(format!("stream source write failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let addr: SocketAddr = "127.0.0.1:19999".parse().unwrap();
        let mut source = StreamSource::new(Destination::Unicast(addr));
        source.init().unwrap();
        assert!(source.socket.is_some());
        source.init().unwrap();
    }

    #[test]
    fn write_to_loopback_succeeds() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut source = StreamSource::new(Destination::Unicast(addr));
        let sent = source.write(b"hello").unwrap();
        assert_eq!(sent, 5);
    }
}
