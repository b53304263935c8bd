// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream sink: device→host datagram receiver, decoding NDTP frames into
//! typed records.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use socket2::{Domain, Protocol, Socket, Type};

use super::{DEFAULT_RECV_BUFFER_BYTES, MIN_READ_BUFFER_BYTES, READ_POLL_DEADLINE_MS};
use crate::error::{internal, unavailable, SynapseResult};
use crate::ndtp::{NDTPHeader, NDTPMessage, NDTPPayload};
use crate::types::{BroadbandRecord, SpiketrainRecord};

/// Bind target for a [`StreamSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    Unicast(SocketAddr),
    Multicast { group: Ipv4Addr, port: u16 },
}

/// A decoded record read from a sink, tagged by which payload variant
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    Broadband(BroadbandRecord),
    Spiketrain(SpiketrainRecord),
}

/// Device→host datagram receiver.
pub struct StreamSink {
    target: BindTarget,
    socket: Option<UdpSocket>,
}

impl StreamSink {
    pub fn new(target: BindTarget) -> Self {
        StreamSink {
            target,
            socket: None,
        }
    }

    /// Creates and binds the underlying socket: reuse flags, non-blocking,
    /// best-effort large receive buffer, and multicast join when
    /// applicable. Idempotent.
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
            log::debug!("[stream-sink] SO_REUSEPORT unavailable: {}", e);
        }

        if let Err(e) = socket2.set_recv_buffer_size(DEFAULT_RECV_BUFFER_BYTES) {
            log::debug!(
                "[stream-sink] requested {}-byte recv buffer, OS declined: {}",
                DEFAULT_RECV_BUFFER_BYTES,
                e
            );
        }
        let granted = socket2.recv_buffer_size().unwrap_or(0);
        log::debug!("[stream-sink] recv buffer granted={}", granted);

        let bind_addr = match self.target {
            BindTarget::Unicast(addr) => addr,
            BindTarget::Multicast { group: _, port } => {
                SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
            }
        };
        socket2
            .bind(&bind_addr.into())
            .map_err(|e| internal(format!("bind failed: {}", e)))?;

        socket2
            .set_nonblocking(true)
            .map_err(|e| internal(format!("set_nonblocking failed: {}", e)))?;

        let socket: UdpSocket = socket2.into();

        if let BindTarget::Multicast { group, port: _ } = self.target {
            socket
                .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
                .map_err(|e| internal(format!("IP_ADD_MEMBERSHIP failed: {}", e)))?;
            log::debug!("[stream-sink] joined multicast group {}", group);
        }

        log::debug!("[stream-sink] init bind_addr={}", bind_addr);
        self.socket = Some(socket);
        Ok(())
    }

    /// Polls the socket with a 1 ms deadline, receives one datagram, and
    /// decodes it as an [`NDTPMessage`]. Zero poll events → `unavailable`.
    /// Returns the decoded record alongside the raw header and byte count.
    pub fn read(&mut self) -> SynapseResult<(StreamRecord, NDTPHeader, usize)> {
        self.init()?;
        let socket = self.socket.as_ref().expect("initialized above");

        if !poll_readable(socket, READ_POLL_DEADLINE_MS)? {
            return Err(unavailable("stream sink poll timed out"));
        }

        let mut buf = vec![0u8; MIN_READ_BUFFER_BYTES];
        let n = match socket.recv(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(unavailable("stream sink recv would block"));
            }
            Err(e) => return Err(internal(format!("stream sink recv failed: {}", e))),
        };

        let message = NDTPMessage::unpack(&buf[..n])?;
        let record = decode_record(&message)?;
        Ok((record, message.header, n))
    }
}

fn decode_record(message: &NDTPMessage) -> SynapseResult<StreamRecord> {
    match &message.payload {
        NDTPPayload::Broadband(broadband) => Ok(StreamRecord::Broadband(BroadbandRecord {
            t0: message.header.timestamp,
            is_signed: broadband.is_signed,
            bit_width: broadband.bit_width,
            sample_rate: broadband.sample_rate,
            channels: broadband
                .channels
                .iter()
                .map(|c| (c.channel_id, c.samples.clone()))
                .collect(),
        })),
        NDTPPayload::Spiketrain(spiketrain) => Ok(StreamRecord::Spiketrain(SpiketrainRecord {
            t0: message.header.timestamp,
            bin_size_ms: None,
            spike_counts: spiketrain.spike_counts.clone(),
        })),
    }
}

#[cfg(unix)]
fn poll_readable(socket: &UdpSocket, deadline_ms: i32) -> SynapseResult<bool> {
    let fd = socket.as_raw_fd();
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: `pollfd` is a single valid, stack-owned descriptor entry.
    let ret = unsafe { libc::poll(&mut pollfd, 1, deadline_ms) };
    match ret {
        0 => Ok(false),
        n if n > 0 => Ok(pollfd.revents & libc::POLLIN != 0),
        _ => Err(internal(format!(
            "poll failed: {}",
            std::io::Error::last_os_error()
        ))),
    }
}

#[cfg(not(unix))]
fn poll_readable(socket: &UdpSocket, deadline_ms: i32) -> SynapseResult<bool> {
    use std::time::Duration;
    socket
        .set_read_timeout(Some(Duration::from_millis(deadline_ms.max(1) as u64)))
        .map_err(|e| internal(format!("set_read_timeout failed: {}", e)))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndtp::payload::{NDTPPayloadBroadband, NDTPPayloadBroadbandChannel};
    use crate::ndtp::{DataType, NDTPHeader};

    fn broadband_frame() -> Vec<u8> {
        let header = NDTPHeader::new(DataType::Broadband, 555, 1);
        let payload = NDTPPayload::Broadband(NDTPPayloadBroadband {
            is_signed: false,
            bit_width: 16,
            sample_rate: 1000,
            channels: vec![NDTPPayloadBroadbandChannel {
                channel_id: 1,
                samples: vec![1000, 2000, 3000],
            }],
        });
        NDTPMessage::new(header, payload).pack().unwrap()
    }

    #[test]
    fn read_decodes_broadband_record_from_loopback() {
        let mut sink = StreamSink::new(BindTarget::Unicast("127.0.0.1:0".parse().unwrap()));
        sink.init().unwrap();
        let bound = sink.socket.as_ref().unwrap().local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(&broadband_frame(), bound).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let (record, header, n) = sink.read().unwrap();
        assert!(n > 0);
        assert_eq!(header.timestamp, 555);
        match record {
            StreamRecord::Broadband(b) => {
                assert_eq!(b.channels[0].0, 1);
                assert_eq!(b.channels[0].1, vec![1000, 2000, 3000]);
            }
            StreamRecord::Spiketrain(_) => panic!("expected broadband"),
        }
    }

    #[test]
    fn read_with_nothing_sent_times_out_as_unavailable() {
        let mut sink = StreamSink::new(BindTarget::Unicast("127.0.0.1:0".parse().unwrap()));
        let err = sink.read().unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::Unavailable);
    }

    #[test]
    fn malformed_datagram_is_rejected() {
        let mut sink = StreamSink::new(BindTarget::Unicast("127.0.0.1:0".parse().unwrap()));
        sink.init().unwrap();
        let bound = sink.socket.as_ref().unwrap().local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(&[1, 2, 3], bound).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let err = sink.read().unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }
}
