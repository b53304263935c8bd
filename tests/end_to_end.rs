// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end scenarios spanning config, NDTP codec, and the stream
//! endpoints together, rather than one module in isolation.

use std::net::UdpSocket;
use std::time::Duration;

use synapse_client::config::Config;
use synapse_client::discovery;
use synapse_client::ndtp::payload::{NDTPPayloadBroadband, NDTPPayloadBroadbandChannel, NDTPPayloadSpiketrain};
use synapse_client::ndtp::{DataType, NDTPHeader, NDTPMessage, NDTPPayload};
use synapse_client::node::{Node, NodePayload};
use synapse_client::transport::sink::{BindTarget, StreamRecord};
use synapse_client::transport::source::Destination;
use synapse_client::transport::{StreamSink, StreamSource};

/// A signal chain built from several node kinds, lowered, and rebuilt
/// from its serialized form, preserving node and connection order.
#[test]
fn full_signal_chain_round_trips_through_serialized_form() {
    let mut config = Config::new();

    let source = config
        .add(Node::new(NodePayload::BroadbandSource {
            channels: vec![0, 1, 2, 3],
        }))
        .unwrap();
    let filter = config
        .add(Node::new(NodePayload::SpectralFilter {
            low_cutoff_hz: 300.0,
            high_cutoff_hz: 6000.0,
        }))
        .unwrap();
    let detector = config
        .add(Node::new(NodePayload::SpikeDetector { threshold: -3.5 }))
        .unwrap();
    let sink = config
        .add(Node::new(NodePayload::StreamOut {
            host: "0.0.0.0".to_string(),
            port: 50038,
        }))
        .unwrap();

    config.connect(source, filter).unwrap();
    config.connect(filter, detector).unwrap();
    config.connect(detector, sink).unwrap();

    let lowered = config.lower();
    assert_eq!(lowered.nodes.len(), 4);
    assert_eq!(lowered.connections.len(), 3);

    let rebuilt = Config::from_serialized(&lowered).unwrap();
    assert_eq!(rebuilt.nodes().len(), 4);
    assert_eq!(rebuilt.connections().len(), 3);
    assert_eq!(rebuilt.connections()[0].src_id, source);
    assert_eq!(rebuilt.connections()[2].dst_id, sink);
}

/// Spec §8 scenario 5: a broadband frame sent by a `StreamSource` over
/// loopback is decoded by a `StreamSink` back into a `Broadband` record
/// with the original channel data intact.
#[test]
fn stream_sink_decodes_broadband_frame_sent_over_loopback() {
    let port = 18_245u16;
    let mut sink = StreamSink::new(BindTarget::Unicast(
        format!("127.0.0.1:{}", port).parse().unwrap(),
    ));
    sink.init().unwrap();

    let header = NDTPHeader::new(DataType::Broadband, 123_456, 7);
    let payload = NDTPPayload::Broadband(NDTPPayloadBroadband {
        is_signed: false,
        bit_width: 12,
        sample_rate: 3,
        channels: vec![
            NDTPPayloadBroadbandChannel { channel_id: 1, samples: vec![1000, 2000, 3000] },
            NDTPPayloadBroadbandChannel { channel_id: 2, samples: vec![4, 5, 6] },
        ],
    });
    let frame = NDTPMessage::new(header, payload).pack().unwrap();

    let mut source = StreamSource::new(Destination::Unicast(
        format!("127.0.0.1:{}", port).parse().unwrap(),
    ));
    source.write(&frame).unwrap();

    std::thread::sleep(Duration::from_millis(20));
    let (record, decoded_header, n) = sink.read().unwrap();
    assert!(n > 0);
    assert_eq!(decoded_header.timestamp, 123_456);

    match record {
        StreamRecord::Broadband(b) => {
            assert_eq!(b.channels[0].0, 1);
            assert_eq!(b.channels[0].1, vec![1000, 2000, 3000]);
            assert_eq!(b.channels[1].0, 2);
        }
        StreamRecord::Spiketrain(_) => panic!("expected broadband record"),
    }
}

/// Spec §8 scenario 4: spike counts above the 2-bit width clamp to 3 on
/// the way through the wire, surviving a full pack/unpack round trip.
#[test]
fn spiketrain_frame_round_trips_with_clamped_counts() {
    let header = NDTPHeader::new(DataType::Spiketrain, 10, 1);
    let payload = NDTPPayload::Spiketrain(NDTPPayloadSpiketrain {
        spike_counts: vec![1, 2, 3, 4, 5],
    });
    let frame = NDTPMessage::new(header, payload).pack().unwrap();
    let decoded = NDTPMessage::unpack(&frame).unwrap();

    match decoded.payload {
        NDTPPayload::Spiketrain(s) => assert_eq!(s.spike_counts, vec![1, 2, 3, 3, 3]),
        NDTPPayload::Broadband(_) => panic!("expected spiketrain payload"),
    }
}

/// Spec §8 scenario 6: three arbitrary bytes sent to a bound sink cause
/// `read()` to fail with a structural, not a CRC, error.
#[test]
fn stream_sink_rejects_truncated_frame_as_invalid() {
    let port = 18_246u16;
    let mut sink = StreamSink::new(BindTarget::Unicast(
        format!("127.0.0.1:{}", port).parse().unwrap(),
    ));
    sink.init().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender
        .send_to(&[1, 2, 3], format!("127.0.0.1:{}", port))
        .unwrap();

    std::thread::sleep(Duration::from_millis(20));
    let err = sink.read().unwrap_err();
    assert_eq!(err.code(), synapse_client::error::StatusCode::InvalidArgument);
}

/// Spec §8 scenario 1/2: the discovery parser end to end, both the
/// well-formed and malformed cases, exercised through the public API
/// rather than the module's own unit tests.
#[test]
fn discovery_parse_scenarios() {
    let tokens: Vec<String> = ["ID", "ABC123", "SYN1.2.3", "8080", "test-device-1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let ad = discovery::parse("192.168.1.1", &tokens).unwrap();
    assert_eq!(ad.serial, "ABC123");
    assert_eq!(ad.port, 8080);

    let bad_port: Vec<String> = ["ID", "ABC123", "SYN1.2.3", "100000", "test-device-1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let err = discovery::parse("192.168.1.1", &bad_port).unwrap_err();
    assert_eq!(err.code(), synapse_client::error::StatusCode::InvalidArgument);
}
