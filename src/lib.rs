// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # synapse-client
//!
//! A client library for a remote neural data acquisition and stimulation
//! device. A host application describes a signal-processing pipeline as
//! a typed DAG of nodes, ships that graph to the device over RPC, starts
//! it, and streams the resulting neural data back (or pushes stimulation
//! data out) over UDP using the Neural Data Transport Protocol (NDTP).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use synapse_client::config::Config;
//! use synapse_client::node::{Node, NodePayload};
//!
//! let mut config = Config::new();
//! let source = config.add(Node::new(NodePayload::BroadbandSource {
//!     channels: vec![0, 1, 2, 3],
//! })).unwrap();
//! let sink = config.add(Node::new(NodePayload::StreamOut {
//!     host: "0.0.0.0".to_string(),
//!     port: 50038,
//! })).unwrap();
//! config.connect(source, sink).unwrap();
//! let lowered = config.lower();
//! assert_eq!(lowered.nodes.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------------------+
//! |                         Host application                        |
//! |        Config (DAG) --RPC--> Device --NDTP/UDP--> Stream sink   |
//! +-----------------------------------------------------------------+
//! |  config + node    |  device (RPC facade)  |  ndtp + transport   |
//! +-----------------------------------------------------------------+
//! |                 bitcodec + crc (bit-packed wire core)            |
//! +-----------------------------------------------------------------+
//! ```
//!
//! ## Modules overview
//!
//! - [`error`] - uniform `Status`/`StatusCode` result type, used everywhere
//! - [`bitcodec`] - arbitrary-bit-width integer pack/unpack, the wire core
//! - [`crc`] - CRC-16 frame integrity check
//! - [`ndtp`] - NDTP header/payload/message codec built on `bitcodec`/`crc`
//! - [`types`] - channel identity, channel masks, signal config, decoded records
//! - [`node`] - node catalog: tagged `Node`/`NodeKind`/`NodePayload`, factory dispatch
//! - [`config`] - the signal-chain DAG: node collection + connections + id assignment
//! - [`device`] - blocking device lifecycle client (info/configure/start/stop/...)
//! - [`transport`] - UDP stream source/sink and the packet monitor
//! - [`discovery`] - device discovery announcement parsing
//! - [`tap`] - opaque high-throughput tap client over a pub/sub transport

pub mod bitcodec;
pub mod config;
pub mod crc;
pub mod device;
pub mod discovery;
pub mod error;
pub mod ndtp;
pub mod node;
pub mod tap;
pub mod transport;
pub mod types;

pub use config::{Config, Connection, SerializedConfig};
pub use device::{Device, DeviceInfo, RpcTransport};
pub use discovery::{discover, DeviceAdvertisement};
pub use error::{Status, StatusCode, SynapseResult};
pub use ndtp::{DataType, NDTPHeader, NDTPMessage, NDTPPayload};
pub use node::{Node, NodeKind, NodePayload};
pub use tap::{Tap, TapConnection, TapRole, TapTransport};
pub use transport::{PacketMonitor, PacketStats, StreamSink, StreamSource};
pub use types::{BroadbandRecord, ChannelMask, ChannelSpec, Signal, SpiketrainRecord};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
