// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node catalog: a single tagged-variant `Node` type standing in for the
//! source's per-kind virtual-dispatch subclasses (see Design Notes §9 —
//! shared-ownership pointers between nodes and a Config become value
//! semantics plus stable integer ids; the polymorphic `Node` hierarchy
//! becomes one struct carrying a closed `NodeKind` tag).

use crate::error::{invalid_argument, SynapseResult};

/// Closed enumeration of node kinds known to the client. Supplemented
/// from the device SDK's node catalog (broadband/spike sources,
/// stimulation sinks, filters, detectors, binners, disk writer, stream
/// endpoints) beyond what the distilled wire spec names explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    BroadbandSource,
    SpikeSource,
    ElectricalStim,
    OpticalStim,
    SpectralFilter,
    SpikeDetector,
    SpikeBinner,
    DiskWriter,
    StreamIn,
    StreamOut,
}

impl NodeKind {
    fn as_str(self) -> &'static str {
        match self {
            NodeKind::BroadbandSource => "broadband_source",
            NodeKind::SpikeSource => "spike_source",
            NodeKind::ElectricalStim => "electrical_stim",
            NodeKind::OpticalStim => "optical_stim",
            NodeKind::SpectralFilter => "spectral_filter",
            NodeKind::SpikeDetector => "spike_detector",
            NodeKind::SpikeBinner => "spike_binner",
            NodeKind::DiskWriter => "disk_writer",
            NodeKind::StreamIn => "stream_in",
            NodeKind::StreamOut => "stream_out",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "broadband_source" => Some(NodeKind::BroadbandSource),
            "spike_source" => Some(NodeKind::SpikeSource),
            "electrical_stim" => Some(NodeKind::ElectricalStim),
            "optical_stim" => Some(NodeKind::OpticalStim),
            "spectral_filter" => Some(NodeKind::SpectralFilter),
            "spike_detector" => Some(NodeKind::SpikeDetector),
            "spike_binner" => Some(NodeKind::SpikeBinner),
            "disk_writer" => Some(NodeKind::DiskWriter),
            "stream_in" => Some(NodeKind::StreamIn),
            "stream_out" => Some(NodeKind::StreamOut),
            _ => None,
        }
    }
}

/// Kind-specific opaque payload fields. These are passed through
/// untouched by the config translator (Non-goal: no validation of their
/// domain meaning), but must exist so a round trip through
/// `lower`/`from_serialized` preserves real data.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    BroadbandSource {
        channels: Vec<u32>,
    },
    SpikeSource {
        channels: Vec<u32>,
    },
    ElectricalStim {
        channels: Vec<u32>,
    },
    OpticalStim {
        channels: Vec<u32>,
    },
    SpectralFilter {
        low_cutoff_hz: f32,
        high_cutoff_hz: f32,
    },
    SpikeDetector {
        threshold: f32,
    },
    SpikeBinner {
        bin_size_ms: u32,
    },
    DiskWriter {
        path: String,
    },
    StreamIn {
        host: String,
        port: u16,
    },
    StreamOut {
        host: String,
        port: u16,
    },
}

impl NodePayload {
    fn kind(&self) -> NodeKind {
        match self {
            NodePayload::BroadbandSource { .. } => NodeKind::BroadbandSource,
            NodePayload::SpikeSource { .. } => NodeKind::SpikeSource,
            NodePayload::ElectricalStim { .. } => NodeKind::ElectricalStim,
            NodePayload::OpticalStim { .. } => NodeKind::OpticalStim,
            NodePayload::SpectralFilter { .. } => NodeKind::SpectralFilter,
            NodePayload::SpikeDetector { .. } => NodeKind::SpikeDetector,
            NodePayload::SpikeBinner { .. } => NodeKind::SpikeBinner,
            NodePayload::DiskWriter { .. } => NodeKind::DiskWriter,
            NodePayload::StreamIn { .. } => NodeKind::StreamIn,
            NodePayload::StreamOut { .. } => NodeKind::StreamOut,
        }
    }
}

/// A node in a device's signal chain: identity plus a kind-tagged payload.
///
/// Invariant: once assigned by a `Config`, `id` is immutable for the
/// node's lifetime within that `Config`. `id == 0` means unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u32,
    pub payload: NodePayload,
}

impl Node {
    pub fn new(payload: NodePayload) -> Self {
        Node { id: 0, payload }
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }
}

/// Wire envelope for a single node: id, kind tag, and exactly one
/// populated variant field (modeled here as a flat serializable struct
/// rather than a union, matching how the device's DeviceConfiguration
/// envelope lays out node entries).
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedNode {
    pub id: u32,
    pub kind: String,
    pub channels: Option<Vec<u32>>,
    pub low_cutoff_hz: Option<f32>,
    pub high_cutoff_hz: Option<f32>,
    pub threshold: Option<f32>,
    pub bin_size_ms: Option<u32>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Lowers a node's payload into the serialized envelope, setting exactly
/// the variant fields its kind requires.
pub fn lower(node: &Node) -> SerializedNode {
    let mut env = SerializedNode {
        id: node.id,
        kind: node.kind().as_str().to_string(),
        channels: None,
        low_cutoff_hz: None,
        high_cutoff_hz: None,
        threshold: None,
        bin_size_ms: None,
        path: None,
        host: None,
        port: None,
    };

    match &node.payload {
        NodePayload::BroadbandSource { channels }
        | NodePayload::SpikeSource { channels }
        | NodePayload::ElectricalStim { channels }
        | NodePayload::OpticalStim { channels } => {
            env.channels = Some(channels.clone());
        }
        NodePayload::SpectralFilter {
            low_cutoff_hz,
            high_cutoff_hz,
        } => {
            env.low_cutoff_hz = Some(*low_cutoff_hz);
            env.high_cutoff_hz = Some(*high_cutoff_hz);
        }
        NodePayload::SpikeDetector { threshold } => {
            env.threshold = Some(*threshold);
        }
        NodePayload::SpikeBinner { bin_size_ms } => {
            env.bin_size_ms = Some(*bin_size_ms);
        }
        NodePayload::DiskWriter { path } => {
            env.path = Some(path.clone());
        }
        NodePayload::StreamIn { host, port } | NodePayload::StreamOut { host, port } => {
            env.host = Some(host.clone());
            env.port = Some(*port);
        }
    }

    env
}

/// Central factory: dispatches on `kind` and reconstructs the node,
/// validating that the expected variant field is present. Unknown `kind`
/// -> `invalid_argument`. The set of kinds is closed and known at build
/// time; this match is exhaustive over [`NodeKind`].
pub fn from_serialized(env: &SerializedNode) -> SynapseResult<Node> {
    let kind = NodeKind::from_str(&env.kind)
        .ok_or_else(|| invalid_argument(format!("unknown node kind '{}'", env.kind)))?;

    let missing = |field: &str| invalid_argument(format!("node envelope missing '{}'", field));

    let payload = match kind {
        NodeKind::BroadbandSource => NodePayload::BroadbandSource {
            channels: env.channels.clone().ok_or_else(|| missing("channels"))?,
        },
        NodeKind::SpikeSource => NodePayload::SpikeSource {
            channels: env.channels.clone().ok_or_else(|| missing("channels"))?,
        },
        NodeKind::ElectricalStim => NodePayload::ElectricalStim {
            channels: env.channels.clone().ok_or_else(|| missing("channels"))?,
        },
        NodeKind::OpticalStim => NodePayload::OpticalStim {
            channels: env.channels.clone().ok_or_else(|| missing("channels"))?,
        },
        NodeKind::SpectralFilter => NodePayload::SpectralFilter {
            low_cutoff_hz: env.low_cutoff_hz.ok_or_else(|| missing("low_cutoff_hz"))?,
            high_cutoff_hz: env
                .high_cutoff_hz
                .ok_or_else(|| missing("high_cutoff_hz"))?,
        },
        NodeKind::SpikeDetector => NodePayload::SpikeDetector {
            threshold: env.threshold.ok_or_else(|| missing("threshold"))?,
        },
        NodeKind::SpikeBinner => NodePayload::SpikeBinner {
            bin_size_ms: env.bin_size_ms.ok_or_else(|| missing("bin_size_ms"))?,
        },
        NodeKind::DiskWriter => NodePayload::DiskWriter {
            path: env.path.clone().ok_or_else(|| missing("path"))?,
        },
        NodeKind::StreamIn => NodePayload::StreamIn {
            host: env.host.clone().ok_or_else(|| missing("host"))?,
            port: env.port.ok_or_else(|| missing("port"))?,
        },
        NodeKind::StreamOut => NodePayload::StreamOut {
            host: env.host.clone().ok_or_else(|| missing("host"))?,
            port: env.port.ok_or_else(|| missing("port"))?,
        },
    };

    Ok(Node {
        id: env.id,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_then_reconstruct_round_trips() {
        let mut node = Node::new(NodePayload::SpectralFilter {
            low_cutoff_hz: 300.0,
            high_cutoff_hz: 6000.0,
        });
        node.id = 7;

        let env = lower(&node);
        assert_eq!(env.kind, "spectral_filter");
        let rebuilt = from_serialized(&env).unwrap();
        assert_eq!(rebuilt, node);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let env = SerializedNode {
            id: 1,
            kind: "not_a_real_kind".to_string(),
            channels: None,
            low_cutoff_hz: None,
            high_cutoff_hz: None,
            threshold: None,
            bin_size_ms: None,
            path: None,
            host: None,
            port: None,
        };
        let err = from_serialized(&env).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn missing_variant_field_is_rejected() {
        let env = SerializedNode {
            id: 1,
            kind: "disk_writer".to_string(),
            channels: None,
            low_cutoff_hz: None,
            high_cutoff_hz: None,
            threshold: None,
            bin_size_ms: None,
            path: None,
            host: None,
            port: None,
        };
        let err = from_serialized(&env).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }
}
