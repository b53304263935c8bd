// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal-chain configuration DAG: a node collection plus a connection
//! list, with id assignment, connection validation, and bidirectional
//! translation to/from a serialized `DeviceConfiguration`.
//!
//! Grounded on the source's `Config` (`add`/`add_node`/`connect`/
//! `to_proto`/`gen_node_id`), translated to value semantics: nothing
//! outside `Config` holds a live reference to a `Node` once added, so
//! there is no `shared_ptr`/`weak_ptr` here, only stable integer ids.

use crate::error::{invalid_argument, SynapseResult};
use crate::node::{self, Node, SerializedNode};

/// Ordered pair of node ids: `src_id -> dst_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub src_id: u32,
    pub dst_id: u32,
}

/// Wire form of a [`Config`]: node envelopes and connection pairs, both
/// in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedConfig {
    pub nodes: Vec<SerializedNode>,
    pub connections: Vec<(u32, u32)>,
}

/// The host-side signal-chain configuration: a node collection and its
/// connection list, built up before transmission to the device.
#[derive(Debug, Clone, Default)]
pub struct Config {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Adds a node to the configuration.
    ///
    /// If `node.id == 0`, assigns a fresh id (`nodes.len() + 1`).
    /// Fails if the node already carries a non-zero id
    /// (`already has an id`), or if the chosen id collides with an
    /// existing node (`id already in use`) — reachable once `add_with_id`
    /// has placed a node at an id beyond the current node count.
    pub fn add(&mut self, mut node: Node) -> SynapseResult<u32> {
        if node.id != 0 {
            return Err(invalid_argument("node already has an id"));
        }

        let assigned = (self.nodes.len() + 1) as u32;
        if self.nodes.iter().any(|n| n.id == assigned) {
            return Err(invalid_argument("id already in use"));
        }

        node.id = assigned;
        self.nodes.push(node);
        Ok(assigned)
    }

    /// Adds a node with an explicit id (used when reconstructing from a
    /// serialized form, where ids must be preserved rather than
    /// reassigned).
    pub fn add_with_id(&mut self, mut node: Node, id: u32) -> SynapseResult<()> {
        if id == 0 {
            return Err(invalid_argument("explicit id must be non-zero"));
        }
        if self.nodes.iter().any(|n| n.id == id) {
            return Err(invalid_argument("id already in use"));
        }
        node.id = id;
        self.nodes.push(node);
        Ok(())
    }

    /// Adds multiple nodes, assigning each a fresh id.
    pub fn add_many(&mut self, nodes: impl IntoIterator<Item = Node>) -> SynapseResult<Vec<u32>> {
        let mut ids = Vec::new();
        for node in nodes {
            ids.push(self.add(node)?);
        }
        Ok(ids)
    }

    /// Connects the output of `src` to the input of `dst`. Both nodes
    /// must already be present with non-zero ids; duplicate `(src, dst)`
    /// edges are rejected. No cycle or self-loop validation is performed
    /// here — the device rejects those.
    pub fn connect(&mut self, src_id: u32, dst_id: u32) -> SynapseResult<()> {
        if src_id == 0 || dst_id == 0 {
            return Err(invalid_argument("connection endpoints must have non-zero ids"));
        }
        if !self.nodes.iter().any(|n| n.id == src_id) {
            return Err(invalid_argument(format!("unknown src node id {}", src_id)));
        }
        if !self.nodes.iter().any(|n| n.id == dst_id) {
            return Err(invalid_argument(format!("unknown dst node id {}", dst_id)));
        }
        if self
            .connections
            .iter()
            .any(|c| c.src_id == src_id && c.dst_id == dst_id)
        {
            return Err(invalid_argument(format!(
                "connection ({}, {}) already exists",
                src_id, dst_id
            )));
        }

        self.connections.push(Connection { src_id, dst_id });
        Ok(())
    }

    /// Emits a serialized `DeviceConfiguration`: node envelopes and
    /// connection pairs, both in insertion order.
    pub fn lower(&self) -> SerializedConfig {
        SerializedConfig {
            nodes: self.nodes.iter().map(node::lower).collect(),
            connections: self.connections.iter().map(|c| (c.src_id, c.dst_id)).collect(),
        }
    }

    /// Reconstructs a `Config` from a serialized form: nodes through the
    /// factory (preserving each envelope's id), then connections,
    /// failing if either endpoint id is unknown.
    pub fn from_serialized(serialized: &SerializedConfig) -> SynapseResult<Self> {
        let mut config = Config::new();
        for env in &serialized.nodes {
            let node = node::from_serialized(env)?;
            let id = env.id;
            config.add_with_id(node, id)?;
        }
        for &(src_id, dst_id) in &serialized.connections {
            config.connect(src_id, dst_id)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodePayload;

    fn source_node() -> Node {
        Node::new(NodePayload::BroadbandSource {
            channels: vec![0, 1, 2],
        })
    }

    fn sink_node() -> Node {
        Node::new(NodePayload::StreamOut {
            host: "0.0.0.0".to_string(),
            port: 50038,
        })
    }

    #[test]
    fn add_assigns_unique_positive_ids() {
        let mut config = Config::new();
        let id1 = config.add(source_node()).unwrap();
        let id2 = config.add(sink_node()).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
    }

    #[test]
    fn add_rejects_node_with_existing_id() {
        let mut config = Config::new();
        let mut node = source_node();
        node.id = 5;
        let err = config.add(node).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn add_with_id_rejects_collision() {
        let mut config = Config::new();
        config.add_with_id(source_node(), 3).unwrap();
        let err = config.add_with_id(sink_node(), 3).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn add_rejects_auto_assigned_id_colliding_with_explicit_one() {
        let mut config = Config::new();
        config.add_with_id(source_node(), 2).unwrap();
        // nodes.len() == 1, so the next auto-assigned id would be 2, which
        // is already in use by the node added above.
        let err = config.add(sink_node()).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn connect_twice_rejects_duplicate_edge() {
        let mut config = Config::new();
        let src = config.add(source_node()).unwrap();
        let dst = config.add(sink_node()).unwrap();
        config.connect(src, dst).unwrap();
        let err = config.connect(src, dst).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn connect_rejects_unknown_endpoint() {
        let mut config = Config::new();
        let src = config.add(source_node()).unwrap();
        let err = config.connect(src, 999).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn lower_then_from_serialized_round_trips() {
        let mut config = Config::new();
        let src = config.add(source_node()).unwrap();
        let dst = config.add(sink_node()).unwrap();
        config.connect(src, dst).unwrap();

        let serialized = config.lower();
        let rebuilt = Config::from_serialized(&serialized).unwrap();

        assert_eq!(rebuilt.nodes().len(), 2);
        assert_eq!(rebuilt.connections().len(), 1);
        assert_eq!(rebuilt.connections()[0].src_id, src);
        assert_eq!(rebuilt.connections()[0].dst_id, dst);
    }
}
