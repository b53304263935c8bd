// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! High-level data types: channel identity, channel masks, signal
//! configuration, and the decoded record types exposed to the host.

use std::collections::BTreeSet;

use crate::error::{invalid_argument, SynapseResult};

/// Identifies one recording channel and its electrode/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSpec {
    pub id: u64,
    pub electrode_id: u64,
    pub reference_id: u64,
}

/// A finite set of unsigned channel indices. Canonical representation is
/// a sorted, deduplicated set; equality is set-equality regardless of
/// construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMask {
    channels: BTreeSet<u32>,
}

impl ChannelMask {
    pub fn new() -> Self {
        ChannelMask::default()
    }

    /// Builds a canonical mask from a raw (possibly unsorted, possibly
    /// duplicated) index list.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        ChannelMask {
            channels: indices.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, channel: u32) -> bool {
        self.channels.insert(channel)
    }

    pub fn contains(&self, channel: u32) -> bool {
        self.channels.contains(&channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterates channel indices in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.channels.iter().copied()
    }

    /// Serialized form: the sorted index list. Any permutation of this
    /// list parses back to the same canonical mask.
    pub fn to_indices(&self) -> Vec<u32> {
        self.channels.iter().copied().collect()
    }
}

/// Tagged signal configuration: exactly one of electrode or pixel.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Electrodes {
        channels: Vec<ChannelSpec>,
        low_cutoff_hz: f32,
        high_cutoff_hz: f32,
    },
    Pixels {
        pixel_mask: Vec<u32>,
    },
}

/// Serialized shape of [`Signal`]: at most one of `electrode`/`pixel` is
/// `Some`. Used at the translation boundary to/from a wire envelope.
#[derive(Debug, Clone, Default)]
pub struct SerializedSignal {
    pub electrode: Option<(Vec<ChannelSpec>, f32, f32)>,
    pub pixel: Option<Vec<u32>>,
}

impl Signal {
    pub fn to_serialized(&self) -> SerializedSignal {
        match self {
            Signal::Electrodes {
                channels,
                low_cutoff_hz,
                high_cutoff_hz,
            } => SerializedSignal {
                electrode: Some((channels.clone(), *low_cutoff_hz, *high_cutoff_hz)),
                pixel: None,
            },
            Signal::Pixels { pixel_mask } => SerializedSignal {
                electrode: None,
                pixel: Some(pixel_mask.clone()),
            },
        }
    }

    pub fn from_serialized(serialized: &SerializedSignal) -> SynapseResult<Self> {
        match (&serialized.electrode, &serialized.pixel) {
            (Some((channels, low, high)), None) => Ok(Signal::Electrodes {
                channels: channels.clone(),
                low_cutoff_hz: *low,
                high_cutoff_hz: *high,
            }),
            (None, Some(pixel_mask)) => Ok(Signal::Pixels {
                pixel_mask: pixel_mask.clone(),
            }),
            (None, None) => Err(invalid_argument(
                "signal config must set exactly one of electrode or pixel",
            )),
            (Some(_), Some(_)) => Err(invalid_argument(
                "signal config must not set both electrode and pixel",
            )),
        }
    }
}

/// Decoded broadband record exposed to the host, carrying the header's
/// timestamp alongside the payload fields.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadbandRecord {
    pub t0: u64,
    pub is_signed: bool,
    pub bit_width: u32,
    pub sample_rate: u16,
    pub channels: Vec<(u32, Vec<i64>)>,
}

/// Decoded spiketrain (binned) record exposed to the host.
///
/// `bin_size_ms` is carried on the decoded record only; the legacy wire
/// payload has no byte-layout field for it (open question in the source
/// spec, resolved here by never assuming its presence on the wire).
#[derive(Debug, Clone, PartialEq)]
pub struct SpiketrainRecord {
    pub t0: u64,
    pub bin_size_ms: Option<u32>,
    pub spike_counts: Vec<i64>,
}
