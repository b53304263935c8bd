// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NDTP payload variants: broadband samples and binned spike counts.

use crate::bitcodec;
use crate::error::{internal, invalid_argument, SynapseResult};

/// One channel's worth of broadband samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NDTPPayloadBroadbandChannel {
    pub channel_id: u32,
    pub samples: Vec<i64>,
}

/// Broadband (continuous voltage) payload.
///
/// Byte layout:
/// - byte 0: `(bit_width << 1) | is_signed`
/// - bytes 1..4: channel count, 24-bit big-endian
/// - bytes 4..6: sample_rate, 16-bit big-endian
/// - per channel: 3-byte big-endian channel_id, 2-byte big-endian sample
///   count, then `ceil(sample_count * bit_width / 8)` bytes of samples
///   packed big-endian bit order at the declared bit width/signedness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NDTPPayloadBroadband {
    pub is_signed: bool,
    pub bit_width: u32,
    pub sample_rate: u16,
    pub channels: Vec<NDTPPayloadBroadbandChannel>,
}

impl NDTPPayloadBroadband {
    pub fn pack(&self) -> SynapseResult<Vec<u8>> {
        if self.bit_width == 0 || self.bit_width > 0x7F {
            return Err(invalid_argument("broadband bit_width must be in 1..=127"));
        }
        if self.channels.len() > 0x00FF_FFFF {
            return Err(invalid_argument("too many channels for 24-bit count field"));
        }

        let mut buf = Vec::with_capacity(6 + self.channels.len() * 5);
        buf.push(((self.bit_width & 0x7F) as u8) << 1 | (self.is_signed as u8));

        let n_channels = self.channels.len() as u32;
        buf.push(((n_channels >> 16) & 0xFF) as u8);
        buf.push(((n_channels >> 8) & 0xFF) as u8);
        buf.push((n_channels & 0xFF) as u8);

        buf.push(((self.sample_rate >> 8) & 0xFF) as u8);
        buf.push((self.sample_rate & 0xFF) as u8);

        for channel in &self.channels {
            if channel.channel_id > 0x00FF_FFFF {
                return Err(invalid_argument("channel_id does not fit in 24 bits"));
            }
            if channel.samples.len() > 0xFFFF {
                return Err(invalid_argument("too many samples for 16-bit count field"));
            }

            buf.push(((channel.channel_id >> 16) & 0xFF) as u8);
            buf.push(((channel.channel_id >> 8) & 0xFF) as u8);
            buf.push((channel.channel_id & 0xFF) as u8);

            let num_samples = channel.samples.len() as u16;
            buf.push(((num_samples >> 8) & 0xFF) as u8);
            buf.push((num_samples & 0xFF) as u8);

            let (sample_bytes, _off) = bitcodec::pack(
                &channel.samples,
                self.bit_width,
                &[],
                0,
                self.is_signed,
                true,
            )?;
            buf.extend_from_slice(&sample_bytes);
        }

        Ok(buf)
    }

    pub fn unpack(data: &[u8]) -> SynapseResult<Self> {
        if data.len() < 6 {
            return Err(internal("invalid data size for broadband payload"));
        }

        let bit_width = (data[0] >> 1) as u32;
        let is_signed = (data[0] & 1) == 1;
        let num_channels =
            ((data[1] as u32) << 16) | ((data[2] as u32) << 8) | data[3] as u32;
        let sample_rate = ((data[4] as u16) << 8) | data[5] as u16;

        let mut channels = Vec::with_capacity(num_channels as usize);
        let mut offset = 6usize;
        for _ in 0..num_channels {
            if offset + 3 > data.len() {
                return Err(internal("incomplete data for channel_id"));
            }
            let channel_id = ((data[offset] as u32) << 16)
                | ((data[offset + 1] as u32) << 8)
                | data[offset + 2] as u32;
            offset += 3;

            if offset + 2 > data.len() {
                return Err(internal("incomplete data for sample count"));
            }
            let num_samples = ((data[offset] as u16) << 8) | data[offset + 1] as u16;
            offset += 2;

            let num_bytes = ((num_samples as u64 * bit_width as u64) + 7) / 8;
            let num_bytes = num_bytes as usize;
            if offset + num_bytes > data.len() {
                return Err(internal("incomplete data for channel samples"));
            }
            let channel_bytes = &data[offset..offset + num_bytes];
            offset += num_bytes;

            let (samples, _end_bit, _trimmed) = bitcodec::unpack(
                channel_bytes,
                bit_width,
                num_samples as u32,
                0,
                is_signed,
                true,
            )?;
            channels.push(NDTPPayloadBroadbandChannel {
                channel_id,
                samples,
            });
        }

        Ok(NDTPPayloadBroadband {
            is_signed,
            bit_width,
            sample_rate,
            channels,
        })
    }
}

/// Fixed bit width for spike-count bins, per wire format.
pub const SPIKETRAIN_BIT_WIDTH: u32 = 2;

/// Binned spike-count payload.
///
/// Byte layout: `count(4, little-endian) || packed 2-bit counts
/// (big-endian bit order, unsigned, clamped to 3 on pack)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NDTPPayloadSpiketrain {
    pub spike_counts: Vec<i64>,
}

impl NDTPPayloadSpiketrain {
    pub fn pack(&self) -> SynapseResult<Vec<u8>> {
        let clamp_value: i64 = (1i64 << SPIKETRAIN_BIT_WIDTH) - 1;
        let clamped: Vec<i64> = self
            .spike_counts
            .iter()
            .map(|&c| c.min(clamp_value))
            .collect();

        let num_counts = clamped.len() as u32;
        let mut result = Vec::with_capacity(4);
        result.extend_from_slice(&num_counts.to_le_bytes());

        let (bytes, _off) =
            bitcodec::pack(&clamped, SPIKETRAIN_BIT_WIDTH, &[], 0, false, true)?;
        result.extend_from_slice(&bytes);
        Ok(result)
    }

    pub fn unpack(data: &[u8]) -> SynapseResult<Self> {
        if data.len() < 4 {
            return Err(internal("invalid data size for spiketrain payload"));
        }
        let num_counts = u32::from_le_bytes(data[0..4].try_into().unwrap());

        let bits_needed = num_counts as u64 * SPIKETRAIN_BIT_WIDTH as u64;
        let bytes_needed = ((bits_needed + 7) / 8) as usize;
        let payload = &data[4..];
        if payload.len() < bytes_needed {
            return Err(internal("insufficient data for spike_counts"));
        }
        let payload = &payload[..bytes_needed];

        let (spike_counts, _end, _trim) = bitcodec::unpack(
            payload,
            SPIKETRAIN_BIT_WIDTH,
            num_counts,
            0,
            false,
            true,
        )?;
        Ok(NDTPPayloadSpiketrain { spike_counts })
    }
}

/// Tagged payload variant carried by an [`crate::ndtp::NDTPMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NDTPPayload {
    Broadband(NDTPPayloadBroadband),
    Spiketrain(NDTPPayloadSpiketrain),
}

impl NDTPPayload {
    pub fn pack(&self) -> SynapseResult<Vec<u8>> {
        match self {
            NDTPPayload::Broadband(p) => p.pack(),
            NDTPPayload::Spiketrain(p) => p.pack(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadband_round_trip() {
        let payload = NDTPPayloadBroadband {
            is_signed: false,
            bit_width: 12,
            sample_rate: 3,
            channels: vec![
                NDTPPayloadBroadbandChannel {
                    channel_id: 0,
                    samples: vec![1, 2, 3],
                },
                NDTPPayloadBroadbandChannel {
                    channel_id: 1,
                    samples: vec![4, 5, 6],
                },
                NDTPPayloadBroadbandChannel {
                    channel_id: 2,
                    samples: vec![3000, 2000, 1000],
                },
            ],
        };
        let packed = payload.pack().unwrap();
        let unpacked = NDTPPayloadBroadband::unpack(&packed).unwrap();
        assert_eq!(unpacked, payload);
    }

    #[test]
    fn spiketrain_clamps_counts_above_three() {
        let payload = NDTPPayloadSpiketrain {
            spike_counts: vec![1, 2, 3, 4, 5],
        };
        let packed = payload.pack().unwrap();
        let unpacked = NDTPPayloadSpiketrain::unpack(&packed).unwrap();
        assert_eq!(unpacked.spike_counts, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    fn broadband_unpack_rejects_truncated_channel_data() {
        let err = NDTPPayloadBroadband::unpack(&[0, 0, 0, 1, 0, 0]).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::Internal);
    }

    #[test]
    fn spiketrain_unpack_rejects_short_buffer() {
        let err = NDTPPayloadSpiketrain::unpack(&[1, 2]).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::Internal);
    }
}
