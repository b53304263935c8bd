// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NDTP frame header: version, data type, timestamp, sequence number.

use super::{DataType, NDTP_HEADER_SIZE, NDTP_VERSION};
use crate::error::{invalid_argument, SynapseResult};

/// Fixed 15-byte frame header.
///
/// Layout: `version(1) | data_type(1) | timestamp(8, native) |
/// seq_number(2, little-endian) | padding(3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NDTPHeader {
    pub data_type: u8,
    pub timestamp: u64,
    pub seq_number: u16,
}

impl NDTPHeader {
    pub fn new(data_type: DataType, timestamp: u64, seq_number: u16) -> Self {
        NDTPHeader {
            data_type: data_type as u8,
            timestamp,
            seq_number,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_u8(self.data_type)
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut buf = vec![0u8; NDTP_HEADER_SIZE];
        buf[0] = NDTP_VERSION;
        buf[1] = self.data_type;
        buf[2..10].copy_from_slice(&self.timestamp.to_ne_bytes());
        buf[10..12].copy_from_slice(&self.seq_number.to_le_bytes());
        // bytes 12..15 are zero padding, already zero-initialized.
        buf
    }

    pub fn unpack(data: &[u8]) -> SynapseResult<Self> {
        if data.len() < NDTP_HEADER_SIZE {
            return Err(invalid_argument(format!(
                "invalid header size: expected at least {} bytes, got {}",
                NDTP_HEADER_SIZE,
                data.len()
            )));
        }

        let version = data[0];
        if version != NDTP_VERSION {
            return Err(invalid_argument(format!(
                "incompatible version: expected {}, got {}",
                NDTP_VERSION, version
            )));
        }

        let data_type = data[1];
        let timestamp = u64::from_ne_bytes(data[2..10].try_into().unwrap());
        let seq_number = u16::from_le_bytes(data[10..12].try_into().unwrap());

        Ok(NDTPHeader {
            data_type,
            timestamp,
            seq_number,
        })
    }
}
