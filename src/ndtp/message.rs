// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Framed NDTP message: header || payload || CRC-16.

use super::header::NDTPHeader;
use super::payload::{NDTPPayload, NDTPPayloadBroadband, NDTPPayloadSpiketrain};
use super::{DataType, NDTP_HEADER_SIZE};
use crate::crc;
use crate::error::{data_loss, invalid_argument, unimplemented, SynapseResult};

/// A complete NDTP frame: header, typed payload, and the CRC-16 computed
/// over `header_bytes || payload_bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NDTPMessage {
    pub header: NDTPHeader,
    pub payload: NDTPPayload,
}

impl NDTPMessage {
    pub fn new(header: NDTPHeader, payload: NDTPPayload) -> Self {
        NDTPMessage { header, payload }
    }

    pub fn pack(&self) -> SynapseResult<Vec<u8>> {
        let mut result = self.header.pack();
        result.extend_from_slice(&self.payload.pack()?);

        let checksum = crc::crc16(&result);
        result.extend_from_slice(&checksum.to_le_bytes());
        Ok(result)
    }

    pub fn unpack(data: &[u8]) -> SynapseResult<Self> {
        if data.len() < NDTP_HEADER_SIZE + 2 {
            return Err(invalid_argument("invalid data size for NDTP message"));
        }

        let received_crc =
            u16::from_le_bytes(data[data.len() - 2..].try_into().unwrap());
        let frame = &data[..data.len() - 2];
        if !crc::crc16_verify(frame, received_crc) {
            log::debug!("[ndtp] CRC verification failed");
            return Err(data_loss("CRC verification failed"));
        }

        let header = NDTPHeader::unpack(&data[..NDTP_HEADER_SIZE])?;
        let payload_bytes = &frame[NDTP_HEADER_SIZE..];

        let payload = match header.data_type() {
            Some(DataType::Broadband) => {
                NDTPPayload::Broadband(NDTPPayloadBroadband::unpack(payload_bytes)?)
            }
            Some(DataType::Spiketrain) => {
                NDTPPayload::Spiketrain(NDTPPayloadSpiketrain::unpack(payload_bytes)?)
            }
            None => {
                return Err(unimplemented(format!(
                    "unsupported data_type {} in NDTP header",
                    header.data_type
                )))
            }
        };

        Ok(NDTPMessage { header, payload })
    }
}
