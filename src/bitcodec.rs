// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-level pack/unpack of arbitrary-width signed/unsigned integers.
//!
//! These two primitives are the foundation of the NDTP wire codec: every
//! sample, channel count, and spike bin is a run of `bit_width`-wide
//! integers packed back to back, possibly continuing from a bit offset
//! left over by a previous call.

use crate::error::{invalid_argument, SynapseResult};

/// Appends each value in `values` as `bit_width` bits onto `existing`,
/// starting at `starting_bit_offset` bits into the buffer's last byte.
///
/// Returns the extended buffer and the new ending bit offset (`0..8`).
///
/// `big_endian` selects bit order within each byte: when `true`, the
/// most-significant bit of each value lands on the most-significant free
/// bit of the current byte (advancing MSB -> LSB through the byte); when
/// `false`, the mirror image (LSB first).
pub fn pack(
    values: &[i64],
    bit_width: u32,
    existing: &[u8],
    starting_bit_offset: u32,
    is_signed: bool,
    big_endian: bool,
) -> SynapseResult<(Vec<u8>, u32)> {
    if bit_width == 0 || bit_width > 63 {
        return Err(invalid_argument("bit width must be in 1..=63"));
    }

    let (min_value, max_value) = value_range(bit_width, is_signed);
    for &v in values {
        if v < min_value || v > max_value {
            return Err(invalid_argument(format!(
                "value {} cannot be represented in {} bits",
                v, bit_width
            )));
        }
    }

    let num_bits_to_write = values.len() as u64 * bit_width as u64;
    let bit_offset_start = if existing.is_empty() {
        0u64
    } else {
        (existing.len() as u64 - 1) * 8 + starting_bit_offset as u64
    };
    let total_bits_needed = bit_offset_start + num_bits_to_write;
    let total_bytes_needed = ((total_bits_needed + 7) / 8) as usize;

    let mut result = vec![0u8; total_bytes_needed];
    if !existing.is_empty() {
        result[..existing.len()].copy_from_slice(existing);
    }

    let mut bit_offset = bit_offset_start;
    for &value in values {
        let value_unsigned: u64 = if is_signed && value < 0 {
            ((1i64 << bit_width) + value) as u64
        } else {
            value as u64
        };

        let mut bits_remaining = bit_width;
        while bits_remaining > 0 {
            let byte_index = (bit_offset / 8) as usize;
            let bit_index = (bit_offset % 8) as u32;
            let bits_in_current_byte = (8 - bit_index).min(bits_remaining);
            let shift = bits_remaining - bits_in_current_byte;

            let bits_to_write = ((value_unsigned >> shift)
                & ((1u64 << bits_in_current_byte) - 1)) as u8;
            let shifted = if big_endian {
                bits_to_write << (8 - bit_index - bits_in_current_byte)
            } else {
                bits_to_write << bit_index
            };

            result[byte_index] |= shifted;
            bits_remaining -= bits_in_current_byte;
            bit_offset += bits_in_current_byte as u64;
        }
    }

    let final_bit_offset = (bit_offset % 8) as u32;
    if final_bit_offset == 0 && total_bytes_needed < result.len() {
        result.truncate(total_bytes_needed);
    }

    Ok((result, final_bit_offset))
}

/// Inverse of [`pack`]. `count = 0` means "consume the whole buffer";
/// otherwise reads exactly `count` values and stops early.
///
/// Returns the decoded values, the ending bit offset, and the
/// (start-trimmed) slice of `data` that was actually read from.
pub fn unpack(
    data: &[u8],
    bit_width: u32,
    count: u32,
    starting_bit_offset: u32,
    is_signed: bool,
    big_endian: bool,
) -> SynapseResult<(Vec<i64>, u32, Vec<u8>)> {
    if bit_width == 0 || bit_width > 63 {
        return Err(invalid_argument("bit width must be in 1..=63"));
    }

    let truncate_bytes = (starting_bit_offset / 8) as usize;
    let start_bit = starting_bit_offset % 8;
    if truncate_bytes > data.len() {
        return Err(invalid_argument("starting bit offset past end of buffer"));
    }
    let truncated: Vec<u8> = data[truncate_bytes..].to_vec();
    let data_len = truncated.len();

    if count > 0 {
        let needed_bytes = ((bit_width as u64 * count as u64) + 7) / 8;
        if (data_len as u64) < needed_bytes {
            return Err(invalid_argument(format!(
                "insufficient data for {} x {} bit values (expected {} bytes, given {} bytes)",
                count, bit_width, needed_bytes, data_len
            )));
        }
    }

    let mask: i64 = (1i64 << bit_width) - 1;
    let sign_bit: i64 = 1i64 << (bit_width - 1);
    let max_values = if count > 0 {
        count as usize
    } else {
        (data_len * 8) / bit_width as usize
    };

    let mut values = Vec::with_capacity(max_values);
    let mut current_value: i64 = 0;
    let mut bits_in_current_value: u32 = 0;
    let mut total_bits_read: u32 = 0;

    'outer: for (byte_index, &byte) in truncated.iter().enumerate() {
        let start = if byte_index == 0 { start_bit } else { 0 };
        if big_endian {
            for bit_index in (0..=(7i32 - start as i32)).rev() {
                let bit = (byte >> bit_index) & 1;
                current_value = (current_value << 1) | bit as i64;
                bits_in_current_value += 1;
                total_bits_read += 1;

                if bits_in_current_value == bit_width {
                    push_value(
                        &mut values,
                        &mut current_value,
                        &mut bits_in_current_value,
                        is_signed,
                        sign_bit,
                        mask,
                        bit_width,
                    );
                    if count > 0 && values.len() == count as usize {
                        break 'outer;
                    }
                }
            }
        } else {
            for bit_index in start..8 {
                let bit = (byte >> bit_index) & 1;
                current_value |= (bit as i64) << bits_in_current_value;
                bits_in_current_value += 1;
                total_bits_read += 1;

                if bits_in_current_value == bit_width {
                    push_value(
                        &mut values,
                        &mut current_value,
                        &mut bits_in_current_value,
                        is_signed,
                        sign_bit,
                        mask,
                        bit_width,
                    );
                    if count > 0 && values.len() == count as usize {
                        break 'outer;
                    }
                }
            }
        }
    }

    if count > 0 && values.len() < count as usize {
        return Err(invalid_argument(format!(
            "insufficient data for {} x {} bit values",
            count, bit_width
        )));
    }

    if count == 0 && bits_in_current_value > 0 {
        return Err(invalid_argument(format!(
            "{} bits left over, not enough to form a complete value of bit width {}",
            bits_in_current_value, bit_width
        )));
    }

    let end_bit = starting_bit_offset + total_bits_read;
    Ok((values, end_bit % 8, truncated))
}

fn push_value(
    values: &mut Vec<i64>,
    current_value: &mut i64,
    bits_in_current_value: &mut u32,
    is_signed: bool,
    sign_bit: i64,
    mask: i64,
    bit_width: u32,
) {
    let mut v = *current_value;
    if is_signed && (v & sign_bit) != 0 {
        v -= 1i64 << bit_width;
    } else {
        v &= mask;
    }
    values.push(v);
    *current_value = 0;
    *bits_in_current_value = 0;
}

fn value_range(bit_width: u32, is_signed: bool) -> (i64, i64) {
    if is_signed {
        (-(1i64 << (bit_width - 1)), (1i64 << (bit_width - 1)) - 1)
    } else {
        (0, (1i64 << bit_width) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_unsigned_various_widths() {
        for &w in &[1u32, 3, 7, 8, 12, 16, 24] {
            let max = (1i64 << w) - 1;
            let values = vec![0, 1, max / 2, max];
            for &big_endian in &[true, false] {
                let (packed, _off) = pack(&values, w, &[], 0, false, big_endian).unwrap();
                let (unpacked, _end, _trim) =
                    unpack(&packed, w, values.len() as u32, 0, false, big_endian).unwrap();
                assert_eq!(unpacked, values, "width={} big_endian={}", w, big_endian);
            }
        }
    }

    #[test]
    fn round_trip_signed() {
        let values = vec![-2048, -1, 0, 1, 2047];
        for &big_endian in &[true, false] {
            let (packed, _) = pack(&values, 12, &[], 0, true, big_endian).unwrap();
            let (unpacked, _, _) =
                unpack(&packed, 12, values.len() as u32, 0, true, big_endian).unwrap();
            assert_eq!(unpacked, values);
        }
    }

    #[test]
    fn pack_produces_exact_byte_count_at_zero_offset() {
        let values: Vec<i64> = (0..10).collect();
        let (packed, off) = pack(&values, 5, &[], 0, false, true).unwrap();
        assert_eq!(packed.len(), (10 * 5 + 7) / 8);
        assert_eq!(off, (10 * 5) % 8);
    }

    #[test]
    fn pack_rejects_out_of_range_values() {
        let err = pack(&[8], 3, &[], 0, false, true).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);

        let err = pack(&[-5], 3, &[], 0, true, true).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn unpack_rejects_insufficient_bytes_when_count_positive() {
        let err = unpack(&[0xFF], 8, 2, 0, false, true).unwrap_err();
        assert_eq!(err.code(), crate::error::StatusCode::InvalidArgument);
    }

    #[test]
    fn chained_pack_matches_single_pack_of_concatenation() {
        let a: Vec<i64> = vec![1, 2, 3];
        let b: Vec<i64> = vec![4, 5, 6];
        let mut all = a.clone();
        all.extend(b.clone());

        let (buf_a, off_a) = pack(&a, 5, &[], 0, false, true).unwrap();
        let (buf_ab, _off_ab) = pack(&b, 5, &buf_a, off_a, false, true).unwrap();
        let (buf_all, _) = pack(&all, 5, &[], 0, false, true).unwrap();

        assert_eq!(buf_ab, buf_all);
    }

    #[test]
    fn unpack_zero_count_consumes_whole_buffer() {
        let values: Vec<i64> = vec![1, 2, 3, 4];
        let (packed, _) = pack(&values, 8, &[], 0, false, true).unwrap();
        let (unpacked, _, _) = unpack(&packed, 8, 0, 0, false, true).unwrap();
        assert_eq!(unpacked, values);
    }

    #[test]
    fn unpack_zero_count_with_trailing_partial_value_errors() {
        // 3 bits of payload cannot form a complete 8-bit value.
        let err = unpack(&[0b1110_0000], 8, 0, 5, false, true);
        // starting_bit_offset=5 leaves 3 usable bits in a single byte buffer, which
        // is fewer than bit_width=8 and not evenly divisible -> invalid_argument.
        assert!(err.is_err());
    }
}
