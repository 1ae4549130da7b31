//! GRIB2 data unpacking.
//!
//! Only simple packing (template 5.0) is implemented here; complex and PNG
//! packed fields go through the `grib` crate backend instead.

use crate::{Grib2Error, Result};

/// Unpack simple packed GRIB2 data.
///
/// value = (R + X * 2^E) / 10^D, where X is the packed integer. Points
/// switched off in the bitmap come back as `None` and consume no bits.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<Option<f32>>> {
    let reference = reference_value as f64;
    let binary_scale = 2f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10f64.powi(-(decimal_scale_factor as i32));
    let bits = bits_per_value as usize;

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;

    for i in 0..num_points {
        let present = bitmap.map_or(true, |bm| {
            bm.get(i / 8).map_or(true, |byte| (byte >> (7 - i % 8)) & 1 == 1)
        });
        if !present {
            values.push(None);
            continue;
        }

        let packed = if bits == 0 {
            0
        } else {
            let packed = extract_bits(packed_data, bit_position, bits).map_err(|e| {
                Grib2Error::UnpackingError(format!("point {}: {}", i, e))
            })?;
            bit_position += bits;
            packed
        };

        let value = (reference + packed as f64 * binary_scale) * decimal_scale;
        values.push(Some(value as f32));
    }

    Ok(values)
}

/// Extract `num_bits` MSB-first bits starting at `start_bit`.
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> std::result::Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;
    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte = data
            .get(absolute_bit / 8)
            .ok_or_else(|| "not enough data to extract bits".to_string())?;
        let bit = (byte >> (7 - absolute_bit % 8)) & 1;
        result = (result << 1) | bit as u32;
    }

    Ok(result)
}
