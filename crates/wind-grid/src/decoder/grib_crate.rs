use std::io::Cursor;

use grib2_parser::Grib2Message;
use tracing::instrument;

use gfs_common::{GfsError, GfsResult};

use super::{decode_with, RasterDecoder};
use crate::raster::DecodedRaster;

/// Unpacks with the `grib` crate, which understands the complex and PNG
/// packings NOMADS serves.
#[derive(Debug, Clone, Copy, Default)]
pub struct GribCrateDecoder;

impl RasterDecoder for GribCrateDecoder {
    fn name(&self) -> &'static str {
        "grib"
    }

    #[instrument(skip_all, fields(backend = "grib", bytes = bytes.len()))]
    fn decode(&self, bytes: &[u8]) -> GfsResult<DecodedRaster> {
        decode_with(self.name(), bytes, unpack_message)
    }
}

fn unpack_message(message: &Grib2Message) -> GfsResult<Vec<Option<f32>>> {
    let grib2 = grib::from_reader(Cursor::new(message.raw.to_vec()))
        .map_err(|e| GfsError::Decode(format!("grib: {}", e)))?;

    let (_, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| GfsError::Decode("grib: message has no submessage".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| GfsError::Decode(format!("grib: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| GfsError::Decode(format!("grib: {}", e)))?;

    // Bitmapped points come back as NaN
    Ok(values
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect())
}
