use tracing::instrument;

use gfs_common::{GfsError, GfsResult};

use super::{decode_with, RasterDecoder};
use crate::raster::DecodedRaster;

/// Unpacks with the in-tree simple-packing decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDecoder;

impl RasterDecoder for NativeDecoder {
    fn name(&self) -> &'static str {
        "native"
    }

    #[instrument(skip_all, fields(backend = "native", bytes = bytes.len()))]
    fn decode(&self, bytes: &[u8]) -> GfsResult<DecodedRaster> {
        decode_with(self.name(), bytes, |message| {
            message.unpack().map_err(|e| GfsError::Decode(e.to_string()))
        })
    }
}
