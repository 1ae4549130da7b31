//! Raster decoding backends.
//!
//! Both backends walk the payload message by message with the native
//! section parser and differ only in how the packed values are unpacked.
//! Band filtering, reorientation and level assembly live here.

mod grib_crate;
mod native;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use grib2_parser::{level_types, Grib2Message, GridDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gfs_common::{GfsError, GfsResult};

use crate::geotransform::GeoTransform;
use crate::raster::{DecodedRaster, Field2D, LevelFields};

pub use grib_crate::GribCrateDecoder;
pub use native::NativeDecoder;

/// Turns one GRIB2 payload into a [`DecodedRaster`].
pub trait RasterDecoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> GfsResult<DecodedRaster>;
}

/// Which backend unpacks the field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    /// In-tree parser, simple packing only.
    Native,
    /// The `grib` crate, which also handles the complex and PNG packing
    /// upstream serves.
    #[default]
    Grib,
}

impl DecoderKind {
    pub fn build(self) -> Box<dyn RasterDecoder> {
        match self {
            DecoderKind::Native => Box::new(NativeDecoder),
            DecoderKind::Grib => Box::new(GribCrateDecoder),
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderKind::Native => write!(f, "native"),
            DecoderKind::Grib => write!(f, "grib"),
        }
    }
}

impl FromStr for DecoderKind {
    type Err = GfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(DecoderKind::Native),
            "grib" => Ok(DecoderKind::Grib),
            other => Err(GfsError::Config(format!("unknown decoder backend: {}", other))),
        }
    }
}

/// Variables that make up a complete level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variable {
    Hgt,
    Ugrd,
    Vgrd,
}

impl Variable {
    fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "HGT" => Some(Variable::Hgt),
            "UGRD" => Some(Variable::Ugrd),
            "VGRD" => Some(Variable::Vgrd),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PartialLevel {
    hgt: Option<Field2D>,
    ugrd: Option<Field2D>,
    vgrd: Option<Field2D>,
}

impl PartialLevel {
    fn set(&mut self, variable: Variable, field: Field2D) {
        let slot = match variable {
            Variable::Hgt => &mut self.hgt,
            Variable::Ugrd => &mut self.ugrd,
            Variable::Vgrd => &mut self.vgrd,
        };
        if slot.replace(field).is_some() {
            warn!(?variable, "Duplicate band for level, keeping the last one");
        }
    }

    fn complete(self) -> Result<LevelFields, Vec<&'static str>> {
        match (self.hgt, self.ugrd, self.vgrd) {
            (Some(hgt), Some(ugrd), Some(vgrd)) => Ok(LevelFields { hgt, ugrd, vgrd }),
            (hgt, ugrd, vgrd) => {
                let mut missing = Vec::new();
                if hgt.is_none() {
                    missing.push("HGT");
                }
                if ugrd.is_none() {
                    missing.push("UGRD");
                }
                if vgrd.is_none() {
                    missing.push("VGRD");
                }
                Err(missing)
            }
        }
    }
}

/// Collects bands into levels against the grid of the first band seen.
struct LevelAssembler {
    transform: Option<GeoTransform>,
    valid_time: Option<DateTime<Utc>>,
    levels: BTreeMap<u32, PartialLevel>,
}

impl LevelAssembler {
    fn new() -> Self {
        Self {
            transform: None,
            valid_time: None,
            levels: BTreeMap::new(),
        }
    }

    /// Claim the reference grid if none is set yet and report whether
    /// `grid` lines up with it.
    fn accept_grid(&mut self, grid: &GridDefinition) -> GfsResult<Option<GeoTransform>> {
        let transform = GeoTransform::from_grid(grid)?;
        let Some(reference) = self.transform else {
            self.transform = Some(transform);
            return Ok(Some(transform));
        };
        Ok(reference.matches(&transform).then_some(transform))
    }

    /// Process one message; `unpack` is only invoked for wanted bands.
    fn add<F>(&mut self, message: &Grib2Message, unpack: F) -> GfsResult<()>
    where
        F: FnOnce(&Grib2Message) -> GfsResult<Vec<Option<f32>>>,
    {
        let Some(transform) = self.accept_grid(&message.grid_definition)? else {
            warn!(parameter = message.parameter(), "Band grid differs from the first band, skipping");
            return Ok(());
        };

        let product = &message.product_definition;
        let Some(variable) = Variable::from_short_name(message.parameter()) else {
            debug!(parameter = message.parameter(), "Skipping unwanted variable");
            return Ok(());
        };
        if product.level_type != level_types::ISOBARIC {
            debug!(level = %message.level(), "Skipping non-isobaric band");
            return Ok(());
        }
        let Some(pressure) = product.pressure_hpa() else {
            warn!(level = %message.level(), "Isobaric band has no usable pressure, skipping");
            return Ok(());
        };

        let values = unpack(message)?;
        if values.len() != transform.x_size * transform.y_size {
            return Err(GfsError::Decode(format!(
                "{} {} hPa unpacked {} values for a {}x{} grid",
                message.parameter(),
                pressure,
                values.len(),
                transform.y_size,
                transform.x_size
            )));
        }

        let values = values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect();
        let field = Field2D::new(
            transform.y_size,
            transform.x_size,
            transform.reorient(values),
        )?;

        if self.valid_time.is_none() {
            self.valid_time = Some(message.valid_time());
        }
        self.levels.entry(pressure).or_default().set(variable, field);
        Ok(())
    }

    fn finish(self) -> GfsResult<DecodedRaster> {
        let (Some(transform), Some(valid_time)) = (self.transform, self.valid_time) else {
            return Err(GfsError::EmptyDataset);
        };

        let mut levels = BTreeMap::new();
        for (pressure, partial) in self.levels {
            match partial.complete() {
                Ok(fields) => {
                    levels.insert(pressure, fields);
                }
                Err(missing) => {
                    warn!(pressure, ?missing, "Dropping incomplete level");
                }
            }
        }

        DecodedRaster::new(
            transform.lat_scale(),
            transform.lon_scale(),
            levels,
            valid_time.timestamp(),
        )
    }
}

/// Shared message walk used by both backends.
///
/// A message that fails to parse or unpack is logged and skipped. If no
/// message parses at all the payload is a `Decode` error.
pub(crate) fn decode_with<F>(backend: &'static str, bytes: &[u8], mut unpack: F) -> GfsResult<DecodedRaster>
where
    F: FnMut(&Grib2Message) -> GfsResult<Vec<Option<f32>>>,
{
    let reader = grib2_parser::Grib2Reader::new(bytes::Bytes::copy_from_slice(bytes));
    let mut assembler = LevelAssembler::new();
    let mut parsed = 0usize;
    let mut failed = 0usize;

    for (index, message) in reader.enumerate() {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                failed += 1;
                warn!(backend, index, error = %e, "Failed to parse band, skipping");
                continue;
            }
        };
        parsed += 1;

        if let Err(e) = assembler.add(&message, &mut unpack) {
            failed += 1;
            warn!(
                backend,
                index,
                parameter = message.parameter(),
                level = %message.level(),
                error = %e,
                "Failed to decode band, skipping"
            );
        }
    }

    if parsed == 0 {
        return Err(GfsError::Decode(format!(
            "no GRIB2 message could be parsed ({} bytes, {} failures)",
            bytes.len(),
            failed
        )));
    }

    debug!(backend, parsed, failed, "Decoded payload");
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_kind_parsing() {
        assert_eq!("native".parse::<DecoderKind>().unwrap(), DecoderKind::Native);
        assert_eq!("GRIB".parse::<DecoderKind>().unwrap(), DecoderKind::Grib);
        assert!("gdal".parse::<DecoderKind>().is_err());
        assert_eq!(DecoderKind::default().to_string(), "grib");
    }

    #[test]
    fn test_decoder_kind_yaml() {
        let kind: DecoderKind = serde_yaml::from_str("grib").unwrap();
        assert_eq!(kind, DecoderKind::Grib);
        assert_eq!(kind.build().name(), "grib");
    }
}
