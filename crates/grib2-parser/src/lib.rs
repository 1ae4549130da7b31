//! GRIB2 parser (WMO FM 92 GRIB Edition 2).
//!
//! Reads the subset of GRIB2 that the NOMADS grib filter produces for GFS
//! isobaric fields: one field per message, latitude/longitude grids
//! (template 3.0), horizontal-level products (templates 4.0–4.15) and
//! simple packing (template 5.0). Other packings parse fine at the section
//! level but must be unpacked elsewhere.

pub mod sections;
pub mod tables;
pub mod unpacking;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

pub use sections::{
    DataRepresentation, GridDefinition, Identification, Indicator, ProductDefinition,
};
pub use tables::{level_types, parameter_short_name};
pub use unpacking::unpack_simple;

/// Errors raised while reading GRIB2 data.
#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("unsupported {kind} template {number}")]
    UnsupportedTemplate { kind: &'static str, number: u16 },

    #[error("unpacking failed: {0}")]
    UnpackingError(String),
}

pub type Result<T> = std::result::Result<T, Grib2Error>;

/// One decoded GRIB2 message (a single field).
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    /// Bitmap bytes when section 6 carries one.
    pub bitmap: Option<Bytes>,
    /// Packed payload of section 7.
    pub data: Bytes,
    /// The whole message, for backends that decode it themselves.
    pub raw: Bytes,
}

impl Grib2Message {
    /// Parse a complete message (section 0 through "7777").
    pub fn parse(raw: Bytes) -> Result<Self> {
        let indicator = sections::parse_indicator(&raw)?;
        let identification = sections::parse_identification(sections::find_section(&raw, 1)?)?;
        let grid_definition = sections::parse_grid_definition(sections::find_section(&raw, 3)?)?;
        let product_definition = sections::parse_product_definition(
            sections::find_section(&raw, 4)?,
            indicator.discipline,
        )?;
        let data_representation =
            sections::parse_data_representation(sections::find_section(&raw, 5)?)?;
        let bitmap = sections::parse_bitmap(sections::find_section(&raw, 6)?)?;
        let data = sections::parse_data_section(sections::find_section(&raw, 7)?)?;

        Ok(Self {
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap: bitmap.map(Bytes::copy_from_slice),
            data: Bytes::copy_from_slice(data),
            raw,
        })
    }

    /// Parameter short name, e.g. "HGT".
    pub fn parameter(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Human readable level, e.g. "500 mb".
    pub fn level(&self) -> String {
        tables::level_description(
            self.product_definition.level_type,
            self.product_definition.level_value,
        )
    }

    /// Grid dimensions as (rows, columns).
    pub fn grid_dims(&self) -> (u32, u32) {
        (
            self.grid_definition.num_points_latitude,
            self.grid_definition.num_points_longitude,
        )
    }

    /// Reference time plus forecast offset.
    pub fn valid_time(&self) -> DateTime<Utc> {
        self.identification.reference_time + self.product_definition.forecast_offset
    }

    /// Unpack the field values; `None` marks points masked out by the bitmap.
    pub fn unpack(&self) -> Result<Vec<Option<f32>>> {
        let dr = &self.data_representation;
        if dr.template_number != 0 {
            return Err(Grib2Error::UnsupportedTemplate {
                kind: "data representation",
                number: dr.template_number,
            });
        }

        unpack_simple(
            &self.data,
            self.grid_definition.num_points(),
            dr.bits_per_value,
            dr.reference_value,
            dr.binary_scale_factor,
            dr.decimal_scale_factor,
            self.bitmap.as_deref(),
        )
    }
}

/// Sequential reader over a buffer of concatenated GRIB2 messages.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
}

impl Grib2Reader {
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    /// Total buffer size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Read the next message.
    ///
    /// A malformed message yields `Err` but the reader still advances past
    /// it, so callers can log and keep reading.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>> {
        let Some(start) = find_magic(&self.data, self.offset) else {
            self.offset = self.data.len();
            return Ok(None);
        };

        let indicator = match sections::parse_indicator(&self.data[start..]) {
            Ok(indicator) => indicator,
            Err(e) => {
                self.offset = start + 4;
                return Err(e);
            }
        };

        let end = start + indicator.message_length as usize;
        if indicator.message_length < 16 || end > self.data.len() {
            self.offset = self.data.len();
            return Err(Grib2Error::InvalidFormat(format!(
                "message at offset {} claims {} bytes, {} available",
                start,
                indicator.message_length,
                self.data.len() - start
            )));
        }

        self.offset = end;
        debug!(offset = start, length = indicator.message_length, "Reading GRIB2 message");
        Grib2Message::parse(self.data.slice(start..end)).map(Some)
    }
}

impl Iterator for Grib2Reader {
    type Item = Result<Grib2Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}

fn find_magic(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(4)
        .position(|w| w == b"GRIB")
        .map(|pos| from + pos)
}
