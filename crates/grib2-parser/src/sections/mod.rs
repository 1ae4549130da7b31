//! GRIB2 section parsing.
//!
//! Every parser here takes the bytes of exactly one section, starting at its
//! 4-byte length prefix. Offsets in comments are 0-based within the section.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{tables, Grib2Error, Result};

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
}

/// Section 3: Grid Definition Section (latitude/longitude, template 3.0)
///
/// Angles are in degrees. Longitudes are as encoded, normally 0..360.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    pub template_number: u16,
    pub num_points_longitude: u32,
    pub num_points_latitude: u32,
    pub first_latitude: f64,
    pub first_longitude: f64,
    pub last_latitude: f64,
    pub last_longitude: f64,
    pub longitude_increment: f64,
    pub latitude_increment: f64,
    pub scanning_mode: u8,
}

impl GridDefinition {
    pub fn num_points(&self) -> usize {
        self.num_points_longitude as usize * self.num_points_latitude as usize
    }

    /// Rows run south to north (scanning mode bit 2, mask 0x40).
    pub fn scans_northward(&self) -> bool {
        self.scanning_mode & 0x40 != 0
    }

    /// Columns run east to west (scanning mode bit 1, mask 0x80).
    pub fn scans_westward(&self) -> bool {
        self.scanning_mode & 0x80 != 0
    }
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template_number: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub level_type: u8,
    /// First fixed surface value with its scale factor applied (Pa for isobaric levels).
    pub level_value: f64,
    pub forecast_offset: Duration,
}

impl ProductDefinition {
    /// Isobaric level in whole hPa, if this product sits on a pressure surface.
    pub fn pressure_hpa(&self) -> Option<u32> {
        if self.level_type != tables::level_types::ISOBARIC || !self.level_value.is_finite() {
            return None;
        }
        Some((self.level_value.round() as i64 / 100) as u32)
    }
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from the start of a message.
pub fn parse_indicator(data: &[u8]) -> Result<Indicator> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat("invalid GRIB magic bytes".to_string()));
    }

    // [4..6] reserved, [6] discipline, [7] edition, [8..16] total length
    let discipline = data[6];
    let edition = data[7];
    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected GRIB edition 2, got {}",
            edition
        )));
    }

    Ok(Indicator {
        discipline,
        edition,
        message_length: u64::from_be_bytes(be_array(&data[8..16])),
    })
}

/// Parse Section 1 (Identification).
pub fn parse_identification(section: &[u8]) -> Result<Identification> {
    require(section, 1, 21)?;

    let center = u16::from_be_bytes([section[5], section[6]]);
    let sub_center = u16::from_be_bytes([section[7], section[8]]);
    let significance_of_reference_time = section[11];

    let year = u16::from_be_bytes([section[12], section[13]]);
    let (month, day, hour, minute, second) =
        (section[14], section[15], section[16], section[17], section[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center,
        sub_center,
        significance_of_reference_time,
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
    })
}

/// Parse Section 3 (Grid Definition). Only template 3.0 is supported.
pub fn parse_grid_definition(section: &[u8]) -> Result<GridDefinition> {
    require(section, 3, 14)?;

    let template_number = u16::from_be_bytes([section[12], section[13]]);
    if template_number != 0 {
        return Err(Grib2Error::UnsupportedTemplate {
            kind: "grid definition",
            number: template_number,
        });
    }
    require(section, 3, 72)?;

    // Template 3.0 body, offsets relative to byte 14:
    // [16..20] Ni, [20..24] Nj, [24..28] basic angle, [28..32] subdivisions,
    // [32..36] La1, [36..40] Lo1, [41..45] La2, [45..49] Lo2,
    // [49..53] Di, [53..57] Dj, [57] scanning mode
    let gd = &section[14..];
    let ni = u32::from_be_bytes(be_array(&gd[16..20]));
    let nj = u32::from_be_bytes(be_array(&gd[20..24]));
    let unit = angle_unit(
        u32::from_be_bytes(be_array(&gd[24..28])),
        u32::from_be_bytes(be_array(&gd[28..32])),
    );

    let angle = |bytes: &[u8]| decode_grib2_signed(bytes) as f64 * unit;

    Ok(GridDefinition {
        template_number,
        num_points_longitude: ni,
        num_points_latitude: nj,
        first_latitude: angle(&gd[32..36]),
        first_longitude: angle(&gd[36..40]),
        last_latitude: angle(&gd[41..45]),
        last_longitude: angle(&gd[45..49]),
        longitude_increment: u32::from_be_bytes(be_array(&gd[49..53])) as f64 * unit,
        latitude_increment: u32::from_be_bytes(be_array(&gd[53..57])) as f64 * unit,
        scanning_mode: gd[57],
    })
}

/// Parse Section 4 (Product Definition).
///
/// Templates 4.0 through 4.15 share the layout of the first 34 bytes, which
/// is all that is read here.
pub fn parse_product_definition(section: &[u8], discipline: u8) -> Result<ProductDefinition> {
    require(section, 4, 9)?;

    let template_number = u16::from_be_bytes([section[7], section[8]]);
    if template_number > 15 {
        return Err(Grib2Error::UnsupportedTemplate {
            kind: "product definition",
            number: template_number,
        });
    }
    require(section, 4, 34)?;

    // [9] category, [10] number, [17] time unit, [18..22] forecast time,
    // [22] first surface type, [23] scale factor, [24..28] scaled value
    let parameter_category = section[9];
    let parameter_number = section[10];
    let time_unit = section[17];
    let forecast_time = decode_grib2_signed(&section[18..22]) as i64;
    let level_type = section[22];
    let scale_factor = decode_grib2_signed(&section[23..24]);
    let scaled_value = u32::from_be_bytes(be_array(&section[24..28]));

    let unit_seconds = time_unit_seconds(time_unit).ok_or_else(|| Grib2Error::InvalidSection {
        section: 4,
        reason: format!("unsupported time range unit {}", time_unit),
    })?;

    let level_value = if scaled_value == u32::MAX {
        f64::NAN
    } else {
        scaled_value as f64 / 10f64.powi(scale_factor)
    };

    Ok(ProductDefinition {
        template_number,
        parameter_category,
        parameter_number,
        parameter_short_name: parameter_short_name_owned(
            discipline,
            parameter_category,
            parameter_number,
        ),
        level_type,
        level_value,
        forecast_offset: Duration::seconds(forecast_time * unit_seconds),
    })
}

/// Parse Section 5 (Data Representation).
pub fn parse_data_representation(section: &[u8]) -> Result<DataRepresentation> {
    require(section, 5, 11)?;

    let num_data_points = u32::from_be_bytes(be_array(&section[5..9]));
    let template_number = u16::from_be_bytes([section[9], section[10]]);

    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 all begin with R, E, D and bit width
    require(section, 5, 20)?;
    let reference_value = f32::from_be_bytes(be_array(&section[11..15]));
    let binary_scale_factor = decode_grib2_signed(&section[15..17]) as i16;
    let decimal_scale_factor = decode_grib2_signed(&section[17..19]) as i16;
    let bits_per_value = section[19];

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value,
    })
}

/// Parse Section 6 (Bitmap). Returns the bitmap bytes, or `None` when every
/// point is present.
pub fn parse_bitmap(section: &[u8]) -> Result<Option<&[u8]>> {
    require(section, 6, 6)?;

    match section[5] {
        0 => Ok(Some(&section[6..])),
        255 => Ok(None),
        indicator => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("unsupported bitmap indicator {}", indicator),
        }),
    }
}

/// Parse Section 7 (Data). Returns the packed payload.
pub fn parse_data_section(section: &[u8]) -> Result<&[u8]> {
    require(section, 7, 5)?;
    Ok(&section[5..])
}

// ===== Helper Functions =====

/// Locate section `section_num` within a message and return exactly its bytes.
pub fn find_section(data: &[u8], section_num: u8) -> Result<&[u8]> {
    let mut offset = 16; // After Section 0

    loop {
        if data.get(offset..offset + 4) == Some(b"7777") || offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "section not found".to_string(),
            });
        }

        let section_length = u32::from_be_bytes(be_array(&data[offset..offset + 4])) as usize;
        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: format!("invalid section length {} at offset {}", section_length, offset),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(&data[offset..offset + section_length]);
        }

        offset += section_length;
    }
}

/// Decode a GRIB2 sign-magnitude integer of 1 to 4 bytes.
///
/// The top bit is the sign and the remaining bits the magnitude; slices of
/// any other length decode to 0.
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    if bytes.is_empty() || bytes.len() > 4 {
        return 0;
    }

    let raw = bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    let sign_bit = 1u32 << (bytes.len() * 8 - 1);
    let magnitude = (raw & !sign_bit) as i32;

    if raw & sign_bit != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn require(section: &[u8], number: u8, min_len: usize) -> Result<()> {
    if section.len() < min_len {
        return Err(Grib2Error::InvalidSection {
            section: number,
            reason: format!("need at least {} bytes, got {}", min_len, section.len()),
        });
    }
    Ok(())
}

fn be_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Degrees per encoded unit; microdegrees unless a basic angle is given.
fn angle_unit(basic_angle: u32, subdivisions: u32) -> f64 {
    if basic_angle == 0 || basic_angle == u32::MAX || subdivisions == 0 || subdivisions == u32::MAX
    {
        1e-6
    } else {
        basic_angle as f64 / subdivisions as f64
    }
}

/// Seconds per unit of Code Table 4.4.
fn time_unit_seconds(unit: u8) -> Option<i64> {
    match unit {
        0 => Some(60),
        1 => Some(3_600),
        2 => Some(86_400),
        10 => Some(3 * 3_600),
        11 => Some(6 * 3_600),
        12 => Some(12 * 3_600),
        13 => Some(1),
        _ => None,
    }
}

fn parameter_short_name_owned(discipline: u8, category: u8, number: u8) -> String {
    tables::parameter_short_name(discipline, category, number)
        .map(str::to_string)
        .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
}
