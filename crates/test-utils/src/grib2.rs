//! GRIB2 test data generator.
//!
//! Builds minimal synthetic GRIB2 messages on a latitude/longitude grid with
//! simple packing, shaped like what the NOMADS grib filter returns for GFS
//! isobaric fields.

use crate::fixtures::SAMPLE_REFERENCE;

/// Build a single-field GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition
    ni: u32,       // columns
    nj: u32,       // rows
    la1: i32,      // first lat (microdegrees)
    lo1: i32,      // first lon (microdegrees, 0..360)
    di: u32,       // lon increment (microdegrees)
    dj: u32,       // lat increment (microdegrees)
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    // Data
    data_values: Vec<f32>,
    bitmap: Option<Vec<bool>>,
}

impl Grib2Builder {
    /// Geopotential height on an isobaric level (hPa).
    pub fn hgt(pressure_hpa: u32) -> Self {
        Self::isobaric(3, 5, pressure_hpa)
    }

    /// U-component of wind on an isobaric level (hPa).
    pub fn ugrd(pressure_hpa: u32) -> Self {
        Self::isobaric(2, 2, pressure_hpa)
    }

    /// V-component of wind on an isobaric level (hPa).
    pub fn vgrd(pressure_hpa: u32) -> Self {
        Self::isobaric(2, 3, pressure_hpa)
    }

    /// Any discipline-0 parameter on an isobaric level (hPa).
    ///
    /// Defaults to a 2x2 grid at -33..-34 N, 138..139 E scanned north to south.
    pub fn isobaric(category: u8, number: u8, pressure_hpa: u32) -> Self {
        let (year, month, day, hour) = SAMPLE_REFERENCE;
        Self {
            discipline: 0,
            center: 7, // NCEP
            year,
            month,
            day,
            hour,
            ni: 2,
            nj: 2,
            la1: -33_000_000,
            lo1: 138_000_000,
            di: 1_000_000,
            dj: 1_000_000,
            scanning_mode: 0, // +i, -j, i consecutive
            param_category: category,
            param_number: number,
            level_type: 100,
            level_value: pressure_hpa * 100,
            forecast_hour: 0,
            data_values: vec![0.0; 4],
            bitmap: None,
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    /// Grid size and placement: first point and increments in degrees.
    pub fn with_grid(mut self, ni: u32, nj: u32, first_lat: f64, first_lon: f64, step: f64) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.la1 = (first_lat * 1e6).round() as i32;
        self.lo1 = (first_lon.rem_euclid(360.0) * 1e6).round() as i32;
        self.di = (step * 1e6).round() as u32;
        self.dj = (step * 1e6).round() as u32;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_scanning_mode(mut self, mode: u8) -> Self {
        self.scanning_mode = mode;
        self
    }

    /// Any fixed surface; `level_value` is the raw scaled value (Pa for isobaric).
    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    /// Row-major values in scan order.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Mark points present (`true`) or missing; missing points carry no packed bits.
    pub fn with_bitmap(mut self, present: Vec<bool>) -> Self {
        self.bitmap = Some(present);
        self
    }

    /// Build the complete GRIB2 message bytes.
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];

        let message_length = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(message_length);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());
        for section in &sections {
            message.extend_from_slice(section);
        }
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)
        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0); // Minute
        section.push(0); // Second
        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&72u32.to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Shape of Earth (spherical, 6371229 m)
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        let la2 = self.la1 - (self.nj as i32 - 1) * self.dj as i32 * self.lat_direction();
        let lo2 = self.lo1 + (self.ni as i32 - 1) * self.di as i32;

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions
        section.extend_from_slice(&sign_magnitude_i32(self.la1));
        section.extend_from_slice(&sign_magnitude_i32(self.lo1));
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&sign_magnitude_i32(la2));
        section.extend_from_slice(&sign_magnitude_i32(lo2));
        section.extend_from_slice(&self.di.to_be_bytes());
        section.extend_from_slice(&self.dj.to_be_bytes());
        section.push(self.scanning_mode);

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0
        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(96); // Analysis or forecast process (GFS)
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());
        section.push(self.level_type);
        section.push(0); // Scale factor
        section.extend_from_slice(&self.level_value.to_be_bytes());
        section.push(255); // Type of second fixed surface (none)
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let packing = self.packing();

        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&(self.present_values().count() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0
        section.extend_from_slice(&packing.reference.to_be_bytes());
        section.extend_from_slice(&sign_magnitude_i16(packing.binary_scale));
        section.extend_from_slice(&sign_magnitude_i16(0)); // Decimal scale factor
        section.push(packing.bits);
        section.push(0); // Type of field values: floating point

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();
        match &self.bitmap {
            None => {
                section.extend_from_slice(&6u32.to_be_bytes());
                section.push(6);
                section.push(255); // No bitmap
            }
            Some(present) => {
                let mut bits = vec![0u8; present.len().div_ceil(8)];
                for (i, _) in present.iter().enumerate().filter(|(_, p)| **p) {
                    bits[i / 8] |= 0x80 >> (i % 8);
                }
                section.extend_from_slice(&(6 + bits.len() as u32).to_be_bytes());
                section.push(6);
                section.push(0); // Bitmap follows
                section.extend_from_slice(&bits);
            }
        }
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let packing = self.packing();
        let scale = 2f64.powi(packing.binary_scale as i32);

        let mut packed = Vec::new();
        if packing.bits > 0 {
            for value in self.present_values() {
                let x = ((value as f64 - packing.reference as f64) / scale).round() as u16;
                packed.extend_from_slice(&x.to_be_bytes());
            }
        }

        let mut section = Vec::new();
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed);
        section
    }

    fn present_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data_values
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                self.bitmap
                    .as_ref()
                    .map_or(true, |present| present.get(*i).copied().unwrap_or(true))
            })
            .map(|(_, v)| *v)
    }

    /// 16-bit simple packing parameters: E = ceil(log2(range / 65535)).
    fn packing(&self) -> Packing {
        let (min_val, max_val) = self
            .present_values()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
                (min.min(v), max.max(v))
            });

        let range = (max_val - min_val) as f64;
        if !range.is_finite() || range == 0.0 {
            return Packing {
                reference: if min_val.is_finite() { min_val } else { 0.0 },
                binary_scale: 0,
                bits: 0,
            };
        }

        Packing {
            reference: min_val,
            binary_scale: (range / 65535.0).log2().ceil() as i16,
            bits: 16,
        }
    }

    fn lat_direction(&self) -> i32 {
        if self.scanning_mode & 0x40 != 0 {
            -1
        } else {
            1
        }
    }
}

struct Packing {
    reference: f32,
    binary_scale: i16,
    bits: u8,
}

/// Concatenate several messages into one payload, as the filter returns them.
pub fn concat_messages<I>(messages: I) -> Vec<u8>
where
    I: IntoIterator<Item = Grib2Builder>,
{
    messages.into_iter().flat_map(|m| m.build()).collect()
}

fn sign_magnitude_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

fn sign_magnitude_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message_framing() {
        let data = Grib2Builder::hgt(500).build();
        assert_eq!(&data[0..4], b"GRIB");
        assert_eq!(data[7], 2);
        assert_eq!(
            u64::from_be_bytes(data[8..16].try_into().unwrap()) as usize,
            data.len()
        );
        assert_eq!(&data[data.len() - 4..], b"7777");
    }

    #[test]
    fn test_sign_magnitude() {
        assert_eq!(sign_magnitude_i32(-1), [0x80, 0, 0, 1]);
        assert_eq!(sign_magnitude_i16(-9), [0x80, 9]);
        assert_eq!(sign_magnitude_i16(3), [0, 3]);
    }

    #[test]
    fn test_bitmap_section_length() {
        let data = Grib2Builder::ugrd(850)
            .with_data(vec![1.0, 2.0, 3.0, 4.0])
            .with_bitmap(vec![true, false, true, true])
            .build();
        let plain = Grib2Builder::ugrd(850)
            .with_data(vec![1.0, 2.0, 3.0, 4.0])
            .build();
        // One bitmap byte more, one packed value (2 bytes) less
        assert_eq!(data.len(), plain.len() + 1 - 2);
    }
}
