//! GRIB2 code tables: parameter short names and level descriptions.

/// GRIB2 fixed surface type codes (Code Table 4.5).
pub mod level_types {
    pub const SURFACE: u8 = 1;
    pub const ISOBARIC: u8 = 100;
    pub const MSL: u8 = 101;
    pub const HEIGHT_ABOVE_GROUND: u8 = 103;
}

/// Short name for (discipline, category, number), if known.
pub fn parameter_short_name(discipline: u8, category: u8, number: u8) -> Option<&'static str> {
    let name = match (discipline, category, number) {
        // Temperature
        (0, 0, 0) => "TMP",
        (0, 0, 6) => "DPT",
        // Moisture
        (0, 1, 0) => "SPFH",
        (0, 1, 1) => "RH",
        // Momentum
        (0, 2, 0) => "WDIR",
        (0, 2, 1) => "WIND",
        (0, 2, 2) => "UGRD",
        (0, 2, 3) => "VGRD",
        (0, 2, 8) => "VVEL",
        (0, 2, 10) => "ABSV",
        // Mass
        (0, 3, 0) => "PRES",
        (0, 3, 1) => "PRMSL",
        (0, 3, 5) => "HGT",
        _ => return None,
    };
    Some(name)
}

/// Human readable description of a fixed surface.
pub fn level_description(level_type: u8, level_value: f64) -> String {
    match level_type {
        level_types::SURFACE => "surface".to_string(),
        level_types::ISOBARIC => format!("{} mb", (level_value / 100.0).round()),
        level_types::MSL => "mean sea level".to_string(),
        level_types::HEIGHT_ABOVE_GROUND => format!("{} m above ground", level_value),
        _ => format!("Level type {} value {}", level_type, level_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_grid_parameters() {
        assert_eq!(parameter_short_name(0, 3, 5), Some("HGT"));
        assert_eq!(parameter_short_name(0, 2, 2), Some("UGRD"));
        assert_eq!(parameter_short_name(0, 2, 3), Some("VGRD"));
        assert_eq!(parameter_short_name(209, 0, 16), None);
    }

    #[test]
    fn test_level_description() {
        assert_eq!(level_description(100, 50000.0), "500 mb");
        assert_eq!(level_description(103, 10.0), "10 m above ground");
        assert_eq!(level_description(1, 0.0), "surface");
        assert_eq!(level_description(99, 123.0), "Level type 99 value 123");
    }
}
