//! Measurement units for area and length.
//!
//! Workspace coordinates are planar and metre-based (projected), so every
//! conversion is defined from square metres / metres. Unit names accept the
//! same lowercase spellings the original field-calculator expressions used.

use std::fmt;

/// Square metres per acre.
const SQM_PER_ACRE: f64 = 4_046.856_422_4;
/// Square metres per square foot.
const SQM_PER_SQFT: f64 = 0.092_903_04;
/// Square metres per square mile.
const SQM_PER_SQMI: f64 = 2_589_988.110_336;
/// Square metres per hectare.
const SQM_PER_HECTARE: f64 = 10_000.0;

/// Metres per foot.
const M_PER_FOOT: f64 = 0.3048;
/// Metres per mile.
const M_PER_MILE: f64 = 1_609.344;

/// Supported area units for polygon measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaUnit {
    Acres,
    SquareFeet,
    SquareMiles,
    Hectares,
    SquareMeters,
}

impl AreaUnit {
    /// Parses a unit name: `acres`, `squarefeet`, `squaremiles`,
    /// `hectares`, `squaremeters`. Case-insensitive; underscores are
    /// ignored, so `square_meters` also parses.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('_', "").as_str() {
            "acres" => Some(AreaUnit::Acres),
            "squarefeet" => Some(AreaUnit::SquareFeet),
            "squaremiles" => Some(AreaUnit::SquareMiles),
            "hectares" => Some(AreaUnit::Hectares),
            "squaremeters" => Some(AreaUnit::SquareMeters),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            AreaUnit::Acres => "acres",
            AreaUnit::SquareFeet => "squarefeet",
            AreaUnit::SquareMiles => "squaremiles",
            AreaUnit::Hectares => "hectares",
            AreaUnit::SquareMeters => "squaremeters",
        }
    }

    /// Converts an area in square metres into this unit.
    pub fn from_square_meters(&self, sqm: f64) -> f64 {
        match self {
            AreaUnit::Acres => sqm / SQM_PER_ACRE,
            AreaUnit::SquareFeet => sqm / SQM_PER_SQFT,
            AreaUnit::SquareMiles => sqm / SQM_PER_SQMI,
            AreaUnit::Hectares => sqm / SQM_PER_HECTARE,
            AreaUnit::SquareMeters => sqm,
        }
    }

    /// Converts an area in this unit into square metres.
    pub fn to_square_meters(&self, value: f64) -> f64 {
        match self {
            AreaUnit::Acres => value * SQM_PER_ACRE,
            AreaUnit::SquareFeet => value * SQM_PER_SQFT,
            AreaUnit::SquareMiles => value * SQM_PER_SQMI,
            AreaUnit::Hectares => value * SQM_PER_HECTARE,
            AreaUnit::SquareMeters => value,
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported length units for polyline measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Feet,
    Meters,
    Miles,
}

impl LengthUnit {
    /// Parses a lowercase unit name: `feet`, `meters`, `miles`.
    /// Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "feet" => Some(LengthUnit::Feet),
            "meters" => Some(LengthUnit::Meters),
            "miles" => Some(LengthUnit::Miles),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            LengthUnit::Feet => "feet",
            LengthUnit::Meters => "meters",
            LengthUnit::Miles => "miles",
        }
    }

    /// Converts a length in metres into this unit.
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            LengthUnit::Feet => meters / M_PER_FOOT,
            LengthUnit::Meters => meters,
            LengthUnit::Miles => meters / M_PER_MILE,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_unit_from_name() {
        assert_eq!(AreaUnit::from_name("acres"), Some(AreaUnit::Acres));
        assert_eq!(AreaUnit::from_name("ACRES"), Some(AreaUnit::Acres));
        assert_eq!(
            AreaUnit::from_name("squaremeters"),
            Some(AreaUnit::SquareMeters)
        );
        assert_eq!(
            AreaUnit::from_name("square_meters"),
            Some(AreaUnit::SquareMeters)
        );
        assert_eq!(AreaUnit::from_name("furlongs"), None);
    }

    #[test]
    fn test_length_unit_from_name() {
        assert_eq!(LengthUnit::from_name("feet"), Some(LengthUnit::Feet));
        assert_eq!(LengthUnit::from_name("Miles"), Some(LengthUnit::Miles));
        assert_eq!(LengthUnit::from_name("cubits"), None);
    }

    #[test]
    fn test_acre_conversion_round_trip() {
        let sqm = AreaUnit::Acres.to_square_meters(4.0);
        assert!((AreaUnit::Acres.from_square_meters(sqm) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_one_acre_in_square_meters() {
        let acres = AreaUnit::Acres.from_square_meters(4046.8564224);
        assert!((acres - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hectare_conversion() {
        assert_eq!(AreaUnit::Hectares.from_square_meters(25_000.0), 2.5);
    }

    #[test]
    fn test_square_mile_conversion() {
        let sqmi = AreaUnit::SquareMiles.from_square_meters(2_589_988.110336);
        assert!((sqmi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_conversions() {
        assert!((LengthUnit::Feet.from_meters(0.3048) - 1.0).abs() < 1e-12);
        assert_eq!(LengthUnit::Meters.from_meters(123.0), 123.0);
        assert!((LengthUnit::Miles.from_meters(1609.344) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_display_matches_name() {
        assert_eq!(format!("{}", AreaUnit::SquareFeet), "squarefeet");
        assert_eq!(format!("{}", LengthUnit::Meters), "meters");
    }
}
