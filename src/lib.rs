#![cfg_attr(not(test), no_std)]

pub mod config;
mod dht;
mod lcd;

pub use dht::{DhtSensor, SensorModel};
pub use lcd::{Lcd, LcdError};

/// Errors a sensor read can surface to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SensorError {
    Timeout,
    ChecksumMismatch,
    PinError,
    InvalidData,
}

/// One decoded measurement from the sensor.
#[derive(Clone, Copy, Debug, PartialEq, defmt::Format)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

impl Reading {
    pub fn band(&self) -> TempBand {
        TempBand::classify(self.temperature)
    }
}

/// Temperature band induced by the threshold triple in [`config`].
///
/// A boundary value belongs to the band above it: 20 C is already
/// `Normal`, 40 C is already `Hot`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum TempBand {
    Cold,
    Normal,
    Warm,
    Hot,
}

impl TempBand {
    pub fn classify(temp_c: f32) -> Self {
        if temp_c >= config::TH_TEMP_HIGH as f32 {
            TempBand::Hot
        } else if temp_c >= config::TH_TEMP_NORM as f32 {
            TempBand::Warm
        } else if temp_c >= config::TH_TEMP_LOW as f32 {
            TempBand::Normal
        } else {
            TempBand::Cold
        }
    }

    /// Human-readable label, sized for a 16-column display.
    pub fn label(&self) -> &'static str {
        match self {
            TempBand::Cold => "COLD",
            TempBand::Normal => "NORMAL",
            TempBand::Warm => "WARM",
            TempBand::Hot => "HOT! CHECK UNIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_mid_band_values() {
        assert_eq!(TempBand::classify(25.0), TempBand::Normal);
        assert_eq!(TempBand::classify(35.0), TempBand::Warm);
        assert_eq!(TempBand::classify(45.0), TempBand::Hot);
        assert_eq!(TempBand::classify(12.5), TempBand::Cold);
    }

    #[test]
    fn classify_boundaries_belong_to_the_upper_band() {
        assert_eq!(TempBand::classify(20.0), TempBand::Normal);
        assert_eq!(TempBand::classify(30.0), TempBand::Warm);
        assert_eq!(TempBand::classify(40.0), TempBand::Hot);
        assert_eq!(TempBand::classify(19.9), TempBand::Cold);
    }

    #[test]
    fn reading_band_uses_temperature_only() {
        let reading = Reading {
            temperature: 35.0,
            humidity: 99.0,
        };
        assert_eq!(reading.band(), TempBand::Warm);
    }

    #[test]
    fn labels_fit_a_16_column_display() {
        for band in [
            TempBand::Cold,
            TempBand::Normal,
            TempBand::Warm,
            TempBand::Hot,
        ] {
            assert!(band.label().len() <= 16);
        }
    }
}
