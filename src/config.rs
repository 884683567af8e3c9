//! Pin assignments and alarm thresholds.
//!
//! Rewiring the board or retuning the temperature bands only touches this
//! module. The esp-hal GPIO API is typed (`peripherals.GPIO10` and friends),
//! so these constants are the authoritative wiring table and the pin
//! construction in `main` must agree with them.

use crate::dht::SensorModel;

// ----- Indicator LEDs -----
pub const LED_RED_PIN: u8 = 10;
pub const LED_GREEN_PIN: u8 = 8;
pub const LED_YELLOW_PIN: u8 = 9;

// ----- DHT sensor -----
/// Digital pin wired to the temperature/humidity sensor.
pub const DHT11_PIN: u8 = 13;
/// Sensor variant on that pin, selects the frame decoding.
pub const DHT_MODEL: SensorModel = SensorModel::Dht11;

// ----- Buzzer -----
pub const BUZZER_PIN: u8 = 7;

// ----- HD44780 LCD, 4-bit bus -----
pub const LCD_RS_PIN: u8 = 12;
pub const LCD_EN_PIN: u8 = 11;
pub const LCD_D4_PIN: u8 = 5;
pub const LCD_D5_PIN: u8 = 4;
pub const LCD_D6_PIN: u8 = 3;
pub const LCD_D7_PIN: u8 = 2;

// ----- Temperature band boundaries (degrees Celsius) -----
pub const TH_TEMP_LOW: u8 = 20;
pub const TH_TEMP_NORM: u8 = 30;
pub const TH_TEMP_HIGH: u8 = 40;

/// Highest usable GPIO number on the ESP32-C3.
const MAX_GPIO: u8 = 21;

const ALL_PINS: [u8; 11] = [
    LED_RED_PIN,
    LED_GREEN_PIN,
    LED_YELLOW_PIN,
    DHT11_PIN,
    BUZZER_PIN,
    LCD_RS_PIN,
    LCD_EN_PIN,
    LCD_D4_PIN,
    LCD_D5_PIN,
    LCD_D6_PIN,
    LCD_D7_PIN,
];

const fn pins_distinct(pins: &[u8]) -> bool {
    let mut i = 0;
    while i < pins.len() {
        let mut j = i + 1;
        while j < pins.len() {
            if pins[i] == pins[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn pins_in_range(pins: &[u8], max: u8) -> bool {
    let mut i = 0;
    while i < pins.len() {
        if pins[i] > max {
            return false;
        }
        i += 1;
    }
    true
}

// A bad wiring table is a build error, not a runtime condition.
const _: () = assert!(pins_distinct(&ALL_PINS), "duplicate pin assignment");
const _: () = assert!(pins_in_range(&ALL_PINS, MAX_GPIO), "pin outside GPIO range");
const _: () = assert!(
    TH_TEMP_LOW < TH_TEMP_NORM && TH_TEMP_NORM < TH_TEMP_HIGH,
    "thresholds must be strictly increasing"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pin_is_distinct_and_reachable() {
        assert!(pins_distinct(&ALL_PINS));
        assert!(pins_in_range(&ALL_PINS, MAX_GPIO));
    }

    #[test]
    fn thresholds_are_strictly_increasing() {
        assert!(TH_TEMP_LOW < TH_TEMP_NORM);
        assert!(TH_TEMP_NORM < TH_TEMP_HIGH);
    }

    #[test]
    fn distinctness_check_catches_duplicates() {
        assert!(!pins_distinct(&[3, 7, 3]));
        assert!(pins_distinct(&[3, 7, 4]));
    }
}
