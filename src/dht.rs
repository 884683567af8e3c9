//! Bit-banged DHT11/DHT22 driver over `embedded-hal` pins.
//!
//! The single-wire protocol is timing sensitive: the host pulls the line low
//! for at least 18 ms, releases it, and the sensor answers with an 80 us
//! low/high handshake followed by 40 pulses whose high width encodes the
//! bits. The whole exchange runs inside a critical section so interrupt
//! latency cannot distort the pulse widths.

use critical_section::with;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{Reading, SensorError};

/// Longest the sensor handshake may hold one level.
const RESPONSE_TIMEOUT_US: u32 = 85;
/// Longest low preamble before each data bit.
const BIT_LOW_TIMEOUT_US: u32 = 55;
/// Longest high pulse of a data bit.
const BIT_HIGH_TIMEOUT_US: u32 = 75;
/// High pulses longer than this are a 1 bit (~28 us means 0, ~70 us means 1).
const BIT_ONE_MIN_US: u32 = 40;

/// Sensor variant, selects how the 40-bit frame is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum SensorModel {
    /// Integral degrees/percent in bytes 2 and 0, decimals in bytes 3 and 1.
    Dht11,
    /// 16-bit tenths, sign bit in the temperature high byte.
    Dht22,
}

#[derive(Clone, Copy)]
enum Line {
    High,
    Low,
}

pub struct DhtSensor<P, D> {
    pin: P,
    delay: D,
    model: SensorModel,
    last_reading: Option<Reading>,
}

impl<P, D> DhtSensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// The pin must be open-drain with a pull-up: the sensor drives the
    /// same line the host uses to request a conversion.
    pub fn new(pin: P, delay: D, model: SensorModel) -> Self {
        DhtSensor {
            pin,
            delay,
            model,
            last_reading: None,
        }
    }

    /// Read the sensor, falling back to the last good reading when a
    /// conversion fails mid-stream. The first read has nothing to fall
    /// back on and reports the error itself.
    pub fn read(&mut self) -> Result<Reading, SensorError> {
        let fresh = self.read_frame().and_then(|frame| decode(frame, self.model));
        match fresh {
            Ok(reading) => {
                self.last_reading = Some(reading);
                Ok(reading)
            }
            Err(e) => self.last_reading.ok_or(e),
        }
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        let mut high_widths = [0u32; 40];

        with(|_cs| {
            // Start signal: hold low >18 ms, release for 20-40 us.
            self.pin.set_low().map_err(|_| SensorError::PinError)?;
            self.delay.delay_ms(20);
            self.pin.set_high().map_err(|_| SensorError::PinError)?;
            self.delay.delay_us(30);

            // Sensor response: 80 us low, 80 us high.
            self.wait_while(Line::High, RESPONSE_TIMEOUT_US)?;
            self.wait_while(Line::Low, RESPONSE_TIMEOUT_US)?;
            self.wait_while(Line::High, RESPONSE_TIMEOUT_US)?;

            for width in high_widths.iter_mut() {
                self.wait_while(Line::Low, BIT_LOW_TIMEOUT_US)?;
                *width = self.wait_while(Line::High, BIT_HIGH_TIMEOUT_US)?;
            }
            Ok(())
        })?;

        let mut frame = [0u8; 5];
        for (i, width) in high_widths.iter().enumerate() {
            frame[i / 8] <<= 1;
            if *width > BIT_ONE_MIN_US {
                frame[i / 8] |= 1;
            }
        }
        Ok(frame)
    }

    /// Busy-wait while the line sits at `line`, returning how long it did.
    fn wait_while(&mut self, line: Line, timeout_us: u32) -> Result<u32, SensorError> {
        let mut elapsed_us = 0;
        loop {
            let at_level = match line {
                Line::High => self.pin.is_high(),
                Line::Low => self.pin.is_low(),
            }
            .map_err(|_| SensorError::PinError)?;

            if !at_level {
                return Ok(elapsed_us);
            }
            if elapsed_us >= timeout_us {
                return Err(SensorError::Timeout);
            }

            self.delay.delay_us(1);
            elapsed_us += 1;
        }
    }
}

fn decode(frame: [u8; 5], model: SensorModel) -> Result<Reading, SensorError> {
    let sum = frame[0]
        .wrapping_add(frame[1])
        .wrapping_add(frame[2])
        .wrapping_add(frame[3]);
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let (humidity, temperature) = match model {
        SensorModel::Dht11 => (
            frame[0] as f32 + frame[1] as f32 / 10.0,
            frame[2] as f32 + frame[3] as f32 / 10.0,
        ),
        SensorModel::Dht22 => {
            let raw_h = u16::from_be_bytes([frame[0], frame[1]]);
            let raw_t = u16::from_be_bytes([frame[2] & 0x7f, frame[3]]);
            let mut temp = raw_t as f32 / 10.0;
            if frame[2] & 0x80 != 0 {
                temp = -temp;
            }
            (raw_h as f32 / 10.0, temp)
        }
    };

    if humidity > 100.0 {
        return Err(SensorError::InvalidData);
    }
    Ok(Reading {
        temperature,
        humidity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(mut frame: [u8; 5]) -> [u8; 5] {
        frame[4] = frame[0]
            .wrapping_add(frame[1])
            .wrapping_add(frame[2])
            .wrapping_add(frame[3]);
        frame
    }

    #[test]
    fn dht11_frame_decodes_integral_and_decimal_bytes() {
        let frame = with_checksum([45, 5, 31, 5, 0]);
        let reading = decode(frame, SensorModel::Dht11).unwrap();
        assert_eq!(reading.humidity, 45.5);
        assert_eq!(reading.temperature, 31.5);
    }

    #[test]
    fn dht22_frame_decodes_tenths() {
        // 65.2 %RH, 35.1 C
        let frame = with_checksum([0x02, 0x8c, 0x01, 0x5f, 0]);
        let reading = decode(frame, SensorModel::Dht22).unwrap();
        assert_eq!(reading.humidity, 65.2);
        assert_eq!(reading.temperature, 35.1);
    }

    #[test]
    fn dht22_sign_bit_negates_temperature() {
        // -10.5 C
        let frame = with_checksum([0x01, 0x90, 0x80, 0x69, 0]);
        let reading = decode(frame, SensorModel::Dht22).unwrap();
        assert_eq!(reading.temperature, -10.5);
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let mut frame = with_checksum([45, 5, 31, 5, 0]);
        frame[4] ^= 0xff;
        assert_eq!(
            decode(frame, SensorModel::Dht11),
            Err(SensorError::ChecksumMismatch)
        );
    }

    #[test]
    fn impossible_humidity_is_rejected() {
        let frame = with_checksum([120, 0, 25, 0, 0]);
        assert_eq!(
            decode(frame, SensorModel::Dht11),
            Err(SensorError::InvalidData)
        );
    }
}
