//! HD44780 character LCD driver, 4-bit bus.
//!
//! Uses six GPIO lines: register select, enable, and the high half of the
//! data bus (d4..d7). Every byte goes out as two enable-pulsed nibbles,
//! high nibble first.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

const CMD_CLEAR: u8 = 0x01;
/// Increment cursor, no display shift.
const CMD_ENTRY_MODE: u8 = 0x06;
/// Display on, cursor and blink off.
const CMD_DISPLAY_ON: u8 = 0x0c;
/// 4-bit bus, two lines, 5x8 font.
const CMD_FUNCTION_SET: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each display row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

pub const LCD_COLS: u8 = 16;
pub const LCD_ROWS: u8 = 2;

/// A GPIO write failed. The esp-hal pins are infallible, but the driver is
/// generic over `embedded-hal` pins and keeps the error visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct LcdError;

pub struct Lcd<RS, EN, D4, D5, D6, D7, D> {
    rs: RS,
    en: EN,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
    delay: D,
}

impl<RS, EN, D4, D5, D6, D7, D> Lcd<RS, EN, D4, D5, D6, D7, D>
where
    RS: OutputPin,
    EN: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
    D: DelayNs,
{
    pub fn new(rs: RS, en: EN, d4: D4, d5: D5, d6: D6, d7: D7, delay: D) -> Self {
        Lcd {
            rs,
            en,
            d4,
            d5,
            d6,
            d7,
            delay,
        }
    }

    /// Init-by-instruction sequence from the HD44780 datasheet. Must run
    /// once after power-up, before any other operation.
    pub fn init(&mut self) -> Result<(), LcdError> {
        self.delay.delay_ms(50);
        set_pin(&mut self.rs, false)?;
        set_pin(&mut self.en, false)?;

        // Three 8-bit function-set nibbles force a known state whatever
        // mode the controller woke up in.
        self.write_nibble(0x03)?;
        self.delay.delay_ms(5);
        self.write_nibble(0x03)?;
        self.delay.delay_ms(5);
        self.write_nibble(0x03)?;
        self.delay.delay_us(150);
        // Switch to the 4-bit bus.
        self.write_nibble(0x02)?;

        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_ENTRY_MODE)?;
        self.clear()
    }

    pub fn clear(&mut self) -> Result<(), LcdError> {
        self.command(CMD_CLEAR)?;
        // Clear is the slowest instruction.
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Move the cursor. Positions outside the 16x2 panel are clamped to
    /// the last cell of the addressed row.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), LcdError> {
        self.command(CMD_SET_DDRAM | ddram_addr(row, col))
    }

    /// Write text at the cursor. Only ASCII maps directly to the HD44780
    /// character ROM; other bytes come out as whatever the ROM holds there.
    pub fn write_str(&mut self, s: &str) -> Result<(), LcdError> {
        for byte in s.bytes() {
            self.write_byte(byte, true)?;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), LcdError> {
        self.write_byte(cmd, false)
    }

    fn write_byte(&mut self, byte: u8, is_data: bool) -> Result<(), LcdError> {
        set_pin(&mut self.rs, is_data)?;
        let (high, low) = nibbles(byte);
        self.write_nibble(high)?;
        self.write_nibble(low)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), LcdError> {
        set_pin(&mut self.d4, nibble & 0x01 != 0)?;
        set_pin(&mut self.d5, nibble & 0x02 != 0)?;
        set_pin(&mut self.d6, nibble & 0x04 != 0)?;
        set_pin(&mut self.d7, nibble & 0x08 != 0)?;

        // Enable pulse, then leave time for the controller to latch.
        set_pin(&mut self.en, true)?;
        self.delay.delay_us(1);
        set_pin(&mut self.en, false)?;
        self.delay.delay_us(50);
        Ok(())
    }
}

fn set_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), LcdError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| LcdError)
}

const fn nibbles(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0f)
}

const fn ddram_addr(row: u8, col: u8) -> u8 {
    let row = if row >= LCD_ROWS { LCD_ROWS - 1 } else { row };
    let col = if col >= LCD_COLS { LCD_COLS - 1 } else { col };
    ROW_OFFSETS[row as usize] + col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_split_high_nibble_first() {
        assert_eq!(nibbles(0x28), (0x02, 0x08));
        assert_eq!(nibbles(0xf0), (0x0f, 0x00));
        assert_eq!(nibbles(b'A'), (0x04, 0x01));
    }

    #[test]
    fn second_row_starts_at_0x40() {
        assert_eq!(ddram_addr(0, 0), 0x00);
        assert_eq!(ddram_addr(0, 5), 0x05);
        assert_eq!(ddram_addr(1, 0), 0x40);
        assert_eq!(ddram_addr(1, 15), 0x4f);
    }

    #[test]
    fn out_of_panel_positions_clamp() {
        assert_eq!(ddram_addr(5, 0), 0x40);
        assert_eq!(ddram_addr(0, 99), 0x0f);
        assert_eq!(ddram_addr(9, 99), 0x4f);
    }
}
