#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::fmt::Write as _;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_time::{Delay, Duration, Timer};
use esp_hal::{
    clock::CpuClock,
    gpio::{DriveMode, Flex, Level, Output, OutputConfig, Pull},
    timer::systimer::SystemTimer,
};
use thermo_watch::{config, DhtSensor, Lcd, LcdError, Reading, SensorError, TempBand};
use {esp_backtrace as _, esp_println as _};

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

type SensorChannel = Channel<NoopRawMutex, Result<Reading, SensorError>, 1>;

type PanelLcd = Lcd<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Delay,
>;

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    info!("Embassy initialized!");

    // Pin choices live in `thermo_watch::config`; the typed GPIO handles
    // below must stay in sync with that table.
    let red = Output::new(peripherals.GPIO10, Level::Low, OutputConfig::default());
    let green = Output::new(peripherals.GPIO8, Level::Low, OutputConfig::default());
    let yellow = Output::new(peripherals.GPIO9, Level::Low, OutputConfig::default());
    let buzzer = Output::new(peripherals.GPIO7, Level::Low, OutputConfig::default());

    let lcd = Lcd::new(
        Output::new(peripherals.GPIO12, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO11, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO5, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO3, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default()),
        Delay,
    );

    // The DHT11 shares one line for both directions: open-drain output
    // with the input stage left enabled.
    let mut dht_pin = Flex::new(peripherals.GPIO13);
    dht_pin.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    dht_pin.set_input_enable(true);
    dht_pin.set_output_enable(true);
    dht_pin.set_high();

    let sensor_channel = &*mk_static!(SensorChannel, Channel::new());

    spawner.spawn(dht_task(dht_pin, sensor_channel)).ok();
    spawner
        .spawn(monitor_task(red, green, yellow, buzzer, lcd, sensor_channel))
        .ok();
    info!("Monitor running");
}

#[embassy_executor::task]
async fn dht_task(pin: Flex<'static>, sensor_channel: &'static SensorChannel) {
    let mut dht = DhtSensor::new(pin, Delay, config::DHT_MODEL);
    loop {
        // The DHT11 needs more than a second between conversions.
        Timer::after(Duration::from_secs(2)).await;
        let result = dht.read();
        if let Err(e) = result {
            warn!("DHT read failed: {}", e);
        }
        sensor_channel.try_send(result).ok();
    }
}

#[embassy_executor::task]
async fn monitor_task(
    mut red: Output<'static>,
    mut green: Output<'static>,
    mut yellow: Output<'static>,
    mut buzzer: Output<'static>,
    mut lcd: PanelLcd,
    sensor_channel: &'static SensorChannel,
) {
    match lcd.init() {
        Ok(()) => info!("LCD initialized"),
        Err(e) => warn!("LCD init failed: {}", e),
    }

    loop {
        match sensor_channel.receive().await {
            Ok(reading) => {
                let band = reading.band();
                info!(
                    "{} C, {} %RH -> {}",
                    reading.temperature, reading.humidity, band
                );

                green.set_level(Level::from(matches!(
                    band,
                    TempBand::Cold | TempBand::Normal
                )));
                yellow.set_level(Level::from(band == TempBand::Warm));
                red.set_level(Level::from(band == TempBand::Hot));
                // Audible alarm only above the high threshold.
                buzzer.set_level(Level::from(band == TempBand::Hot));

                if let Err(e) = show_reading(&mut lcd, &reading, band) {
                    warn!("LCD write failed: {}", e);
                }
            }
            Err(_) => {
                // Keep the LEDs on their last state but silence the
                // alarm while the sensor is unreadable.
                buzzer.set_low();
                if let Err(e) = show_sensor_error(&mut lcd) {
                    warn!("LCD write failed: {}", e);
                }
            }
        }
    }
}

fn show_reading(lcd: &mut PanelLcd, reading: &Reading, band: TempBand) -> Result<(), LcdError> {
    let mut line: heapless::String<16> = heapless::String::new();
    let _ = write!(line, "{:.1}C {:.0}%", reading.temperature, reading.humidity);

    lcd.clear()?;
    lcd.write_str(&line)?;
    lcd.set_cursor(1, 0)?;
    lcd.write_str(band.label())
}

fn show_sensor_error(lcd: &mut PanelLcd) -> Result<(), LcdError> {
    lcd.clear()?;
    lcd.write_str("SENSOR ERROR")?;
    lcd.set_cursor(1, 0)?;
    lcd.write_str("CHECK DHT11")
}
