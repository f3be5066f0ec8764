use std::env;

use fugit::MillisDurationU32;
use inquire::Select;
use serialport::SerialPort;
use sinilink_xy6020l::{
    link::SerialLink, psu::Xy6020l, scaling::ScalingFactors, timing::TransactionTiming,
    transaction::DEFAULT_UNIT_ID,
};

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 115200;
// USB serial adapters add latency, the converter's own timing is too tight for them.
const SERIAL_TIMEOUT_MS: u32 = 300;
const OUTPUT_VOLTAGE_MV: u32 = 5500; // 5.5V
const CURRENT_LIMIT_MA: u32 = 100; // 0.1A
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            // The executor relies on this to spot a short reply.
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl SerialLink for PortWrapper {
    fn set_read_timeout(&mut self, timeout: MillisDurationU32) -> Result<(), Self::Error> {
        let timeout = std::time::Duration::from_millis(timeout.to_millis() as u64);
        self.0
            .set_timeout(timeout)
            .map_err(|e| IoError(std::io::Error::from(e)))
    }

    fn delay(&mut self, duration: MillisDurationU32) {
        std::thread::sleep(std::time::Duration::from_millis(duration.to_millis() as u64));
    }
}

fn print_status(psu: &Xy6020l<PortWrapper>) {
    let scaling = ScalingFactors::XY6020L;
    let regs = psu.registers();
    println!(
        "Model: {}  Firmware: {}  Address: {}  Baud: {:?}",
        regs.get_model(),
        regs.get_version(),
        regs.get_address(),
        regs.get_baudrate()
    );
    println!(
        "Set: {:.2}V {:.2}A  Out: {:.2}V {:.2}A {:.1}W  In: {:.2}V",
        scaling.raw_to_voltage_mv(regs.get_set_volt()) as f32 / 1000.0,
        scaling.raw_to_current_ma(regs.get_set_current()) as f32 / 1000.0,
        scaling.raw_to_voltage_mv(regs.get_actual_volt()) as f32 / 1000.0,
        scaling.raw_to_current_ma(regs.get_actual_current()) as f32 / 1000.0,
        scaling.raw_to_power_mw(regs.get_power()) as f32 / 1000.0,
        scaling.raw_to_voltage_mv(regs.get_input_volt()) as f32 / 1000.0,
    );
    println!(
        "Output: {:?} ({:?}) for {}s  Charge: {}mAh  Energy: {}mWh",
        regs.get_switch_state(),
        regs.get_constant_state(),
        regs.get_output_time().to_secs(),
        scaling.raw_to_capacity_mah(regs.get_amp_hour()),
        scaling.raw_to_energy_mwh(regs.get_watt_hour()),
    );
    println!(
        "Internal temperature: {:?}  Protection: {:?}  Loaded preset: {:?}",
        regs.get_internal_temperature(),
        regs.get_protection_status(),
        regs.get_loaded_preset()
    );
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let port = serialport::new(&port_name, BAUD_RATE)
        .open()
        .expect("Failed to open serial port");

    let timing = TransactionTiming::default()
        .with_read_timeout(MillisDurationU32::millis(SERIAL_TIMEOUT_MS))
        .with_write_timeout(MillisDurationU32::millis(SERIAL_TIMEOUT_MS));
    let mut psu = Xy6020l::with_timing(PortWrapper(port), DEFAULT_UNIT_ID, timing);

    psu.refresh().expect("Failed to read registers");
    print_status(&psu);

    psu.set_output_voltage_mv(OUTPUT_VOLTAGE_MV).unwrap();
    println!("Set output voltage to {}V", OUTPUT_VOLTAGE_MV as f32 / 1000.0);

    psu.set_current_limit_ma(CURRENT_LIMIT_MA).unwrap();
    println!("Set current limit to {}A", CURRENT_LIMIT_MA as f32 / 1000.0);

    psu.set_switch_state(true).unwrap();
    println!("Output enabled");

    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    psu.refresh().expect("Failed to read registers");
    print_status(&psu);

    if let Some(group) = psu.registers().get_loaded_preset() {
        println!("\n--- Loaded preset ---");
        let preset = psu.fetch_preset(group).unwrap();
        println!("{:#?}", preset);
        println!("Over time protection: {}min", preset.over_time().to_minutes());
    }

    psu.set_switch_state(false).unwrap();
    println!("Output disabled");
}
