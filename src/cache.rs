//! A snapshot of the live registers, and the typed getters that read from it.

use fugit::SecsDurationU32;
use log::debug;

use crate::{
    codec::{dword_at, flag_at, low_byte_at, word_at},
    error::Result,
    frame::MAX_READ_REGISTERS,
    link::SerialLink,
    preset::PresetGroup,
    register::{
        BacklightBrightness, BaudRate, ControlMode, ProtectionStatus, State, Temperature,
        TemperatureUnit, XyRegister,
    },
    transaction::Transactor,
};

/// Registers covered by one refresh, `0x00..=0x1D`.
pub const CACHED_REGISTERS: u16 = MAX_READ_REGISTERS;
/// Size of the cached snapshot in bytes.
pub const CACHE_LEN: usize = 2 * CACHED_REGISTERS as usize;

/// The most recent bulk read of the live registers.
///
/// Getters never touch the link; they only make sense after a successful [refresh](Self::refresh).
/// A failed refresh keeps the previous snapshot, so check its result before trusting the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCache {
    bytes: [u8; CACHE_LEN],
    populated: bool,
}

impl Default for RegisterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterCache {
    pub const fn new() -> Self {
        Self {
            bytes: [0; CACHE_LEN],
            populated: false,
        }
    }

    /// Fetch all live registers in a single transaction and replace the snapshot with them.
    ///
    /// On failure the snapshot is left exactly as it was.
    pub fn refresh<S: SerialLink>(
        &mut self,
        transactor: &mut Transactor<S>,
    ) -> Result<(), S::Error> {
        let data = transactor.read_holdings(XyRegister::VSet.into(), CACHED_REGISTERS)?;
        self.bytes.copy_from_slice(data);
        self.populated = true;
        debug!("Register cache refreshed");
        Ok(())
    }

    /// Whether any refresh has succeeded yet.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// The raw snapshot, two big-endian bytes per register.
    pub fn as_bytes(&self) -> &[u8; CACHE_LEN] {
        &self.bytes
    }

    pub fn word(&self, register: XyRegister) -> u16 {
        word_at(&self.bytes, register.index())
    }

    /// 32-bit value with its low word in `low` and high word in the register after it.
    pub fn dword(&self, low: XyRegister) -> u32 {
        dword_at(&self.bytes, low.index())
    }

    pub fn flag(&self, register: XyRegister) -> bool {
        flag_at(&self.bytes, register.index())
    }

    pub fn low_byte(&self, register: XyRegister) -> u8 {
        low_byte_at(&self.bytes, register.index())
    }

    /// Output voltage setting, centi-volts.
    pub fn get_set_volt(&self) -> u16 {
        self.word(XyRegister::VSet)
    }

    /// Output current limit, centi-amps.
    pub fn get_set_current(&self) -> u16 {
        self.word(XyRegister::ISet)
    }

    /// Measured output voltage, centi-volts.
    pub fn get_actual_volt(&self) -> u16 {
        self.word(XyRegister::VOut)
    }

    /// Measured output current, centi-amps.
    pub fn get_actual_current(&self) -> u16 {
        self.word(XyRegister::IOut)
    }

    /// Measured output power, deci-watts.
    pub fn get_power(&self) -> u16 {
        self.word(XyRegister::Power)
    }

    /// Measured input voltage, centi-volts.
    pub fn get_input_volt(&self) -> u16 {
        self.word(XyRegister::UIn)
    }

    /// Accumulated output charge, mAh.
    pub fn get_amp_hour(&self) -> u32 {
        self.dword(XyRegister::AhLow)
    }

    /// Accumulated output energy, mWh.
    pub fn get_watt_hour(&self) -> u32 {
        self.dword(XyRegister::WhLow)
    }

    pub fn get_output_hour(&self) -> u16 {
        self.word(XyRegister::OutH)
    }

    pub fn get_output_min(&self) -> u16 {
        self.word(XyRegister::OutM)
    }

    pub fn get_output_sec(&self) -> u16 {
        self.word(XyRegister::OutS)
    }

    /// How long the output has been on.
    pub fn get_output_time(&self) -> SecsDurationU32 {
        SecsDurationU32::hours(self.get_output_hour() as u32)
            + SecsDurationU32::minutes(self.get_output_min() as u32)
            + SecsDurationU32::secs(self.get_output_sec() as u32)
    }

    /// Internal temperature, tenths of a degree in the unit from [Self::get_temp_symbol].
    pub fn get_internal_temp(&self) -> u16 {
        self.word(XyRegister::TIn)
    }

    /// External probe temperature, tenths of a degree in the unit from [Self::get_temp_symbol].
    pub fn get_external_temp(&self) -> u16 {
        self.word(XyRegister::TEx)
    }

    pub fn get_internal_temperature(&self) -> Temperature {
        Temperature::new(self.get_internal_temp(), self.get_temp_symbol())
    }

    pub fn get_external_temperature(&self) -> Temperature {
        Temperature::new(self.get_external_temp(), self.get_temp_symbol())
    }

    pub fn get_lock_state(&self) -> State {
        State::from(self.flag(XyRegister::Lock))
    }

    /// Whether any protection has tripped.
    pub fn get_protect_state(&self) -> bool {
        self.flag(XyRegister::Protect)
    }

    /// Which protection has tripped, if any.
    pub fn get_protection_status(&self) -> ProtectionStatus {
        ProtectionStatus::from(self.low_byte(XyRegister::Protect) as u16)
    }

    /// Currently active regulation mode.
    pub fn get_constant_state(&self) -> ControlMode {
        ControlMode::from(self.flag(XyRegister::CvCc))
    }

    /// Whether the output is switched on.
    pub fn get_switch_state(&self) -> State {
        State::from(self.flag(XyRegister::OnOff))
    }

    pub fn get_temp_symbol(&self) -> TemperatureUnit {
        TemperatureUnit::from(self.flag(XyRegister::FC))
    }

    /// `None` if the device reports a level outside 0-5.
    pub fn get_backlight(&self) -> Option<BacklightBrightness> {
        BacklightBrightness::try_from(self.word(XyRegister::BLed)).ok()
    }

    /// Minutes until the screen turns off.
    pub fn get_sleep_time(&self) -> u16 {
        self.word(XyRegister::Sleep)
    }

    pub fn get_model(&self) -> u8 {
        self.low_byte(XyRegister::Model)
    }

    /// Decimal value of `136` -> `v1.3.6`.
    pub fn get_version(&self) -> u8 {
        self.low_byte(XyRegister::Version)
    }

    /// The slave address the device has stored.
    pub fn get_address(&self) -> u8 {
        self.low_byte(XyRegister::SlaveAdd)
    }

    /// Raw baud rate code, see [BaudRate].
    pub fn get_baudrate_code(&self) -> u8 {
        self.low_byte(XyRegister::BaudRateL)
    }

    pub fn get_baudrate(&self) -> Option<BaudRate> {
        BaudRate::try_from(self.get_baudrate_code()).ok()
    }

    pub fn get_internal_temp_offset(&self) -> u16 {
        self.word(XyRegister::TInOffset)
    }

    pub fn get_external_temp_offset(&self) -> u16 {
        self.word(XyRegister::TExOffset)
    }

    /// The preset group that was loaded last. `None` if the device reports something outside 0-9.
    pub fn get_loaded_preset(&self) -> Option<PresetGroup> {
        PresetGroup::try_from(self.low_byte(XyRegister::ExtractM)).ok()
    }
}
