use fugit::Duration;
use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};
use thiserror::Error;

use crate::{
    codec::{dword_at, flag_at, put_dword, put_word, word_at},
    error::InvalidArgument,
    register::State,
};

/// The base address of the first preset registers.
///
/// Base address of preset = PRESET_OFFSET + {group number} * PRESET_STRIDE.
///
/// There are 10 groups: M0 - M9.
pub const PRESET_OFFSET: u16 = 0x50;

/// Each group is given 16 registers, of which the first [`PRESET_REGISTERS`] are used.
pub const PRESET_STRIDE: u16 = 0x10;

/// Registers used by one preset group.
pub const PRESET_REGISTERS: u16 = XyPresetOffsets::COUNT as u16;

/// Size of one encoded preset group on the wire.
pub const PRESET_BLOCK_LEN: usize = 2 * XyPresetOffsets::COUNT;

/// One stored preset group, in raw register units.
///
/// Voltages are in centi-volts, currents in centi-amps, power in deci-watts, charge in mAh,
/// energy in mWh and temperature in tenths of a degree of the configured unit.
///
/// Use [`XyPresetBuilder`] to create one from scratch, or
/// [`Xy6020l::fetch_preset`](crate::psu::Xy6020l::fetch_preset) to read one back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XyPreset {
    /// Index number of this preset group (0 - 9).
    pub group: PresetGroup,
    /// Output voltage setting.
    pub voltage_set: u16,
    /// Output current limit.
    pub current_set: u16,
    /// Low (input) voltage protection.
    pub low_voltage_protect: u16,
    pub over_voltage_protect: u16,
    pub over_current_protect: u16,
    pub over_power_protect: u16,
    pub over_time_hours: u16,
    pub over_time_minutes: u16,
    /// Over charge protection, spans two registers.
    pub over_charge: u32,
    /// Over energy protection, spans two registers.
    pub over_energy: u32,
    pub over_temperature: u16,
    /// What state the output should be in when the preset is loaded.
    pub initial_output: State,
}

impl XyPreset {
    /// Address of the first register of this preset's group.
    pub fn start_address(&self) -> u16 {
        XyPresetOffsets::VSet.address_in_group(self.group)
    }

    /// Over time protection as a duration.
    pub fn over_time(&self) -> Duration<u32, 1, 1> {
        Duration::<u32, 1, 1>::hours(self.over_time_hours as u32)
            + Duration::<u32, 1, 1>::minutes(self.over_time_minutes as u32)
    }

    /// The protection part of this preset.
    pub fn protections(&self) -> ProtectionConfig {
        ProtectionConfig {
            low_voltage: self.low_voltage_protect,
            over_voltage: self.over_voltage_protect,
            over_current: self.over_current_protect,
            over_power: self.over_power_protect,
            over_time_hours: self.over_time_hours,
            over_time_minutes: self.over_time_minutes,
            over_charge: self.over_charge,
            over_energy: self.over_energy,
            over_temperature: self.over_temperature,
        }
    }

    /// Encode this preset the way the device stores it.
    pub fn encode(&self) -> [u8; PRESET_BLOCK_LEN] {
        use XyPresetOffsets as XPO;

        let mut block = [0u8; PRESET_BLOCK_LEN];
        put_word(&mut block, XPO::VSet.index(), self.voltage_set);
        put_word(&mut block, XPO::ISet.index(), self.current_set);
        put_word(&mut block, XPO::SLvp.index(), self.low_voltage_protect);
        put_word(&mut block, XPO::SOvp.index(), self.over_voltage_protect);
        put_word(&mut block, XPO::SOcp.index(), self.over_current_protect);
        put_word(&mut block, XPO::SOpp.index(), self.over_power_protect);
        put_word(&mut block, XPO::SOhpH.index(), self.over_time_hours);
        put_word(&mut block, XPO::SOhpM.index(), self.over_time_minutes);
        put_dword(&mut block, XPO::SOahL.index(), self.over_charge);
        put_dword(&mut block, XPO::SOwhL.index(), self.over_energy);
        put_word(&mut block, XPO::SOtp.index(), self.over_temperature);
        put_word(&mut block, XPO::SIni.index(), self.initial_output.into());
        block
    }

    /// Decode a preset group as read back from the device.
    pub fn decode(group: PresetGroup, block: &[u8; PRESET_BLOCK_LEN]) -> Self {
        use XyPresetOffsets as XPO;

        XyPreset {
            group,
            voltage_set: word_at(block, XPO::VSet.index()),
            current_set: word_at(block, XPO::ISet.index()),
            low_voltage_protect: word_at(block, XPO::SLvp.index()),
            over_voltage_protect: word_at(block, XPO::SOvp.index()),
            over_current_protect: word_at(block, XPO::SOcp.index()),
            over_power_protect: word_at(block, XPO::SOpp.index()),
            over_time_hours: word_at(block, XPO::SOhpH.index()),
            over_time_minutes: word_at(block, XPO::SOhpM.index()),
            over_charge: dword_at(block, XPO::SOahL.index()),
            over_energy: dword_at(block, XPO::SOwhL.index()),
            over_temperature: word_at(block, XPO::SOtp.index()),
            initial_output: State::from(flag_at(block, XPO::SIni.index())),
        }
    }
}

/// Use this type to create a preset.
pub struct XyPresetBuilder {
    /// Index number of this preset group (0 - 9).
    group: Option<PresetGroup>,
    /// Output voltage value, centi-volts.
    voltage_set: u16,
    /// Output current limit value, centi-amps.
    current_set: u16,
    /// Protection configuration levels.
    protection: ProtectionConfig,
    /// What state the output should be in when the preset is loaded.
    initial_output: State,
}

#[allow(clippy::derivable_impls)]
impl Default for XyPresetBuilder {
    fn default() -> Self {
        XyPresetBuilder {
            group: None,
            voltage_set: 0,
            current_set: 0,
            protection: ProtectionConfig::default(),
            initial_output: State::default(),
        }
    }
}

impl XyPresetBuilder {
    pub fn new(
        group: impl Into<PresetGroup>,
        voltage_set: u16,
        current_set: u16,
    ) -> XyPresetBuilder {
        XyPresetBuilder {
            group: Some(group.into()),
            voltage_set,
            current_set,
            ..Default::default()
        }
    }

    /// Let's build it!
    pub fn build(self) -> Result<XyPreset, XyPresetBuilderError> {
        let Some(group) = self.group else {
            return Err(XyPresetBuilderError::InvalidGroupIndex);
        };
        let p = self.protection;
        Ok(XyPreset {
            group,
            voltage_set: self.voltage_set,
            current_set: self.current_set,
            low_voltage_protect: p.low_voltage,
            over_voltage_protect: p.over_voltage,
            over_current_protect: p.over_current,
            over_power_protect: p.over_power,
            over_time_hours: p.over_time_hours,
            over_time_minutes: p.over_time_minutes,
            over_charge: p.over_charge,
            over_energy: p.over_energy,
            over_temperature: p.over_temperature,
            initial_output: self.initial_output,
        })
    }

    /// Set the preset group this is written to.
    pub fn for_group(mut self, group: impl Into<PresetGroup>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set all protection options at once.
    pub fn with_protections(mut self, protections: ProtectionConfig) -> Self {
        self.protection = protections;
        self
    }

    /// Set output voltage level, centi-volts.
    pub fn with_set_v(mut self, voltage_set: u16) -> Self {
        self.voltage_set = voltage_set;
        self
    }

    /// Set output current limit, centi-amps.
    pub fn with_set_i_lim(mut self, current_set: u16) -> Self {
        self.current_set = current_set;
        self
    }

    /// Set output state.
    pub fn with_output(mut self, output_enable: impl Into<State>) -> Self {
        self.initial_output = output_enable.into();
        self
    }

    /// Set input under-voltage protection level in preset.
    pub fn with_lvp(mut self, voltage: u16) -> Self {
        self.protection.low_voltage = voltage;
        self
    }

    /// Set over-voltage protection level in preset.
    pub fn with_ovp(mut self, voltage: u16) -> Self {
        self.protection.over_voltage = voltage;
        self
    }

    /// Set over-current protection level in preset.
    pub fn with_ocp(mut self, current: u16) -> Self {
        self.protection.over_current = current;
        self
    }

    /// Set over-power protection level in preset.
    pub fn with_opp(mut self, power: u16) -> Self {
        self.protection.over_power = power;
        self
    }

    /// Set over time protection level in preset. Seconds are dropped, hours saturate.
    pub fn with_ohp(mut self, duration: Duration<u32, 1, 1>) -> Self {
        self.protection.over_time_hours = duration.to_hours().min(u16::MAX as u32) as u16;
        self.protection.over_time_minutes = (duration.to_minutes() % 60) as u16;
        self
    }

    /// Set over charge protection level in preset. Units: mAh.
    pub fn with_oahp(mut self, charge: u32) -> Self {
        self.protection.over_charge = charge;
        self
    }

    /// Set over energy protection level in preset. Units: mWh.
    pub fn with_owhp(mut self, energy: u32) -> Self {
        self.protection.over_energy = energy;
        self
    }

    /// Set over temperature protection level in preset, in the unit the device is set to.
    pub fn with_otp(mut self, temperature: u16) -> Self {
        self.protection.over_temperature = temperature;
        self
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum XyPresetBuilderError {
    #[error("Preset group no not set")]
    InvalidGroupIndex,
}

/// The protection features of a preset, in raw register units. E.g. over-voltage protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionConfig {
    /// Input under-voltage protection level, centi-volts.
    pub low_voltage: u16,
    /// Over-voltage protection level, centi-volts.
    pub over_voltage: u16,
    /// Over-current protection level, centi-amps.
    pub over_current: u16,
    /// Over-power protection level, deci-watts.
    pub over_power: u16,
    pub over_time_hours: u16,
    pub over_time_minutes: u16,
    /// Over charge protection level, mAh.
    pub over_charge: u32,
    /// Over energy protection level, mWh.
    pub over_energy: u32,
    /// Over-temperature protection level, tenths of a degree in the configured unit.
    pub over_temperature: u16,
}

/// Default protections are essentially disabled.
impl Default for ProtectionConfig {
    fn default() -> Self {
        ProtectionConfig {
            low_voltage: 0,
            over_voltage: 6200,
            over_current: 2100,
            over_power: 12_500,
            over_time_hours: 0,
            over_time_minutes: 0,
            over_charge: 0,
            over_energy: 0,
            over_temperature: 1100,
        }
    }
}

/// These are the offsets from the base address of each preset group.
///
/// See [`PRESET_OFFSET`] for calculating the base address of any group.
#[derive(Debug, Copy, Clone, EnumCountMacro, EnumIter, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum XyPresetOffsets {
    /// __R/W__ - Voltage setting.
    VSet = 0x00,
    /// __R/W__ - Current setting.
    ISet = 0x01,
    /// __R/W__ - Low voltage protection.
    SLvp = 0x02,
    /// __R/W__ - Over voltage protection.
    SOvp = 0x03,
    /// __R/W__ - Over current protection.
    SOcp = 0x04,
    /// __R/W__ - Over power protection.
    SOpp = 0x05,
    /// __R/W__ - Over time protection - hours.
    SOhpH = 0x06,
    /// __R/W__ - Over time protection - minutes.
    SOhpM = 0x07,
    /// __R/W__ - Over capacity protection lower 16 bits.
    SOahL = 0x08,
    /// __R/W__ - Over capacity protection upper 16 bits.
    SOahH = 0x09,
    /// __R/W__ - Over energy protection lower 16 bits.
    SOwhL = 0x0A,
    /// __R/W__ - Over energy protection upper 16 bits.
    SOwhH = 0x0B,
    /// __R/W__ - Over temperature protection.
    SOtp = 0x0C,
    /// __R/W__ - Power output enable switch.
    SIni = 0x0D,
}

impl XyPresetOffsets {
    /// Return the address of this register provided the group number (0 - 9).
    pub fn address_in_group(&self, group: PresetGroup) -> u16 {
        PRESET_OFFSET + (group as u16 * PRESET_STRIDE) + *self as u16
    }

    /// Index of this register within an encoded preset block.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// This enum represents all possible preset groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum PresetGroup {
    #[default]
    Group0 = 0x00,
    Group1 = 0x01,
    Group2 = 0x02,
    Group3 = 0x03,
    Group4 = 0x04,
    Group5 = 0x05,
    Group6 = 0x06,
    Group7 = 0x07,
    Group8 = 0x08,
    Group9 = 0x09,
}

impl TryFrom<u16> for PresetGroup {
    type Error = InvalidArgument;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use PresetGroup as PG;
        match value {
            0 => Ok(PG::Group0),
            1 => Ok(PG::Group1),
            2 => Ok(PG::Group2),
            3 => Ok(PG::Group3),
            4 => Ok(PG::Group4),
            5 => Ok(PG::Group5),
            6 => Ok(PG::Group6),
            7 => Ok(PG::Group7),
            8 => Ok(PG::Group8),
            9 => Ok(PG::Group9),
            other => Err(InvalidArgument::PresetSlot(other)),
        }
    }
}

impl TryFrom<u8> for PresetGroup {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PresetGroup::try_from(value as u16)
    }
}

impl From<PresetGroup> for u16 {
    fn from(value: PresetGroup) -> Self {
        value as u16
    }
}
