//! This module is used to define the registers on the XY6020L, and the logical values some of
//! them hold.

use strum_macros::EnumIter;

/// The live status/config registers.
///
/// Registers `0x00..=0x1D` are fetched in one bulk read and kept in the
/// [RegisterCache](crate::cache::RegisterCache); the discriminant doubles as the index into it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum XyRegister {
    /// __R/W__ - Voltage setting.
    ///
    /// Value is u16 in centi-volts. E.g. 5.0V => `500`.
    VSet = 0x00,
    /// __R/W__ - Current setting.
    ///
    /// Value is u16 in centi-amps. E.g. 1.5A => `150`.
    ISet = 0x01,
    /// __R__ - Output voltage display value, centi-volts.
    VOut = 0x02,
    /// __R__ - Output current display value, centi-amps.
    IOut = 0x03,
    /// __R__ - Output power display value, deci-watts.
    Power = 0x04,
    /// __R__ - Input voltage display value, centi-volts.
    UIn = 0x05,
    /// __R__ - Output charge, low 16 bits. Units of mAh.
    AhLow = 0x06,
    /// __R__ - Output charge, high 16 bits.
    AhHigh = 0x07,
    /// __R__ - Output energy, low 16 bits. Units of mWh.
    WhLow = 0x08,
    /// __R__ - Output energy, high 16 bits.
    WhHigh = 0x09,
    /// __R__ - Output on time, hours.
    OutH = 0x0A,
    /// __R__ - Output on time, minutes.
    OutM = 0x0B,
    /// __R__ - Output on time, seconds.
    OutS = 0x0C,
    /// __R__ - Internal temperature value, tenths of a degree.
    TIn = 0x0D,
    /// __R__ - External temperature value, tenths of a degree.
    TEx = 0x0E,
    /// __R/W__ - Key lock.
    /// * `0` - Unlocked.
    /// * `1` - Locked.
    Lock = 0x0F,
    /// __R/W__ - Protect status.
    ///
    /// See [`ProtectionStatus`] for possible protection statuses. Write `0` to clear.
    Protect = 0x10,
    /// __R__ - Constant voltage constant current state.
    /// * `0` - CV.
    /// * `1` - CC.
    ///
    /// See [`ControlMode`].
    CvCc = 0x11,
    /// __R/W__ - Switched output.
    /// * `0` - Off.
    /// * `1` - On.
    OnOff = 0x12,
    /// __R/W__ - The temperature symbol. See [`TemperatureUnit`].
    FC = 0x13,
    /// __R/W__ - Backlight brightness level.
    ///
    /// Range = 0-5.
    ///
    /// 0 is darkest, and 5 is the brightest.
    BLed = 0x14,
    /// __R/W__ - Screen off time, minutes.
    Sleep = 0x15,
    /// __R__ - Product model.
    Model = 0x16,
    /// __R__ - Firmware version number.
    Version = 0x17,
    /// __R/W__ - Slave address of the machine.
    SlaveAdd = 0x18,
    /// __R/W__ - Baud rate.
    ///
    /// See [`BaudRate`] for possible options.
    BaudRateL = 0x19,
    /// __R/W__ - Internal temperature correction.
    TInOffset = 0x1A,
    /// __R/W__ - External temperature correction.
    TExOffset = 0x1B,
    /// __R/W__ - Quickly call up the data group.
    ///
    /// The write value is 0-9, and the corresponding preset will be loaded after writing.
    ExtractM = 0x1D,
}

impl XyRegister {
    /// Index of this register within the live register block.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl From<XyRegister> for u16 {
    fn from(value: XyRegister) -> Self {
        value as u16
    }
}

/// Represents the two possible power supply control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

impl From<bool> for ControlMode {
    fn from(value: bool) -> Self {
        match value {
            false => ControlMode::Cv,
            true => ControlMode::Cc,
        }
    }
}

impl From<ControlMode> for u16 {
    fn from(value: ControlMode) -> Self {
        match value {
            ControlMode::Cv => 0x00,
            ControlMode::Cc => 0x01,
        }
    }
}

/// Used for setting and reading unit used for temperature readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum TemperatureUnit {
    Celsius = 0x00,
    Fahrenheit = 0x01,
}

impl From<bool> for TemperatureUnit {
    fn from(value: bool) -> Self {
        match value {
            false => TemperatureUnit::Celsius,
            true => TemperatureUnit::Fahrenheit,
        }
    }
}

impl From<TemperatureUnit> for u16 {
    fn from(value: TemperatureUnit) -> Self {
        value as u16
    }
}

/// All baud rates the XY6020L can be configured for, by register code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum BaudRate {
    _9600 = 0,
    _14400 = 1,
    _19200 = 2,
    _38400 = 3,
    _56000 = 4,
    _57600 = 5,
    /// This is the default baud rate.
    _115200 = 6,
    _2400 = 7,
    _4800 = 8,
}

impl BaudRate {
    /// Returns the numeric baud rate value.
    pub const fn as_baud(self) -> u32 {
        match self {
            Self::_9600 => 9600,
            Self::_14400 => 14_400,
            Self::_19200 => 19_200,
            Self::_38400 => 38_400,
            Self::_56000 => 56_000,
            Self::_57600 => 57_600,
            Self::_115200 => 115_200,
            Self::_2400 => 2400,
            Self::_4800 => 4800,
        }
    }
}

impl TryFrom<u8> for BaudRate {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use BaudRate as BR;
        match value {
            0 => Ok(BR::_9600),
            1 => Ok(BR::_14400),
            2 => Ok(BR::_19200),
            3 => Ok(BR::_38400),
            4 => Ok(BR::_56000),
            5 => Ok(BR::_57600),
            6 => Ok(BR::_115200),
            7 => Ok(BR::_2400),
            8 => Ok(BR::_4800),
            other => Err(other),
        }
    }
}

impl From<BaudRate> for u16 {
    fn from(value: BaudRate) -> Self {
        value as u16
    }
}

/// Backlight brightness, 0 is darkest and 5 is the brightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum BacklightBrightness {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
}

impl TryFrom<u16> for BacklightBrightness {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use BacklightBrightness as BB;
        match value {
            0 => Ok(BB::Level0),
            1 => Ok(BB::Level1),
            2 => Ok(BB::Level2),
            3 => Ok(BB::Level3),
            4 => Ok(BB::Level4),
            5 => Ok(BB::Level5),
            other => Err(other),
        }
    }
}

impl From<BacklightBrightness> for u16 {
    fn from(value: BacklightBrightness) -> Self {
        value as u16
    }
}

/// Used to be less ambiguous and whether something is on or off.
#[repr(u16)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off = 0x00,
    /// Enabled.
    On = 0x01,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

impl From<State> for u16 {
    fn from(value: State) -> Self {
        value as u16
    }
}

/// "Protection status register".
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum ProtectionStatus {
    /// 0: No protection has tripped.
    Clear = 0x00,
    /// 1: OVP overvoltage protection.
    OverVoltage = 0x01,
    /// 2: OCP overcurrent protection.
    OverCurrent = 0x02,
    /// 3: OPP, over-power protection.
    OverPower = 0x03,
    /// 4: LVP input undervoltage protection.
    InputUndervoltage = 0x04,
    /// 5: OAH maximum output capacity.
    MaximumOutputCapacity = 0x05,
    /// 6: OHP maximum output time.
    MaximumOutputTime = 0x06,
    /// 7: OTP over-temperature protection.
    OverTemperature = 0x07,
    /// 8: OEP, with no output protection.
    NoOutput = 0x08,
    /// 9: OWH maximum energy output.
    MaximumEnergyOutput = 0x09,
    /// 10: ICP maximum input current protection.
    MaximumInputCurrent = 0x0A,
    /// 11: ETP, external temperature protection.
    ExternalTemperature = 0x0B,
}

impl ProtectionStatus {
    pub const MAX_VALUE: u16 = Self::ExternalTemperature as u16;
}

impl From<u16> for ProtectionStatus {
    fn from(value: u16) -> Self {
        use ProtectionStatus as PS;
        match value {
            0x01 => PS::OverVoltage,
            0x02 => PS::OverCurrent,
            0x03 => PS::OverPower,
            0x04 => PS::InputUndervoltage,
            0x05 => PS::MaximumOutputCapacity,
            0x06 => PS::MaximumOutputTime,
            0x07 => PS::OverTemperature,
            0x08 => PS::NoOutput,
            0x09 => PS::MaximumEnergyOutput,
            0x0A => PS::MaximumInputCurrent,
            0x0B => PS::ExternalTemperature,
            // Default to no alarms active if outside of expected values.
            _ => PS::Clear,
        }
    }
}

/// A temperature in tenths of a degree, tagged with the unit the device reported it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temperature {
    Fahrenheit(u16),
    Celsius(u16),
}

impl Temperature {
    pub fn new(deci_degrees: u16, unit: TemperatureUnit) -> Self {
        match unit {
            TemperatureUnit::Celsius => Self::Celsius(deci_degrees),
            TemperatureUnit::Fahrenheit => Self::Fahrenheit(deci_degrees),
        }
    }

    /// Convert this temperature into tenths of a degree celsius.
    pub fn as_celsius(&self) -> u16 {
        match *self {
            Self::Celsius(inner) => inner,
            Self::Fahrenheit(inner) => Self::f_to_c(inner),
        }
    }

    /// Convert this temperature into tenths of a degree fahrenheit.
    pub fn as_fahrenheit(&self) -> u16 {
        match *self {
            Self::Celsius(inner) => Self::c_to_f(inner),
            Self::Fahrenheit(inner) => inner,
        }
    }

    /// Convert this temperature into a target temperature unit.
    pub fn as_unit(&self, unit: TemperatureUnit) -> u16 {
        match unit {
            TemperatureUnit::Celsius => self.as_celsius(),
            TemperatureUnit::Fahrenheit => self.as_fahrenheit(),
        }
    }

    /// Round half up of `n / d`.
    fn div_round(n: u32, d: u32) -> u32 {
        (2 * n + d) / (2 * d)
    }

    /// Convert fahrenheit to celsius. Anything below freezing saturates at zero.
    fn f_to_c(temp_f: u16) -> u16 {
        let above_freezing = (temp_f as u32).saturating_sub(320);
        Self::div_round(above_freezing * 5, 9) as u16
    }

    /// Convert celsius to fahrenheit.
    fn c_to_f(temp_c: u16) -> u16 {
        let converted = Self::div_round(temp_c as u32 * 9, 5) + 320;
        converted.min(u16::MAX as u32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn temperature_conversions() {
        let temp = Temperature::Celsius(100);
        assert_eq!(temp.as_celsius(), 100);
        assert_eq!(temp.as_fahrenheit(), 500);

        let temp = Temperature::Celsius(210);
        assert_eq!(temp.as_fahrenheit(), 698);

        let temp = Temperature::Fahrenheit(700);
        assert_eq!(temp.as_fahrenheit(), 700);
        assert_eq!(temp.as_celsius(), 211);
        assert_eq!(temp.as_unit(TemperatureUnit::Celsius), 211);

        // Below freezing can't be represented.
        assert_eq!(Temperature::Fahrenheit(100).as_celsius(), 0);
    }

    #[test]
    fn protection_status_conversions() {
        // Converting between u16 and ProtectionStatus must give the same result in both
        // directions.
        for status in ProtectionStatus::iter() {
            let converted = ProtectionStatus::from(status as u16);
            // Converted value back as u16 should be the same as we started with.
            assert_eq!(converted, status);
        }
        assert_eq!(ProtectionStatus::from(0x42), ProtectionStatus::Clear);
    }

    #[test]
    fn protection_status_max_value() {
        // We are checking ProtectionStatus::MAX_VALUE is correct.
        let mut max_value = 0;
        for status in ProtectionStatus::iter() {
            if status as u16 > max_value {
                max_value = status as u16;
            }
        }
        assert_eq!(max_value, ProtectionStatus::MAX_VALUE);
    }

    #[test]
    fn baud_rate_codes() {
        for baud in BaudRate::iter() {
            assert_eq!(BaudRate::try_from(u16::from(baud) as u8), Ok(baud));
        }
        assert_eq!(BaudRate::try_from(9), Err(9));
        assert_eq!(BaudRate::_115200.as_baud(), 115_200);
    }

    #[test]
    fn backlight_levels() {
        for level in BacklightBrightness::iter() {
            assert_eq!(BacklightBrightness::try_from(u16::from(level)), Ok(level));
        }
        assert_eq!(BacklightBrightness::try_from(6), Err(6));
    }

    #[test]
    fn live_registers_fit_one_read() {
        for register in XyRegister::iter() {
            assert!(register.index() < crate::frame::MAX_READ_REGISTERS as usize);
        }
    }
}
