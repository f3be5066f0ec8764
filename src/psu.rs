use log::debug;

use crate::{
    cache::RegisterCache,
    error::{Error, InvalidArgument, Result},
    link::SerialLink,
    preset::{
        PRESET_BLOCK_LEN, PRESET_REGISTERS, PresetGroup, ProtectionConfig, XyPreset,
        XyPresetBuilder, XyPresetOffsets,
    },
    register::{BacklightBrightness, BaudRate, State, TemperatureUnit, XyRegister},
    scaling::ScalingFactors,
    timing::TransactionTiming,
    transaction::Transactor,
};

/// Highest slave address a single Modbus device may use.
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// You can create a Xy6020l using any link which implements [SerialLink].
///
/// We use the nomenclature that "get" reads from the last snapshot taken by [Self::refresh], and
/// never touches the link. Where as "set" writes straight to the device and leaves the snapshot
/// alone until the next refresh.
///
/// __Note:__ when a setter fails, it is unknown whether the device applied the write. The request
/// may have been acted on even though the acknowledgement was lost. Refresh and check if it
/// matters.
pub struct Xy6020l<S: SerialLink> {
    transactor: Transactor<S>,
    cache: RegisterCache,
}

impl<S: SerialLink> Xy6020l<S> {
    /// Create a new Xy6020l with the default timing.
    pub fn new(link: S, unit_id: u8) -> Self {
        Self::with_timing(link, unit_id, TransactionTiming::default())
    }

    pub fn with_timing(link: S, unit_id: u8, timing: TransactionTiming) -> Self {
        Self {
            transactor: Transactor::new(link, unit_id, timing),
            cache: RegisterCache::new(),
        }
    }

    /// Create a Xy6020l without a link. Anything that needs the device fails with
    /// [Error::TransportUnavailable] until one is [bound](Self::bind).
    pub fn unbound(unit_id: u8) -> Self {
        Self {
            transactor: Transactor::unbound(unit_id, TransactionTiming::default()),
            cache: RegisterCache::new(),
        }
    }

    /// Attach a link, returning the one previously bound.
    pub fn bind(&mut self, link: S) -> Option<S> {
        self.transactor.bind(link)
    }

    /// Detach and return the link.
    pub fn release(&mut self) -> Option<S> {
        self.transactor.release()
    }

    pub fn link(&self) -> Option<&S> {
        self.transactor.link()
    }

    pub fn link_mut(&mut self) -> Option<&mut S> {
        self.transactor.link_mut()
    }

    pub fn unit_id(&self) -> u8 {
        self.transactor.unit_id()
    }

    /// Talk to a different unit id from now on. This does not write anything to the device, see
    /// [Self::set_address] for that.
    pub fn set_unit_id(&mut self, unit_id: u8) {
        self.transactor.set_unit_id(unit_id);
    }

    pub fn timing(&self) -> TransactionTiming {
        self.transactor.timing()
    }

    pub fn set_timing(&mut self, timing: TransactionTiming) {
        self.transactor.set_timing(timing);
    }

    /// Fetch every live register in one transaction.
    ///
    /// Only a complete, valid reply replaces the snapshot. On failure all getters keep returning
    /// the values of the last successful refresh.
    pub fn refresh(&mut self) -> Result<(), S::Error> {
        self.cache.refresh(&mut self.transactor)
    }

    /// The snapshot taken by the last successful [refresh](Self::refresh).
    pub fn registers(&self) -> &RegisterCache {
        &self.cache
    }

    /// Write to a single register of the device.
    pub fn write_register(
        &mut self,
        register: XyRegister,
        value: impl Into<u16>,
    ) -> Result<(), S::Error> {
        self.transactor.write_holding(register.into(), value.into())
    }

    /// Set the output voltage, centi-volts.
    pub fn set_volt(&mut self, centi_volts: u16) -> Result<(), S::Error> {
        self.write_register(XyRegister::VSet, centi_volts)
    }

    /// Set the output current limit, centi-amps.
    pub fn set_current(&mut self, centi_amps: u16) -> Result<(), S::Error> {
        self.write_register(XyRegister::ISet, centi_amps)
    }

    /// Set the output voltage. Value supplied in millivolts, rounded down to what the device can
    /// represent.
    pub fn set_output_voltage_mv(&mut self, voltage_mv: u32) -> Result<(), S::Error> {
        let raw = ScalingFactors::XY6020L.voltage_mv_to_raw(voltage_mv)?;
        self.set_volt(raw)
    }

    /// Set the output current limit. Value supplied in milliamps, rounded down to what the device
    /// can represent.
    pub fn set_current_limit_ma(&mut self, current_ma: u32) -> Result<(), S::Error> {
        let raw = ScalingFactors::XY6020L.current_ma_to_raw(current_ma)?;
        self.set_current(raw)
    }

    /// Enable/disable the key lock.
    pub fn set_lock_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        let state: State = state.into();
        self.write_register(XyRegister::Lock, state)
    }

    /// Write the protect register. Only [State::Off] is meaningful, it clears a tripped
    /// protection.
    pub fn set_protect_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        let state: State = state.into();
        self.write_register(XyRegister::Protect, state)
    }

    /// Clear any active protection.
    pub fn clear_protections(&mut self) -> Result<(), S::Error> {
        self.set_protect_state(State::Off)
    }

    /// Enable/disable the output.
    pub fn set_switch_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        let state: State = state.into();
        self.write_register(XyRegister::OnOff, state)
    }

    /// Set the temperature unit used for readings and the over-temperature protection.
    pub fn set_temp_symbol(&mut self, unit: TemperatureUnit) -> Result<(), S::Error> {
        self.write_register(XyRegister::FC, unit)
    }

    pub fn set_backlight(&mut self, level: BacklightBrightness) -> Result<(), S::Error> {
        self.write_register(XyRegister::BLed, level)
    }

    /// Minutes until the screen turns off.
    pub fn set_sleep_time(&mut self, minutes: u16) -> Result<(), S::Error> {
        self.write_register(XyRegister::Sleep, minutes)
    }

    /// Store a new slave address on the device.
    ///
    /// Appears to only be applied after a power cycle, so we keep addressing the old unit id
    /// until [Self::set_unit_id] is called.
    pub fn set_address(&mut self, address: u8) -> Result<(), S::Error> {
        if !(1..=MAX_SLAVE_ADDRESS).contains(&address) {
            return Err(InvalidArgument::SlaveAddress(address).into());
        }
        self.write_register(XyRegister::SlaveAdd, address as u16)
    }

    /// Store a new baud rate on the device.
    ///
    /// Appears to only be applied after a power cycle.
    pub fn set_baudrate(&mut self, baud_rate: BaudRate) -> Result<(), S::Error> {
        self.write_register(XyRegister::BaudRateL, baud_rate)
    }

    pub fn set_internal_temp_offset(&mut self, offset: u16) -> Result<(), S::Error> {
        self.write_register(XyRegister::TInOffset, offset)
    }

    pub fn set_external_temp_offset(&mut self, offset: u16) -> Result<(), S::Error> {
        self.write_register(XyRegister::TExOffset, offset)
    }

    /// Load a stored preset group into the active settings.
    pub fn switch_preset(&mut self, group: impl Into<PresetGroup>) -> Result<(), S::Error> {
        let group: PresetGroup = group.into();
        self.write_register(XyRegister::ExtractM, group)
    }

    /// Read a stored preset group back from the device.
    pub fn fetch_preset(&mut self, group: impl Into<PresetGroup>) -> Result<XyPreset, S::Error> {
        let group = group.into();
        let start = XyPresetOffsets::VSet.address_in_group(group);
        let data = self.transactor.read_holdings(start, PRESET_REGISTERS)?;

        let mut block = [0u8; PRESET_BLOCK_LEN];
        block.copy_from_slice(data);
        debug!("Fetched preset {:?}", group);
        Ok(XyPreset::decode(group, &block))
    }

    /// Store a preset into its group in one transaction.
    pub fn set_preset(&mut self, preset: &XyPreset) -> Result<(), S::Error> {
        self.transactor
            .write_holdings(preset.start_address(), &preset.encode())?;
        debug!("Stored preset {:?}", preset.group);
        Ok(())
    }

    /// Set protection levels of the power supply.
    ///
    /// __Note:__ This works by refreshing, then overwriting the loaded preset group with the
    /// current setpoints and output state plus `protections`. This could cause unintended
    /// modifications to preset groups if not careful.
    pub fn set_protections(&mut self, protections: ProtectionConfig) -> Result<(), S::Error> {
        self.refresh()?;
        let registers = &self.cache;
        let group = PresetGroup::try_from(registers.low_byte(XyRegister::ExtractM))?;

        let preset = XyPresetBuilder::new(
            group,
            registers.get_set_volt(),
            registers.get_set_current(),
        )
        .with_protections(protections)
        .with_output(registers.get_switch_state())
        .build()
        .map_err(|_| Error::InvalidArgument(InvalidArgument::PresetSlot(group.into())))?;

        self.set_preset(&preset)
    }
}
