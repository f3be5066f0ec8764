//! Scaling factors between raw register values and milli-units.
//!
//! The XY6020L reports voltage in 10 mV steps, current in 10 mA steps, power in 100 mW steps,
//! and charge and energy directly in mAh and mWh.

use core::num::TryFromIntError;

/// Multipliers that turn a raw register value into milli-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingFactors {
    /// Raw voltage to mV.
    pub voltage_multiplier: u32,
    /// Raw current to mA.
    pub current_multiplier: u32,
    /// Raw power to mW.
    pub power_multiplier: u32,
    /// Raw charge to mAh.
    pub capacity_multiplier: u32,
    /// Raw energy to mWh.
    pub energy_multiplier: u32,
}

impl Default for ScalingFactors {
    fn default() -> Self {
        Self::XY6020L
    }
}

impl ScalingFactors {
    pub const XY6020L: ScalingFactors = ScalingFactors::new(10, 10, 100, 1, 1);

    pub const fn new(
        voltage_multiplier: u32,
        current_multiplier: u32,
        power_multiplier: u32,
        capacity_multiplier: u32,
        energy_multiplier: u32,
    ) -> Self {
        Self {
            voltage_multiplier,
            current_multiplier,
            power_multiplier,
            capacity_multiplier,
            energy_multiplier,
        }
    }

    #[inline]
    pub const fn raw_to_voltage_mv(&self, raw: u16) -> u32 {
        (raw as u32) * self.voltage_multiplier
    }

    /// Rounds down to the nearest step. Fails if the result doesn't fit a register.
    #[inline]
    pub fn voltage_mv_to_raw(&self, voltage_mv: u32) -> Result<u16, TryFromIntError> {
        u16::try_from(voltage_mv / self.voltage_multiplier)
    }

    #[inline]
    pub const fn raw_to_current_ma(&self, raw: u16) -> u32 {
        (raw as u32) * self.current_multiplier
    }

    /// Rounds down to the nearest step. Fails if the result doesn't fit a register.
    #[inline]
    pub fn current_ma_to_raw(&self, current_ma: u32) -> Result<u16, TryFromIntError> {
        u16::try_from(current_ma / self.current_multiplier)
    }

    #[inline]
    pub const fn raw_to_power_mw(&self, raw: u16) -> u32 {
        (raw as u32) * self.power_multiplier
    }

    /// Rounds down to the nearest step. Fails if the result doesn't fit a register.
    #[inline]
    pub fn power_mw_to_raw(&self, power_mw: u32) -> Result<u16, TryFromIntError> {
        u16::try_from(power_mw / self.power_multiplier)
    }

    /// Saturates at `u32::MAX`.
    #[inline]
    pub const fn raw_to_capacity_mah(&self, raw: u32) -> u32 {
        raw.saturating_mul(self.capacity_multiplier)
    }

    /// Saturates at `u32::MAX`.
    #[inline]
    pub const fn raw_to_energy_mwh(&self, raw: u32) -> u32 {
        raw.saturating_mul(self.energy_multiplier)
    }
}
