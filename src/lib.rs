//! This crate provides an interface for communicating with and controlling the Sinilink XY6020L
//! programmable DC-DC converter over its UART port.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag. Nothing in the crate
//! allocates: request and response buffers are fixed-size and reused.
//!
//! It uses Modbus RTU under the hood. Live telemetry and settings are pulled in with one bulk
//! read into a [RegisterCache](cache::RegisterCache), and every getter reads from that snapshot.
//! Setters write one register at a time. Preset groups are read and written as whole blocks.
//!
//! The serial port used for converter comms should be configured like so:
//! * Default baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None

#![cfg_attr(all(feature = "no_std", not(test)), no_std)]

pub mod cache;
pub mod codec;
pub mod crc;
pub mod error;
pub mod frame;
pub mod link;
pub mod preset;
pub mod psu;
pub mod register;
pub mod scaling;
pub mod timing;
pub mod transaction;

#[cfg(test)]
mod mock_serial;
