//! USB PD protocol layer for PHYs that handle CRC, GoodCRC and transmit retries in hardware.
//!
//! The crate provides
//! - the transmit and receive protocol layer state machines, with message ID tracking,
//! - message dispatch entry points for the policy engine (`send`, `send_ctrl`, `wait`),
//! - a per-port context that applies attach, detach and reset events to the protocol layer.
//!
//! The PHY is accessed through the [`usbpd_prl_traits::Driver`] trait.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod counters;
pub mod port;
pub mod protocol_layer;
pub mod timers;

#[cfg(test)]
pub mod dummy;

pub use usbpd_prl_traits::{Driver, DriverRxError, DriverTxError, Status, StatusFlag};

/// The power role of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerRole {
    /// The port provides power.
    Source,
    /// The port consumes power.
    Sink,
}

impl From<bool> for PowerRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Sink,
            true => Self::Source,
        }
    }
}

impl From<PowerRole> for bool {
    fn from(role: PowerRole) -> bool {
        match role {
            PowerRole::Sink => false,
            PowerRole::Source => true,
        }
    }
}

/// The data role of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataRole {
    /// Upstream facing port.
    Ufp,
    /// Downstream facing port.
    Dfp,
}

impl From<bool> for DataRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Ufp,
            true => Self::Dfp,
        }
    }
}

impl From<DataRole> for bool {
    fn from(role: DataRole) -> bool {
        match role {
            DataRole::Ufp => false,
            DataRole::Dfp => true,
        }
    }
}
