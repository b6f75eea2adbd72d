//! USB PD protocol layer traits.
//!
//! Provides the driver trait, through which the protocol layer talks to a PD PHY, and the status word that
//! the PHY exposes for hardware-acknowledged conditions.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
use core::future::Future;

mod status;

pub use status::{Status, StatusFlag};

/// Receive Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverRxError {
    /// Received message discarded, e.g. due to CRC errors.
    Discarded,

    /// Hard Reset received before or during reception.
    HardReset,
}

/// Transmit Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverTxError {
    /// The PHY could not accept the message, e.g. a register write failed or the line was busy.
    Discarded,

    /// Hard Reset received before or during transmission.
    HardReset,
}

/// Driver trait, through which the protocol layer talks to the PHY.
///
/// The PHY is expected to handle CRC generation, GoodCRC handshaking and transmit retries in hardware.
pub trait Driver {
    /// If this is `true`, the protocol layer will not send its own
    /// GoodCRC messages and will instead rely on the hardware.
    const HAS_AUTO_GOOD_CRC: bool = true;

    /// Read the pending received message into `buffer`.
    ///
    /// Returns the number of bytes written. Zero bytes, or an all-zero header, means that no message is pending.
    fn receive(&mut self, buffer: &mut [u8]) -> impl Future<Output = Result<usize, DriverRxError>>;

    /// Hand a serialized message (header followed by data objects) to the PHY.
    fn transmit(&mut self, data: &[u8]) -> impl Future<Output = Result<(), DriverTxError>>;

    /// Transmit a hard reset signal.
    fn transmit_hard_reset(&mut self) -> impl Future<Output = Result<(), DriverTxError>>;

    /// Reset the PHY's own protocol logic.
    fn soft_reset(&mut self) -> impl Future<Output = ()>;

    /// Test and clear the status flags in `mask`.
    ///
    /// Returns the subset of `mask` that was set. Returned flags are cleared in the PHY's status word.
    fn get_status(&mut self, mask: Status) -> Status;

    /// Refresh the status word from the hardware interrupt registers.
    fn poll_status(&mut self) -> impl Future<Output = ()>;

    /// Wait until the PHY signals an interrupt.
    ///
    /// Implementations are expected to update the status word before completing, so that a following
    /// [`get_status`](Driver::get_status) sees the new flags.
    fn wait_for_interrupt(&mut self) -> impl Future<Output = ()>;
}
