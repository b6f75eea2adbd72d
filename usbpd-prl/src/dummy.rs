//! Implements a dummy driver and timers for testing.
use std::future::pending;
use std::vec::Vec;

use usbpd_prl_traits::{Driver, DriverRxError, DriverTxError, Status, StatusFlag};

use crate::protocol_layer::message::header::Header;
use crate::protocol_layer::message::{MAX_MESSAGE_SIZE, status_flag};
use crate::timers::Timer;

/// The buffer size of the dummy driver.
pub const MAX_DATA_MESSAGE_SIZE: usize = MAX_MESSAGE_SIZE;

/// A dummy timer for testing.
pub struct DummyTimer {}

impl Timer for DummyTimer {
    async fn after_millis(_milliseconds: u64) {
        // Never time out
        pending().await
    }
}

/// A timer that expires immediately.
pub struct InstantTimer {}

impl Timer for InstantTimer {
    async fn after_millis(_milliseconds: u64) {}
}

/// A dummy driver for testing.
///
/// Acts like a PHY with automatic GoodCRC handling. Injected frames raise the status flags that a PHY would raise
/// for them.
pub struct DummyDriver<const N: usize> {
    rx_vec: Vec<heapless::Vec<u8, N>>,
    tx_vec: Vec<heapless::Vec<u8, N>>,
    interrupts: Vec<Status>,
    status: Status,
    fail_transmit: bool,
    signal_hard_reset: bool,
    hard_resets: usize,
    soft_resets: usize,
    status_polls: usize,
}

impl<const N: usize> DummyDriver<N> {
    /// Create a new dummy driver.
    pub fn new() -> Self {
        Self {
            rx_vec: Vec::new(),
            tx_vec: Vec::new(),
            interrupts: Vec::new(),
            status: Status::EMPTY,
            fail_transmit: false,
            signal_hard_reset: false,
            hard_resets: 0,
            soft_resets: 0,
            status_polls: 0,
        }
    }

    /// Inject received data that can be retrieved later.
    pub fn inject_received_data(&mut self, data: &[u8]) {
        let mut vec = heapless::Vec::new();
        vec.extend_from_slice(data).unwrap();

        match Header::from_bytes(data) {
            Ok(header) if !header.is_empty() => {
                self.raise_status(Status::from_flag(StatusFlag::Pass));
                if let Some(flag) = status_flag(header.message_type()) {
                    self.raise_status(flag.into());
                }
            }
            _ => (),
        }

        self.rx_vec.push(vec);
    }

    /// Probe data that was transmitted by the stack.
    pub fn probe_transmitted_data(&mut self) -> heapless::Vec<u8, N> {
        self.tx_vec.remove(0)
    }

    /// The number of transmitted frames that were not probed yet.
    pub fn transmitted_count(&self) -> usize {
        self.tx_vec.len()
    }

    /// Make every following transmission fail (or succeed again).
    pub fn set_fail_transmit(&mut self, fail: bool) {
        self.fail_transmit = fail;
    }

    /// Make the next reception report a hard reset.
    pub fn signal_hard_reset(&mut self) {
        self.signal_hard_reset = true;
    }

    /// Raise status flags, as if the hardware had reported them.
    pub fn raise_status(&mut self, status: Status) {
        self.status = self.status.union(status);
    }

    /// The current status word, without clearing it.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Queue an interrupt that raises `status` once the stack waits for it.
    pub fn inject_interrupt(&mut self, status: Status) {
        self.interrupts.push(status);
    }

    /// The number of hard resets that were transmitted.
    pub fn hard_resets(&self) -> usize {
        self.hard_resets
    }

    /// The number of PHY soft resets that were requested.
    pub fn soft_resets(&self) -> usize {
        self.soft_resets
    }

    /// The number of times the status word was polled.
    pub fn status_polls(&self) -> usize {
        self.status_polls
    }
}

impl<const N: usize> Driver for DummyDriver<N> {
    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, DriverRxError> {
        if self.signal_hard_reset {
            self.signal_hard_reset = false;
            return Err(DriverRxError::HardReset);
        }

        if self.rx_vec.is_empty() {
            return Ok(0);
        }

        let first = self.rx_vec.remove(0);
        let len = first.len();
        buffer[..len].copy_from_slice(&first);

        Ok(len)
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<(), DriverTxError> {
        if self.fail_transmit {
            return Err(DriverTxError::Discarded);
        }

        let mut vec = heapless::Vec::new();
        vec.extend_from_slice(data).unwrap();
        self.tx_vec.push(vec);

        Ok(())
    }

    async fn transmit_hard_reset(&mut self) -> Result<(), DriverTxError> {
        self.hard_resets += 1;
        self.status = Status::EMPTY;
        Ok(())
    }

    async fn soft_reset(&mut self) {
        self.soft_resets += 1;
    }

    fn get_status(&mut self, mask: Status) -> Status {
        let status = self.status.intersection(mask);
        self.status = self.status.difference(status);
        status
    }

    async fn poll_status(&mut self) {
        self.status_polls += 1;
    }

    async fn wait_for_interrupt(&mut self) {
        if self.interrupts.is_empty() {
            pending().await
        } else {
            let status = self.interrupts.remove(0);
            self.raise_status(status);
        }
    }
}

/// A dummy driver for a PHY that leaves GoodCRC messages to the protocol layer.
pub struct ManualGoodCrcDriver<const N: usize>(pub DummyDriver<N>);

impl<const N: usize> Driver for ManualGoodCrcDriver<N> {
    const HAS_AUTO_GOOD_CRC: bool = false;

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, DriverRxError> {
        self.0.receive(buffer).await
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<(), DriverTxError> {
        self.0.transmit(data).await
    }

    async fn transmit_hard_reset(&mut self) -> Result<(), DriverTxError> {
        self.0.transmit_hard_reset().await
    }

    async fn soft_reset(&mut self) {
        self.0.soft_reset().await
    }

    fn get_status(&mut self, mask: Status) -> Status {
        self.0.get_status(mask)
    }

    async fn poll_status(&mut self) {
        self.0.poll_status().await
    }

    async fn wait_for_interrupt(&mut self) {
        self.0.wait_for_interrupt().await
    }
}

#[cfg(test)]
mod tests {
    use usbpd_prl_traits::{Driver, Status, StatusFlag};

    use crate::dummy::{DummyDriver, MAX_DATA_MESSAGE_SIZE};

    #[tokio::test]
    async fn test_receive() {
        let mut driver: DummyDriver<MAX_DATA_MESSAGE_SIZE> = DummyDriver::new();

        let mut injected_data = [0u8; 6];
        injected_data[0] = 123;

        driver.inject_received_data(&injected_data);

        injected_data[1] = 255;
        driver.inject_received_data(&injected_data);

        let mut buf = [0u8; MAX_DATA_MESSAGE_SIZE];
        assert_eq!(driver.receive(&mut buf).await, Ok(6));

        assert_eq!(buf[0], 123);
        assert_eq!(buf[1], 0);

        let mut buf = [0u8; MAX_DATA_MESSAGE_SIZE];
        driver.receive(&mut buf).await.unwrap();

        assert_eq!(buf[0], 123);
        assert_eq!(buf[1], 255);

        // Nothing left.
        assert_eq!(driver.receive(&mut buf).await, Ok(0));
    }

    #[test]
    fn test_status_is_cleared_on_read() {
        let mut driver: DummyDriver<MAX_DATA_MESSAGE_SIZE> = DummyDriver::new();
        driver.raise_status(Status::from_flag(StatusFlag::Accept).with_flag(StatusFlag::PlugAttach));

        let accept = Status::from_flag(StatusFlag::Accept);
        assert_eq!(driver.get_status(accept), accept);
        assert!(driver.get_status(accept).is_empty());
        assert_eq!(driver.status(), Status::from_flag(StatusFlag::PlugAttach));
    }
}
