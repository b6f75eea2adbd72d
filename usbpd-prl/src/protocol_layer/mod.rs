//! The protocol layer is controlled by the policy engine, and commands the PHY layer.
//!
//! Handles
//! - construction of messages,
//! - message ID tracking,
//! - reset operation,
//! - error handling,
//! - state behaviour.
//!
//! CRC checking, GoodCRC handshaking and transmit retries are performed by the PHY hardware. The transmit and
//! receive state machines therefore pass through the corresponding states without waiting. Each dispatch pass runs
//! its state chain until the state no longer changes.

pub mod message;
mod rx;
mod tx;


use core::marker::PhantomData;

use embassy_futures::select::{Either, select};
use message::Message;
use message::header::{ControlMessageType, Header, SpecificationRevision};
pub use rx::{RxEvent, RxState};
pub use tx::{TxState, TxStatus};
use usbpd_prl_traits::{Driver, DriverTxError, Status};

use crate::counters::{Counter, CounterType};
use crate::timers::{Timer, TimerType};
use crate::{DataRole, PowerRole};

/// Errors that can occur in the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The PHY did not accept the message. It stays pending, and the transmission can be re-invoked.
    #[error("the PHY did not accept the message")]
    PhyTransmit,
    /// The message is considered lost. Its message ID was consumed.
    #[error("transmission error")]
    TransmissionError,
    /// The pending message was discarded.
    #[error("message discarded")]
    Discarded,
    /// Driver reported a hard reset.
    #[error("hard reset")]
    HardReset,
    /// A message can carry at most seven data objects.
    #[error("too many data objects ({0})")]
    TooManyObjects(usize),
    /// The all-zero header is not a message.
    #[error("empty message header")]
    EmptyMessage,
}

#[derive(Debug)]
struct Counters {
    tx_message: Counter,
    rx_message: Option<Counter>,
    retry: Counter,
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            tx_message: Counter::new(CounterType::MessageId),
            rx_message: None,
            retry: Counter::new(CounterType::Retry),
        }
    }
}

/// Transmit direction of the protocol layer.
#[derive(Debug, Default)]
struct Transmitter {
    state: TxState,
    status: TxStatus,
    /// The message that waits for transmission. An empty header means that nothing is pending.
    pending: Message,
}

/// Receive direction of the protocol layer.
#[derive(Debug, Default)]
struct Receiver {
    state: RxState,
    /// The message that is currently moving through the receive state machine.
    incoming: Message,
    /// The last stored message, visible to the policy engine.
    received: Option<Message>,
}

/// The USB PD protocol layer of one port.
#[derive(Debug)]
pub struct ProtocolLayer<DRIVER: Driver, TIMER: Timer> {
    driver: DRIVER,
    counters: Counters,
    tx: Transmitter,
    rx: Receiver,
    default_header: Header,
    spec_revision: SpecificationRevision,
    _timer: PhantomData<TIMER>,
}

impl<DRIVER: Driver, TIMER: Timer> ProtocolLayer<DRIVER, TIMER> {
    /// Create a new protocol layer from a driver and default header.
    ///
    /// The default header carries the port's roles and the initial specification revision.
    pub fn new(driver: DRIVER, default_header: Header) -> Self {
        let spec_revision = default_header.spec_revision().unwrap_or(SpecificationRevision::R3_X);

        Self {
            driver,
            counters: Default::default(),
            tx: Default::default(),
            rx: Default::default(),
            default_header,
            spec_revision,
            _timer: PhantomData,
        }
    }

    /// Reset the protocol layer.
    ///
    /// Clears all counters, the pending and received messages, and returns both state machines to their initial
    /// states. Used on attach, detach, and after hard or soft resets.
    pub fn reset(&mut self) {
        trace!("Protocol layer reset");
        self.counters = Default::default();
        self.tx = Default::default();
        self.rx = Default::default();
    }

    /// Release the driver, e.g. when the port is torn down.
    pub fn into_driver(self) -> DRIVER {
        self.driver
    }

    /// Access the driver.
    pub fn driver(&mut self) -> &mut DRIVER {
        &mut self.driver
    }

    /// The default header template of this port.
    pub fn header(&self) -> &Header {
        &self.default_header
    }

    /// The specification revision that outgoing messages carry.
    pub fn spec_revision(&self) -> SpecificationRevision {
        self.spec_revision
    }

    /// The message ID that the next transmitted message will carry.
    pub fn message_id(&self) -> u8 {
        self.counters.tx_message.value()
    }

    /// The message ID of the last stored received message, if any was received since the last reset.
    pub fn rx_message_id(&self) -> Option<u8> {
        self.counters.rx_message.map(|counter| counter.value())
    }

    /// The state of the transmit state machine.
    pub fn tx_state(&self) -> TxState {
        self.tx.state
    }

    /// The state of the receive state machine.
    pub fn rx_state(&self) -> RxState {
        self.rx.state
    }

    /// The outcome of the last transmit dispatch pass.
    pub fn tx_status(&self) -> TxStatus {
        self.tx.status
    }

    /// Take the last received message, leaving the receive buffer empty.
    pub fn take_received(&mut self) -> Option<Message> {
        self.rx.received.take()
    }

    /// Send a message with the given header and data objects.
    ///
    /// The header's object count and specification revision are filled in, and the message ID is stamped by the
    /// transmit state machine. A new submission replaces a message that is still pending after a PHY failure. A
    /// pending Ping is discarded on replacement, which consumes its message ID.
    ///
    /// Returns `Ok(())` if the message reached the `MessageSent` status. Nothing is resent automatically.
    pub async fn send(&mut self, header: Header, objects: &[u32]) -> Result<(), Error> {
        if header.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let header = header.with_spec_revision(self.spec_revision);

        let Some(message) = Message::new_with_objects(header, objects) else {
            error!("Cannot send {} data objects", objects.len());
            return Err(Error::TooManyObjects(objects.len()));
        };

        self.discard_pending_ping().await?;

        trace!("Send message {:?}", message);
        self.tx.pending = message;
        self.tx.status = TxStatus::None;
        self.tx.state = TxState::WaitForMessageRequest;
        self.counters.retry.reset();

        match self.run_transmit().await? {
            TxStatus::MessageSent => Ok(()),
            TxStatus::TransmissionError => Err(Error::TransmissionError),
            TxStatus::Discarded => Err(Error::Discarded),
            TxStatus::None => Err(Error::PhyTransmit),
        }
    }

    /// Send a control message, which carries no data objects.
    pub async fn send_ctrl(
        &mut self,
        header: Header,
        message_type: ControlMessageType,
        data_role: DataRole,
        power_role: PowerRole,
    ) -> Result<(), Error> {
        let header = header
            .with_message_type_raw(message_type as u8)
            .with_port_data_role(data_role)
            .with_port_power_role(power_role)
            .with_num_objects(0)
            .with_extended(false);

        self.send(header, &[]).await
    }

    /// Wait until one of the status flags in `mask` is set, or a timeout occurs.
    ///
    /// Flags that are already set are returned immediately. Otherwise, this waits for the PHY's interrupt
    /// completion and returns the flags of `mask` that it set, which may be none. Returns the empty status on
    /// timeout. Returned flags are cleared.
    pub async fn wait(&mut self, mask: Status, timeout_ms: u64) -> Status {
        let status = self.driver.get_status(mask);
        if !status.is_empty() {
            return status;
        }

        match select(self.driver.wait_for_interrupt(), TIMER::after_millis(timeout_ms)).await {
            Either::First(()) => self.driver.get_status(mask),
            Either::Second(()) => {
                trace!("Wait for {:?} timed out after {} ms", mask, timeout_ms);
                Status::EMPTY
            }
        }
    }

    /// Wait for status flags with the timeout of a given timer type.
    pub async fn wait_for(&mut self, mask: Status, timer_type: TimerType) -> Status {
        self.wait(mask, timer_type.millis()).await
    }

    /// Perform a hard-reset procedure.
    ///
    /// See USB PD R3.2, [6.7.1.1].
    pub async fn hard_reset(&mut self) {
        info!("Transmit hard reset");
        self.reset();

        loop {
            match self.driver.transmit_hard_reset().await {
                Ok(_) | Err(DriverTxError::HardReset) => break,
                Err(DriverTxError::Discarded) => (),
            }
        }
    }

    /// Perform a soft reset of the protocol layer and the PHY.
    pub async fn soft_reset(&mut self) {
        info!("Soft reset");
        self.reset();
        self.driver.soft_reset().await;
    }
}
