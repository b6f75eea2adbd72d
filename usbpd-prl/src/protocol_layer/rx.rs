//! The receive state machine of the protocol layer.
//!
//! See USB PD R3.2, [6.12.2.3]
use usbpd_prl_traits::{DriverRxError, DriverTxError};

use super::message::header::{ControlMessageType, Header, MessageType};
use super::message::{MAX_MESSAGE_SIZE, Message};
use super::{Error, ProtocolLayer};
use crate::Driver;
use crate::counters::{Counter, CounterType};
use crate::timers::Timer;

/// Receive states.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    LayerResetForReceive,
    #[default]
    WaitForPhyMessage,
    SendGoodCrc,
    StoreMessageId,
    CheckMessageId,
}

/// Outcome of a receive dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// The PHY had no message.
    NoMessage,
    /// The port partner sent a Soft_Reset. Resetting the layer is up to the caller.
    SoftReset,
    /// A message was stored, and can be taken with [`ProtocolLayer::take_received`].
    Received(MessageType),
}

impl<DRIVER: Driver, TIMER: Timer> ProtocolLayer<DRIVER, TIMER> {
    /// Run one pass of the receive state machine.
    ///
    /// A pass handles at most one message. Afterwards, the state machine is always back in `WaitForPhyMessage`.
    pub async fn run_receive(&mut self) -> Result<RxEvent, Error> {
        let mut event = RxEvent::NoMessage;
        let mut next_state = self.rx.state;

        let result = loop {
            let state = next_state;

            next_state = match self.update_rx_state(state, &mut event).await {
                Ok(next_state) => next_state,
                Err(error) => break Err(error),
            };

            if next_state == state || next_state == RxState::WaitForPhyMessage {
                break Ok(event);
            }

            trace!("RX {:?} -> {:?}", state, next_state);
        };

        self.rx.state = RxState::WaitForPhyMessage;
        self.rx.incoming = Default::default();

        result
    }

    async fn update_rx_state(&mut self, state: RxState, event: &mut RxEvent) -> Result<RxState, Error> {
        let next_state = match state {
            RxState::LayerResetForReceive => {
                *event = RxEvent::SoftReset;

                RxState::LayerResetForReceive
            }
            RxState::WaitForPhyMessage => {
                let Some(message) = self.receive_from_phy().await? else {
                    return Ok(RxState::WaitForPhyMessage);
                };

                // Update specification revision, based on the received frame.
                if let Ok(spec_revision) = message.header.spec_revision() {
                    self.spec_revision = spec_revision;
                }

                let is_soft_reset = message.header.is_soft_reset();
                self.rx.incoming = message;

                if is_soft_reset {
                    RxState::LayerResetForReceive
                } else {
                    RxState::SendGoodCrc
                }
            }
            RxState::SendGoodCrc => {
                if !DRIVER::HAS_AUTO_GOOD_CRC {
                    self.transmit_good_crc().await?;
                }

                RxState::CheckMessageId
            }
            RxState::CheckMessageId => {
                // Duplicate detection is bypassed. A repeated ID is stored like any other.
                let message_id = self.rx.incoming.header.message_id();
                if self.rx_message_id() == Some(message_id) {
                    trace!("Received repeated message ID {}", message_id);
                }

                RxState::StoreMessageId
            }
            RxState::StoreMessageId => {
                let message = core::mem::take(&mut self.rx.incoming);

                self.counters.rx_message = Some(Counter::new_from_value(
                    CounterType::MessageId,
                    message.header.message_id(),
                ));

                *event = RxEvent::Received(message.header.message_type());
                self.rx.received = Some(message);

                RxState::WaitForPhyMessage
            }
        };

        Ok(next_state)
    }

    /// Read a message from the PHY, if there is one.
    async fn receive_from_phy(&mut self) -> Result<Option<Message>, Error> {
        let mut buffer = [0u8; MAX_MESSAGE_SIZE];

        let length = match self.driver.receive(&mut buffer).await {
            Ok(length) => length,
            Err(DriverRxError::Discarded) => return Ok(None),
            Err(DriverRxError::HardReset) => return Err(Error::HardReset),
        };

        if length == 0 {
            return Ok(None);
        }

        match Message::from_bytes(&buffer[..length]) {
            Ok(message) if message.header.is_empty() => Ok(None),
            Ok(message) => {
                trace!("Received message {:?}", message);
                Ok(Some(message))
            }
            Err(error) => {
                warn!("Dropped received frame: {:?}", error);
                Ok(None)
            }
        }
    }

    /// Acknowledge the incoming message, for PHYs that do not do so by themselves.
    async fn transmit_good_crc(&mut self) -> Result<(), Error> {
        let incoming = self.rx.incoming.header;

        if matches!(
            incoming.message_type(),
            MessageType::Control(ControlMessageType::GoodCRC)
        ) {
            return Ok(());
        }

        let header = Header::new_control(
            self.default_header.with_spec_revision(self.spec_revision),
            Counter::new_from_value(CounterType::MessageId, incoming.message_id()),
            ControlMessageType::GoodCRC,
        );

        let mut buffer = [0u8; MAX_MESSAGE_SIZE];
        let size = Message::new(header).to_bytes(&mut buffer);

        match self.driver.transmit(&buffer[..size]).await {
            Ok(()) => Ok(()),
            Err(DriverTxError::HardReset) => Err(Error::HardReset),
            Err(DriverTxError::Discarded) => {
                warn!("GoodCrc for message ID {} was not sent", incoming.message_id());
                Ok(())
            }
        }
    }
}
