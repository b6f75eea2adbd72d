//! The transmit state machine of the protocol layer.
//!
//! See USB PD R3.2, [6.12.2.2]
use usbpd_prl_traits::DriverTxError;

use super::message::MAX_MESSAGE_SIZE;
use super::message::header::{ControlMessageType, MessageType};
use super::{Error, ProtocolLayer};
use crate::Driver;
use crate::timers::Timer;

/// Transmit states.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    PhyLayerReset,
    #[default]
    WaitForMessageRequest,
    LayerResetForTransmit,
    ConstructMessage,
    WaitForPhyResponse,
    MatchMessageId,
    MessageSent,
    CheckRetryCounter,
    TransmissionError,
    DiscardMessage,
}

/// Outcome of a transmit dispatch pass, as read by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStatus {
    /// No outcome yet. The message may still be pending.
    #[default]
    None,
    /// The message was handed to the PHY.
    MessageSent,
    /// The message is considered lost.
    TransmissionError,
    /// The pending message was dropped.
    Discarded,
}

impl<DRIVER: Driver, TIMER: Timer> ProtocolLayer<DRIVER, TIMER> {
    /// Run the transmit state machine until its state no longer changes.
    ///
    /// A message that the PHY did not accept stays pending in `ConstructMessage`. Calling this again re-attempts
    /// the hand-off.
    pub async fn run_transmit(&mut self) -> Result<TxStatus, Error> {
        let mut next_state = self.tx.state;

        loop {
            let state = next_state;

            next_state = match self.update_tx_state(state).await {
                Ok(next_state) => next_state,
                Err(error) => {
                    self.tx.state = state;
                    return Err(error);
                }
            };

            if next_state == state {
                break;
            }

            trace!("TX {:?} -> {:?}", state, next_state);
        }

        self.tx.state = next_state;
        Ok(self.tx.status)
    }

    /// Give up on the pending transmission after the PHY reported that it failed.
    ///
    /// Retries are performed by the hardware, so the retry counter check always concludes in a transmission error.
    /// Without a pending message, nothing happens.
    pub async fn report_transmission_failure(&mut self) -> Result<TxStatus, Error> {
        if self.tx.pending.header.is_empty() {
            return Ok(self.tx.status);
        }

        self.tx.state = TxState::CheckRetryCounter;
        self.run_transmit().await
    }

    /// Drop a Ping that the PHY did not accept yet.
    ///
    /// The Ping's message ID is consumed, the status becomes `Discarded` and the PHY is reset. Other pending
    /// messages are kept, and the status is returned unchanged.
    pub async fn discard_pending_ping(&mut self) -> Result<TxStatus, Error> {
        let pending_ping = self.tx.state == TxState::ConstructMessage
            && self.tx.pending.header.message_type() == MessageType::Control(ControlMessageType::Ping);

        if !pending_ping {
            return Ok(self.tx.status);
        }

        debug!("Discard pending Ping with ID {}", self.counters.tx_message.value());
        self.tx.state = TxState::DiscardMessage;
        self.run_transmit().await
    }

    async fn update_tx_state(&mut self, state: TxState) -> Result<TxState, Error> {
        let next_state = match state {
            TxState::PhyLayerReset => {
                self.tx.pending = Default::default();
                self.driver.soft_reset().await;

                TxState::WaitForMessageRequest
            }
            TxState::WaitForMessageRequest => {
                let header = self.tx.pending.header;

                if header.is_empty() {
                    TxState::WaitForMessageRequest
                } else if header.is_soft_reset() {
                    TxState::LayerResetForTransmit
                } else {
                    TxState::ConstructMessage
                }
            }
            TxState::LayerResetForTransmit => {
                // See USB PD R3.2, [6.7.1.1]
                self.counters.tx_message.reset();
                self.rx.state = Default::default();

                TxState::ConstructMessage
            }
            TxState::ConstructMessage => {
                self.tx.pending.header = self
                    .tx
                    .pending
                    .header
                    .with_message_id(self.counters.tx_message.value());

                let mut buffer = [0u8; MAX_MESSAGE_SIZE];
                let size = self.tx.pending.to_bytes(&mut buffer);

                match self.driver.transmit(&buffer[..size]).await {
                    Ok(()) => TxState::WaitForPhyResponse,
                    Err(DriverTxError::HardReset) => return Err(Error::HardReset),
                    Err(DriverTxError::Discarded) => {
                        warn!(
                            "PHY did not accept message with ID {}",
                            self.counters.tx_message.value()
                        );

                        TxState::ConstructMessage
                    }
                }
            }
            // The PHY has already performed the GoodCRC handshake.
            TxState::WaitForPhyResponse => TxState::MessageSent,
            TxState::MatchMessageId => TxState::MessageSent,
            TxState::MessageSent => {
                self.counters.tx_message.roll();
                self.tx.pending = Default::default();
                self.tx.status = TxStatus::MessageSent;

                TxState::WaitForMessageRequest
            }
            TxState::CheckRetryCounter => {
                trace!("Retries are owned by the PHY (retry counter {})", self.counters.retry.value());

                TxState::TransmissionError
            }
            TxState::TransmissionError => {
                warn!("Transmission error for message ID {}", self.counters.tx_message.value());
                self.counters.tx_message.roll();
                self.tx.pending = Default::default();
                self.tx.status = TxStatus::TransmissionError;

                TxState::WaitForMessageRequest
            }
            TxState::DiscardMessage => {
                self.tx.pending = Default::default();
                self.counters.tx_message.roll();
                self.tx.status = TxStatus::Discarded;

                TxState::PhyLayerReset
            }
        };

        Ok(next_state)
    }
}
