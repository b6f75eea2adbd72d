//! The per-port context.
//!
//! Owns the protocol layer and tracks the session of an attached port partner. The interrupt service routine of
//! the PHY is expected to call [`Port::service_interrupt`], which applies plug and reset events before it runs
//! the receive state machine.
use usbpd_prl_traits::{Driver, Status, StatusFlag};

use crate::protocol_layer::message::header::Header;
use crate::protocol_layer::{Error, ProtocolLayer, RxEvent};
use crate::timers::Timer;


/// Status flags that are consumed by the port itself.
const PORT_EVENTS: Status = Status::from_flag(StatusFlag::PlugDetach)
    .with_flag(StatusFlag::PlugAttach)
    .with_flag(StatusFlag::HardReset);

/// Session state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionFlags {
    /// A port partner is attached.
    pub plug_valid: bool,
    /// The port partner signaled a hard reset.
    pub hard_reset_received: bool,
    /// The port partner sent a Soft_Reset message.
    pub soft_reset_received: bool,
}

/// A USB PD port.
#[derive(Debug)]
pub struct Port<DRIVER: Driver, TIMER: Timer> {
    protocol_layer: ProtocolLayer<DRIVER, TIMER>,
    session: SessionFlags,
}

impl<DRIVER: Driver, TIMER: Timer> Port<DRIVER, TIMER> {
    /// Create a new, detached port.
    pub fn new(driver: DRIVER, default_header: Header) -> Self {
        Self {
            protocol_layer: ProtocolLayer::new(driver, default_header),
            session: Default::default(),
        }
    }

    /// The protocol layer, for use by the policy engine.
    pub fn protocol_layer(&mut self) -> &mut ProtocolLayer<DRIVER, TIMER> {
        &mut self.protocol_layer
    }

    /// The current session flags.
    pub fn session(&self) -> SessionFlags {
        self.session
    }

    /// Acknowledge received reset events. The plug state is kept.
    pub fn clear_session_events(&mut self) {
        self.session.hard_reset_received = false;
        self.session.soft_reset_received = false;
    }

    /// Tear down the port and release the driver.
    pub fn into_driver(self) -> DRIVER {
        self.protocol_layer.into_driver()
    }

    /// Service a PHY interrupt.
    ///
    /// Refreshes the PHY status, then handles detach, attach and hard reset events, in that order. While a port
    /// partner is attached, runs one pass of the receive state machine afterwards.
    ///
    /// A received Soft_Reset resets the protocol layer. A hard reset that the driver reports while receiving
    /// resets it as well, and is returned as [`Error::HardReset`].
    pub async fn service_interrupt(&mut self) -> Result<RxEvent, Error> {
        self.protocol_layer.driver().poll_status().await;
        let events = self.protocol_layer.driver().get_status(PORT_EVENTS);

        if events.plug_detach() {
            info!("Port partner detached");
            self.session = Default::default();
            self.protocol_layer.reset();
        }

        if events.plug_attach() {
            info!("Port partner attached");
            self.session.plug_valid = true;
            self.protocol_layer.reset();
        }

        if events.hard_reset() {
            warn!("Hard reset received");
            self.session.hard_reset_received = true;
            self.protocol_layer.reset();
        }

        if !self.session.plug_valid {
            return Ok(RxEvent::NoMessage);
        }

        match self.protocol_layer.run_receive().await {
            Ok(RxEvent::SoftReset) => {
                info!("Soft reset received");
                self.session.soft_reset_received = true;
                self.protocol_layer.reset();

                Ok(RxEvent::SoftReset)
            }
            Err(Error::HardReset) => {
                warn!("Hard reset while receiving");
                self.session.hard_reset_received = true;
                self.protocol_layer.reset();

                Err(Error::HardReset)
            }
            result => result,
        }
    }
}
