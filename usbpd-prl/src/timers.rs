//! Timers that are used while waiting for hardware-acknowledged conditions.
use core::future::Future;

/// The timer trait to implement by the user application.
pub trait Timer {
    /// Expire after the specified number of milliseconds.
    fn after_millis(milliseconds: u64) -> impl Future<Output = ()>;
}

/// Types of timers that are used for timeouts.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerType {
    CRCReceive,
    HardResetComplete,
    NoResponse,
    PSHardReset,
    PSSourceOffSpr,
    PSSourceOnSpr,
    PSTransitionSpr,
    SenderResponse,
    SinkRequest,
    SinkWaitCap,
    SourceCapability,
    SwapSourceStart,
    VCONNOn,
}

impl TimerType {
    /// The timeout in milliseconds, as given by the USB PD specification.
    pub fn millis(self) -> u64 {
        match self {
            TimerType::CRCReceive => 1,
            TimerType::HardResetComplete => 5,
            TimerType::NoResponse => 5000,
            TimerType::PSHardReset => 30,
            TimerType::PSSourceOffSpr => 835,
            TimerType::PSSourceOnSpr => 435,
            TimerType::PSTransitionSpr => 500,
            TimerType::SenderResponse => 30,
            TimerType::SinkRequest => 100,
            TimerType::SinkWaitCap => 465,
            TimerType::SourceCapability => 150,
            TimerType::SwapSourceStart => 20,
            TimerType::VCONNOn => 50,
        }
    }
}
