//! Definition of counters, used for message IDs and retry bookkeeping.

/// Counter error variants.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The counter wrapped around its maximum allowed value and was reset.
    #[error("counter exceeded its maximum value")]
    Exceeded,
}

/// A counter structure, used for detecting overruns (e.g. retries) and for rolling message IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counter {
    value: u8,
    max_value: u8,
}

/// The type of counter that can be created.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum CounterType {
    MessageId,
    Retry,
}

impl Counter {
    /// Create a new counter of a provided type.
    pub fn new(counter_type: CounterType) -> Self {
        // See USB PD R3.2, [Table 6.70]
        let max_value = match counter_type {
            CounterType::MessageId => 7,
            CounterType::Retry => 2,
        };

        Self { value: 0, max_value }
    }

    /// Create a new counter of a provided type from an initial value.
    pub fn new_from_value(counter_type: CounterType, value: u8) -> Self {
        let mut counter = Self::new(counter_type);
        counter.set(value);
        counter
    }

    /// Set a new counter value, wrapped into the counter's range.
    pub fn set(&mut self, value: u8) {
        self.value = value % (self.max_value + 1);
    }

    /// The counter value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Increment a counter.
    ///
    /// If it wraps, this returns an error.
    pub fn increment(&mut self) -> Result<(), Error> {
        self.set(self.value.wrapping_add(1));

        if self.value == 0 {
            Err(Error::Exceeded)
        } else {
            Ok(())
        }
    }

    /// Increment a counter that is expected to roll over, such as a message ID.
    pub fn roll(&mut self) {
        // Wrapping is the normal case for message IDs.
        _ = self.increment();
    }

    /// Reset a counter value to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }
}
