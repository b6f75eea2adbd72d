//! The PHY status word.
use proc_bitfield::bitfield;

/// Individual conditions that the PHY reports through its status word.
///
/// The discriminant is the bit position within [`Status`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusFlag {
    PlugAttach = 0,
    PlugDetach = 1,
    GoodCrc = 2,
    Accept = 3,
    PsRdy = 4,
    Reject = 5,
    Wait = 6,
    Error = 7,
    Ping = 8,
    GetSinkCap = 9,
    GetSourceCap = 10,
    SourceCap = 11,
    SinkCap = 12,
    Request = 13,
    PrSwap = 14,
    DrSwap = 15,
    VconnSwap = 16,
    SoftReset = 17,
    HardReset = 18,
    NotSupported = 19,
    VendorDefined = 20,
    Reserved = 21,
    Pass = 22,
}

bitfield! {
    /// A set of [`StatusFlag`]s.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status(pub u64): Debug, FromStorage, IntoStorage {
        /// A cable was attached.
        pub plug_attach: bool @ 0,
        /// The cable was detached.
        pub plug_detach: bool @ 1,
        /// The hardware received a GoodCRC for the last transmitted message.
        pub good_crc: bool @ 2,
        /// An Accept message was received.
        pub accept: bool @ 3,
        /// A PS_RDY message was received.
        pub ps_rdy: bool @ 4,
        /// A Reject message was received.
        pub reject: bool @ 5,
        /// A Wait message was received.
        pub wait: bool @ 6,
        /// The hardware gave up on a transmission.
        pub error: bool @ 7,
        /// A Ping message was received.
        pub ping: bool @ 8,
        /// A Get_Sink_Cap message was received.
        pub get_sink_cap: bool @ 9,
        /// A Get_Source_Cap message was received.
        pub get_source_cap: bool @ 10,
        /// A Source_Capabilities message was received.
        pub source_cap: bool @ 11,
        /// A Sink_Capabilities message was received.
        pub sink_cap: bool @ 12,
        /// A Request message was received.
        pub request: bool @ 13,
        /// A PR_Swap message was received.
        pub pr_swap: bool @ 14,
        /// A DR_Swap message was received.
        pub dr_swap: bool @ 15,
        /// A VCONN_Swap message was received.
        pub vconn_swap: bool @ 16,
        /// A Soft_Reset message was received.
        pub soft_reset: bool @ 17,
        /// Hard reset signalling was received.
        pub hard_reset: bool @ 18,
        /// A Not_Supported message was received.
        pub not_supported: bool @ 19,
        /// A Vendor_Defined message was received.
        pub vendor_defined: bool @ 20,
        /// A message of a reserved type was received.
        pub reserved: bool @ 21,
        /// A message passed the hardware CRC check and waits to be read.
        pub pass: bool @ 22,
    }
}

impl Status {
    /// The empty status.
    pub const EMPTY: Self = Self(0);

    /// A status with exactly one flag set.
    pub const fn from_flag(flag: StatusFlag) -> Self {
        Self(1 << flag as u64)
    }

    /// Add `flag` to the set.
    pub const fn with_flag(self, flag: StatusFlag) -> Self {
        Self(self.0 | (1 << flag as u64))
    }

    /// Whether no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether `flag` is set.
    pub const fn contains(&self, flag: StatusFlag) -> bool {
        self.0 & (1 << flag as u64) != 0
    }

    /// Whether any flag of `other` is set.
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// The flags that are set in both `self` and `other`.
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// The flags that are set in either `self` or `other`.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The flags of `self` that are not set in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl From<StatusFlag> for Status {
    fn from(flag: StatusFlag) -> Self {
        Self::from_flag(flag)
    }
}
