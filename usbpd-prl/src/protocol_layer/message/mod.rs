//! Definitions of message content.
//!
//! The protocol layer treats data objects as opaque 32 bit words. Their interpretation is left to the policy engine.
#[allow(missing_docs)]
pub mod header;

use byteorder::{ByteOrder, LittleEndian};
use header::{ControlMessageType, DataMessageType, HEADER_SIZE, Header, MessageType};
use usbpd_prl_traits::StatusFlag;

/// The maximum number of data objects in a standard message.
pub const MAX_DATA_OBJECTS: usize = 7;

/// The size of a data object in bytes.
pub const DATA_OBJECT_SIZE: usize = 4;

/// The maximum standard message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + MAX_DATA_OBJECTS * DATA_OBJECT_SIZE;

/// The data objects of a message.
pub type DataObjects = heapless::Vec<u32, MAX_DATA_OBJECTS>;

/// Errors that can occur during message/header parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The input buffer has an invalid length.
    #[error("invalid input buffer length (expected {expected:?}, found {found:?})")]
    InvalidLength {
        /// The expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
    /// The specification revision field is not supported.
    #[error("unsupported specification revision `{0}`")]
    UnsupportedSpecificationRevision(u8),
}

/// A USB PD message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// The message header.
    pub header: Header,
    /// Data objects that follow the header. Their number matches the header's `num_objects`.
    pub objects: DataObjects,
}

impl Message {
    /// Create a new message from a message header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            objects: DataObjects::new(),
        }
    }

    /// Create a new message from a header and data objects.
    ///
    /// The header's object count is updated to the number of objects. Returns `None` for more than
    /// [`MAX_DATA_OBJECTS`] objects.
    pub fn new_with_objects(header: Header, objects: &[u32]) -> Option<Self> {
        let objects = DataObjects::from_slice(objects).ok()?;

        Some(Self {
            header: header.with_num_objects(objects.len() as u8),
            objects,
        })
    }

    /// The number of bytes that [`Message::to_bytes`] writes.
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.objects.len() * DATA_OBJECT_SIZE
    }

    /// Serialize a message to a slice, returning the number of written bytes.
    pub fn to_bytes(&self, buffer: &mut [u8]) -> usize {
        let mut size = self.header.to_bytes(buffer);

        for object in self.objects.iter() {
            LittleEndian::write_u32(&mut buffer[size..size + DATA_OBJECT_SIZE], *object);
            size += DATA_OBJECT_SIZE;
        }

        size
    }

    /// Parse a message from a slice of bytes.
    ///
    /// Trailing bytes beyond the announced data objects are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let header = Header::from_bytes(data)?;
        let expected = HEADER_SIZE + header.num_objects() * DATA_OBJECT_SIZE;

        if data.len() < expected {
            return Err(ParseError::InvalidLength {
                expected,
                found: data.len(),
            });
        }

        let mut message = Self::new(header);
        for chunk in data[HEADER_SIZE..expected].chunks_exact(DATA_OBJECT_SIZE) {
            // At most seven objects fit into the three bit count.
            _ = message.objects.push(LittleEndian::read_u32(chunk));
        }

        Ok(message)
    }
}

/// The status flag that announces a received message of the given type.
///
/// Returns `None` for types that the status word does not track.
pub fn status_flag(message_type: MessageType) -> Option<StatusFlag> {
    let flag = match message_type {
        MessageType::Control(control) => match control {
            ControlMessageType::GoodCRC => StatusFlag::GoodCrc,
            ControlMessageType::Accept => StatusFlag::Accept,
            ControlMessageType::Reject => StatusFlag::Reject,
            ControlMessageType::Ping => StatusFlag::Ping,
            ControlMessageType::PsRdy => StatusFlag::PsRdy,
            ControlMessageType::GetSourceCap => StatusFlag::GetSourceCap,
            ControlMessageType::GetSinkCap => StatusFlag::GetSinkCap,
            ControlMessageType::DrSwap => StatusFlag::DrSwap,
            ControlMessageType::PrSwap => StatusFlag::PrSwap,
            ControlMessageType::VconnSwap => StatusFlag::VconnSwap,
            ControlMessageType::Wait => StatusFlag::Wait,
            ControlMessageType::SoftReset => StatusFlag::SoftReset,
            ControlMessageType::NotSupported => StatusFlag::NotSupported,
            ControlMessageType::Reserved => StatusFlag::Reserved,
            _ => return None,
        },
        MessageType::Data(data) => match data {
            DataMessageType::SourceCapabilities => StatusFlag::SourceCap,
            DataMessageType::SinkCapabilities => StatusFlag::SinkCap,
            DataMessageType::Request => StatusFlag::Request,
            DataMessageType::VendorDefined => StatusFlag::VendorDefined,
            DataMessageType::Reserved => StatusFlag::Reserved,
            _ => return None,
        },
        MessageType::Extended(_) => return None,
    };

    Some(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{Counter, CounterType};
    use crate::protocol_layer::message::header::SpecificationRevision;
    use crate::{DataRole, PowerRole};

    fn template() -> Header {
        Header::new_template(DataRole::Ufp, PowerRole::Sink, SpecificationRevision::R3_X)
    }

    #[test]
    fn request_serializes_header_then_objects() {
        let header = Header::new_data(
            template(),
            Counter::new_from_value(CounterType::MessageId, 3),
            DataMessageType::Request,
            0,
        );
        let message = Message::new_with_objects(header, &[0x1304_b12c]).unwrap();

        let mut buffer = [0u8; MAX_MESSAGE_SIZE];
        let size = message.to_bytes(&mut buffer);

        assert_eq!(size, 6);
        assert_eq!(size, message.size());
        assert_eq!(message.header.num_objects(), 1);
        assert_eq!(&buffer[2..6], &[0x2c, 0xb1, 0x04, 0x13]);
        assert_eq!(Message::from_bytes(&buffer[..size]), Ok(message));
    }

    #[test]
    fn too_many_objects() {
        assert!(Message::new_with_objects(template(), &[0; MAX_DATA_OBJECTS + 1]).is_none());
        assert!(Message::new_with_objects(template(), &[0; MAX_DATA_OBJECTS]).is_some());
    }

    #[test]
    fn truncated_payload() {
        // Source_Capabilities announcing seven objects, but only one is present.
        let data = [0xA1, 0x71, 0x2c, 0x91, 0x01, 0x08];

        assert_eq!(
            Message::from_bytes(&data),
            Err(ParseError::InvalidLength {
                expected: 30,
                found: 6
            })
        );
    }

    #[test]
    fn status_flags_for_received_types() {
        assert_eq!(
            status_flag(MessageType::Control(ControlMessageType::PsRdy)),
            Some(StatusFlag::PsRdy)
        );
        assert_eq!(
            status_flag(MessageType::Data(DataMessageType::SourceCapabilities)),
            Some(StatusFlag::SourceCap)
        );
        assert_eq!(status_flag(MessageType::Control(ControlMessageType::GetRevision)), None);
        assert_eq!(status_flag(MessageType::Extended(0b1_0001)), None);
    }
}
