//! Concrete message formats.
//!
//! | format | type | version |
//! |---|---|---|
//! | [`Parcel`] | `0x50` | `0x00` |
//! | [`Cargo`] | `0x43` | `0x00` |
//! | [`CargoCollectionAuthorization`] | `0x44` | `0x00` |
//!
//! All three share the generic [`Message`] fields and differ only in their
//! format signature, so a serialization of one format never deserializes as
//! another.

use crate::ramf::{Message, RamfFormat};

/// An end-to-end message between two endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parcel {
    message: Message,
}

impl Parcel {
    /// Wrap a message as a parcel.
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    /// Unwrap the generic message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl RamfFormat for Parcel {
    const CONCRETE_TYPE: u8 = 0x50;
    const CONCRETE_VERSION: u8 = 0x00;

    fn message(&self) -> &Message {
        &self.message
    }

    fn from_message(message: Message) -> Self {
        Self::new(message)
    }
}

/// A batch of encapsulated messages exchanged between gateways.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cargo {
    message: Message,
}

impl Cargo {
    /// Wrap a message as cargo.
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    /// Unwrap the generic message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl RamfFormat for Cargo {
    const CONCRETE_TYPE: u8 = 0x43;
    const CONCRETE_VERSION: u8 = 0x00;

    fn message(&self) -> &Message {
        &self.message
    }

    fn from_message(message: Message) -> Self {
        Self::new(message)
    }
}

/// Authorization for a gateway to collect cargo on behalf of another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CargoCollectionAuthorization {
    message: Message,
}

impl CargoCollectionAuthorization {
    /// Wrap a message as a cargo collection authorization.
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    /// Unwrap the generic message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl RamfFormat for CargoCollectionAuthorization {
    const CONCRETE_TYPE: u8 = 0x44;
    const CONCRETE_VERSION: u8 = 0x00;

    fn message(&self) -> &Message {
        &self.message
    }

    fn from_message(message: Message) -> Self {
        Self::new(message)
    }
}
