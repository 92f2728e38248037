//! The generic message shared by every concrete format.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, SubsecRound, TimeZone, Utc};
use relaynet_pki::Certificate;
use uuid::Uuid;

use crate::error::RamfError;
use crate::limits::DEFAULT_TTL_SECONDS;

/// A RAMF message before serialization or after deserialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    recipient_address: String,
    id: String,
    creation_date: DateTime<FixedOffset>,
    ttl: u32,
    payload: Vec<u8>,
    sender_certificate: Certificate,
    sender_certificate_chain: HashSet<Certificate>,
}

impl Message {
    /// Create a message with a random id, created now, expiring in five minutes.
    pub fn new(
        recipient_address: impl Into<String>,
        sender_certificate: Certificate,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            id: Uuid::new_v4().to_string(),
            creation_date: Utc::now().trunc_subsecs(0).fixed_offset(),
            ttl: DEFAULT_TTL_SECONDS,
            payload: payload.into(),
            sender_certificate,
            sender_certificate_chain: HashSet::new(),
        }
    }

    /// Set the message id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the creation date, in any time zone.
    pub fn with_creation_date<Tz: TimeZone>(mut self, creation_date: DateTime<Tz>) -> Self {
        self.creation_date = creation_date.fixed_offset();
        self
    }

    /// Set the time to live in seconds.
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the certificates between the sender and the trust anchor.
    ///
    /// The sender certificate is dropped from the chain if present.
    pub fn with_sender_certificate_chain(
        mut self,
        chain: impl IntoIterator<Item = Certificate>,
    ) -> Self {
        self.sender_certificate_chain = chain
            .into_iter()
            .filter(|certificate| certificate != &self.sender_certificate)
            .collect();
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        recipient_address: String,
        id: String,
        creation_date: DateTime<FixedOffset>,
        ttl: u32,
        payload: Vec<u8>,
        sender_certificate: Certificate,
        sender_certificate_chain: HashSet<Certificate>,
    ) -> Self {
        Self {
            recipient_address,
            id,
            creation_date,
            ttl,
            payload,
            sender_certificate,
            sender_certificate_chain,
        }
    }

    /// Address of the recipient.
    pub fn recipient_address(&self) -> &str {
        &self.recipient_address
    }

    /// Message id, unique per sender.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation date.
    pub fn creation_date(&self) -> DateTime<FixedOffset> {
        self.creation_date
    }

    /// Time to live in seconds.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// The opaque payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Certificate of the sender's signing key.
    pub fn sender_certificate(&self) -> &Certificate {
        &self.sender_certificate
    }

    /// Certificates between the sender and the trust anchor.
    pub fn sender_certificate_chain(&self) -> &HashSet<Certificate> {
        &self.sender_certificate_chain
    }

    /// Take ownership of the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Creation date plus time to live.
    pub fn expiry_date(&self) -> DateTime<FixedOffset> {
        self.creation_date
            .checked_add_signed(Duration::seconds(i64::from(self.ttl)))
            .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.fixed_offset())
    }

    /// Check that the message was created at or before `now` and has not
    /// expired yet.
    ///
    /// # Errors
    ///
    /// Returns [`RamfError::CreationDateInFuture`] or [`RamfError::Expired`].
    pub fn validate_timing(&self, now: DateTime<Utc>) -> Result<(), RamfError> {
        if self.creation_date > now {
            return Err(RamfError::CreationDateInFuture);
        }
        if self.expiry_date() < now {
            return Err(RamfError::Expired);
        }
        Ok(())
    }
}
