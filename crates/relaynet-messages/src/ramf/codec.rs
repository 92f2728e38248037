//! Generic serializer and deserializer for RAMF formats.

use relaynet_crypto::PrivateKey;
use tracing::{debug, trace};

use super::fields;
use super::{FormatSignature, Message, RamfFormat};
use crate::error::{MessageError, RamfError, Result};
use crate::limits::{FORMAT_SIGNATURE_LENGTH, MAX_MESSAGE_LENGTH};
use crate::options::SignatureOptions;
use crate::signed_data;

/// Serialize and sign `message` with the default signature options.
///
/// # Errors
///
/// See [`serialize_with_options`].
pub fn serialize<F: RamfFormat>(message: &F, signing_key: &PrivateKey) -> Result<Vec<u8>> {
    serialize_with_options(message, signing_key, &SignatureOptions::default())
}

/// Serialize `message` and sign it with `signing_key`.
///
/// The sender certificate and chain are attached to the signature. No size
/// limit is enforced here.
///
/// # Errors
///
/// Returns an error if the creation date is not representable, a text
/// field has non-visible characters, or signing fails.
pub fn serialize_with_options<F: RamfFormat>(
    message: &F,
    signing_key: &PrivateKey,
    options: &SignatureOptions,
) -> Result<Vec<u8>> {
    let message = message.message();
    let fields = fields::encode(
        message.recipient_address(),
        message.id(),
        &message.creation_date(),
        message.ttl(),
        message.payload(),
    )?;
    let signed_data = signed_data::sign(
        &fields,
        signing_key,
        message.sender_certificate(),
        message.sender_certificate_chain(),
        options,
    )?;

    let mut serialization = Vec::with_capacity(FORMAT_SIGNATURE_LENGTH + signed_data.len());
    serialization.extend_from_slice(&FormatSignature::of::<F>().to_bytes());
    serialization.extend_from_slice(&signed_data);
    trace!(
        concrete_type = F::CONCRETE_TYPE,
        length = serialization.len(),
        "Serialized RAMF message"
    );
    Ok(serialization)
}

/// Deserialize a message of format `F` and verify its signature.
///
/// # Errors
///
/// Returns the first violation found, checking in order: size, format
/// signature, concrete type and version, signature, then fields.
pub fn deserialize<F: RamfFormat>(serialization: &[u8]) -> Result<F> {
    decode::<F>(serialization).map_err(|e| {
        debug!(concrete_type = F::CONCRETE_TYPE, error = %e, "Rejected RAMF message");
        e
    })
}

fn decode<F: RamfFormat>(serialization: &[u8]) -> Result<F> {
    if serialization.len() > MAX_MESSAGE_LENGTH {
        return Err(RamfError::TooLarge {
            length: serialization.len(),
        }
        .into());
    }

    let format_signature = FormatSignature::parse(serialization)?;
    if format_signature.concrete_type != F::CONCRETE_TYPE {
        return Err(RamfError::ConcreteTypeMismatch {
            expected: F::CONCRETE_TYPE,
            actual: format_signature.concrete_type,
        }
        .into());
    }
    if format_signature.concrete_version != F::CONCRETE_VERSION {
        return Err(RamfError::ConcreteVersionMismatch {
            expected: F::CONCRETE_VERSION,
            actual: format_signature.concrete_version,
        }
        .into());
    }

    let (plaintext, signer_certificate, certificates) =
        signed_data::verify_signature(&serialization[FORMAT_SIGNATURE_LENGTH..])?.into_parts();
    let fields = fields::decode(&plaintext)?;

    let chain = certificates
        .into_iter()
        .filter(|certificate| certificate != &signer_certificate)
        .collect();
    let message = Message::from_parts(
        fields.recipient_address,
        fields.id,
        fields.creation_date,
        fields.ttl,
        fields.payload,
        signer_certificate,
        chain,
    );
    Ok(F::from_message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Parcel;
    use crate::test_support::issue_ca;
    use relaynet_crypto::EcCurve;

    #[test]
    fn test_serialization_starts_with_format_signature() {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let parcel = Parcel::new(Message::new("0deadbeef", issue_ca(&key, "sender"), b"x".to_vec()));
        let serialization = serialize(&parcel, &key).unwrap();
        assert_eq!(&serialization[..10], b"Relaynet\x50\x00");
    }

    #[test]
    fn test_exactly_max_length_passes_size_check() {
        let mut serialization = vec![0u8; MAX_MESSAGE_LENGTH];
        serialization[..10].copy_from_slice(b"Relaynet\x50\x00");

        let error = deserialize::<Parcel>(&serialization).unwrap_err();
        assert!(matches!(error, MessageError::SignedData(_)));
    }

    #[test]
    fn test_over_max_length_rejected() {
        let serialization = vec![0u8; MAX_MESSAGE_LENGTH + 1];
        let error = deserialize::<Parcel>(&serialization).unwrap_err();
        assert!(matches!(
            error,
            MessageError::Ramf(RamfError::TooLarge { length }) if length == MAX_MESSAGE_LENGTH + 1
        ));
        assert_eq!(error.to_string(), "Message should not be larger than 9 MiB");
    }

    #[test]
    fn test_concrete_type_and_version_checked() {
        assert!(matches!(
            deserialize::<Parcel>(b"Relaynet\x43\x00"),
            Err(MessageError::Ramf(RamfError::ConcreteTypeMismatch {
                expected: 0x50,
                actual: 0x43
            }))
        ));
        assert!(matches!(
            deserialize::<Parcel>(b"Relaynet\x50\x01"),
            Err(MessageError::Ramf(RamfError::ConcreteVersionMismatch {
                expected: 0x00,
                actual: 0x01
            }))
        ));
    }
}
