use std::collections::HashMap;

use crate::base32::{self, ALPHABET};
use crate::config::PublicIdConfig;
use crate::publicid::crc8::crc8;
use crate::publicid::{DecodedPublicId, PublicId, PublicIdError, ResourceType};
use crate::{IdError, Result, Ulid128};

/// Encodes and decodes typed public id strings.
///
/// Format: `{prefix}{sep}{payload}[{sep}{checksum}]`, where the prefix is
/// fixed per [`ResourceType`], the payload is the canonical 26-character
/// encoding of the internal [`Ulid128`], and the checksum is an optional
/// CRC-8 over `{prefix}{sep}{payload}` rendered as two Crockford characters.
///
/// The prefix is what prevents an order id from slipping through an API
/// boundary that expects a member id: [`PublicIdCodec::validate`] decodes and
/// then asserts the resource type.
///
/// The table is immutable configuration; construction validates it and the
/// codec never changes afterwards.
pub struct PublicIdCodec {
    separator: char,
    lower_case: bool,
    checksum_enabled: bool,
    prefixes: [String; ResourceType::ALL.len()],
    by_prefix: HashMap<String, ResourceType>,
}

impl PublicIdCodec {
    /// Builds a codec from configuration.
    ///
    /// # Errors
    /// Fails at construction, not on first use, for a separator drawn from
    /// the payload alphabet, a prefix not matching `[a-z0-9]{2,10}`, or two
    /// resource types sharing one prefix.
    pub fn new(config: &PublicIdConfig) -> Result<Self> {
        let separator = config.separator;
        if separator.is_ascii_alphanumeric() {
            return Err(IdError::InvalidSeparator { separator });
        }

        let mut prefixes: [String; ResourceType::ALL.len()] = Default::default();
        let mut by_prefix = HashMap::with_capacity(ResourceType::ALL.len());
        for resource in ResourceType::ALL {
            let prefix = config
                .prefixes
                .get(&resource)
                .map(String::as_str)
                .unwrap_or_else(|| resource.default_prefix());
            if !is_valid_prefix(prefix) {
                return Err(IdError::InvalidPrefix {
                    prefix: prefix.to_owned(),
                });
            }
            if by_prefix.insert(prefix.to_owned(), resource).is_some() {
                return Err(IdError::DuplicatePrefix {
                    prefix: prefix.to_owned(),
                });
            }
            prefixes[resource.index()] = prefix.to_owned();
        }

        Ok(Self {
            separator,
            lower_case: config.lower_case,
            checksum_enabled: config.checksum_enabled,
            prefixes,
            by_prefix,
        })
    }

    /// The prefix bound to a resource type.
    #[must_use]
    pub fn prefix(&self, resource: ResourceType) -> &str {
        &self.prefixes[resource.index()]
    }

    /// Encodes an internal id into its external, typed form. Deterministic.
    #[must_use]
    pub fn encode(&self, resource: ResourceType, id: Ulid128) -> PublicId {
        let prefix = self.prefix(resource);
        let mut payload = [0_u8; Ulid128::ENCODED_LEN];
        id.encode_into(&mut payload);
        if self.lower_case {
            payload.make_ascii_lowercase();
        }

        let mut value = String::with_capacity(prefix.len() + 1 + Ulid128::ENCODED_LEN + 3);
        value.push_str(prefix);
        value.push(self.separator);
        // SAFETY: `payload` holds only Crockford base32 ASCII characters.
        value.push_str(unsafe { core::str::from_utf8_unchecked(&payload) });

        if self.checksum_enabled {
            let sum = crc8(value.as_bytes());
            value.push(self.separator);
            value.push(ALPHABET[(sum >> 5) as usize] as char);
            value.push(ALPHABET[(sum & 0x1F) as usize] as char);
        }

        PublicId::new(resource, value)
    }

    /// Decodes an external string back into `(resource, id)`.
    ///
    /// The checksum section is verified when present, whether or not this
    /// codec appends one itself.
    ///
    /// # Errors
    /// See [`PublicIdError`]; everything this method returns is in the "not
    /// parseable" category.
    pub fn decode(&self, public_id: &str) -> Result<DecodedPublicId, PublicIdError> {
        let mut sections = public_id.split(self.separator);
        let prefix = sections.next().filter(|s| !s.is_empty()).ok_or(PublicIdError::Malformed)?;
        let payload = sections.next().filter(|s| !s.is_empty()).ok_or(PublicIdError::Malformed)?;
        let checksum = sections.next();
        if sections.next().is_some() {
            return Err(PublicIdError::Malformed);
        }

        let resource = self
            .by_prefix
            .get(prefix)
            .copied()
            .ok_or_else(|| PublicIdError::UnknownPrefix {
                prefix: prefix.to_owned(),
            })?;

        if let Some(checksum) = checksum {
            let expected = decode_checksum(checksum)?;
            // The checksum covers the string exactly as transmitted.
            let covered_len = prefix.len() + self.separator.len_utf8() + payload.len();
            let actual = crc8(public_id[..covered_len].as_bytes());
            if expected != actual {
                return Err(PublicIdError::ChecksumMismatch { expected, actual });
            }
        }

        let id = Ulid128::decode(payload)?;
        Ok(DecodedPublicId { resource, id })
    }

    /// Decodes and asserts the resource type: the type-confusion guard.
    ///
    /// # Errors
    /// [`PublicIdError::TypeMismatch`] when the string is a valid id of
    /// another type; otherwise as [`PublicIdCodec::decode`].
    pub fn validate(
        &self,
        expected: ResourceType,
        public_id: &str,
    ) -> Result<DecodedPublicId, PublicIdError> {
        let decoded = self.decode(public_id)?;
        if decoded.resource != expected {
            return Err(PublicIdError::TypeMismatch {
                expected,
                actual: decoded.resource,
            });
        }
        Ok(decoded)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    (2..=10).contains(&prefix.len())
        && prefix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Decodes the two-character checksum section back into a byte.
fn decode_checksum(section: &str) -> Result<u8, PublicIdError> {
    let bytes = section.as_bytes();
    if bytes.len() != 2 {
        return Err(PublicIdError::Malformed);
    }
    let hi = base32::char_value(bytes[0]).ok_or(PublicIdError::Malformed)?;
    let lo = base32::char_value(bytes[1]).ok_or(PublicIdError::Malformed)?;
    // Two characters hold 10 bits; a value past one byte cannot be a CRC-8.
    let value = (u16::from(hi) << 5) | u16::from(lo);
    if value > u16::from(u8::MAX) {
        return Err(PublicIdError::Malformed);
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(configure: impl FnOnce(&mut PublicIdConfig)) -> PublicIdCodec {
        let mut config = PublicIdConfig::default();
        configure(&mut config);
        PublicIdCodec::new(&config).unwrap()
    }

    fn sample_id() -> Ulid128 {
        Ulid128::from_parts(1_469_922_850_259, 1_012_768_647_078_601_740_696_923)
    }

    #[test]
    fn encode_uses_prefix_separator_and_lowercase_payload() {
        let codec = codec(|_| {});
        let public = codec.encode(ResourceType::Order, sample_id());
        assert_eq!(public.as_str(), "ord_01arz3ndektsv4rrffq69g5fav");
        assert_eq!(public.resource(), ResourceType::Order);
    }

    #[test]
    fn round_trip_for_every_resource_type() {
        let codec = codec(|_| {});
        let id = sample_id();
        for resource in ResourceType::ALL {
            let encoded = codec.encode(resource, id);
            let decoded = codec.decode(encoded.as_str()).unwrap();
            assert_eq!(decoded.resource, resource);
            assert_eq!(decoded.id, id);
        }
    }

    #[test]
    fn round_trip_with_checksum() {
        let codec = codec(|c| c.checksum_enabled = true);
        let id = sample_id();
        let encoded = codec.encode(ResourceType::Wallet, id);
        // prefix + sep + 26 payload chars + sep + 2 checksum chars
        assert_eq!(encoded.as_str().len(), 3 + 1 + 26 + 1 + 2);
        let decoded = codec.decode(encoded.as_str()).unwrap();
        assert_eq!(decoded.id, id);
    }

    #[test]
    fn checksum_is_verified_even_when_disabled_locally() {
        let minting = codec(|c| c.checksum_enabled = true);
        let verifying = codec(|_| {});
        let encoded = minting.encode(ResourceType::Order, sample_id());
        assert!(verifying.decode(encoded.as_str()).is_ok());
    }

    #[test]
    fn corrupted_payload_fails_the_checksum() {
        let codec = codec(|c| c.checksum_enabled = true);
        let encoded = codec.encode(ResourceType::Order, sample_id()).into_string();
        // Flip one payload character; the string still parses structurally.
        let corrupted = encoded.replace("01arz", "01brz");
        match codec.decode(&corrupted) {
            Err(PublicIdError::ChecksumMismatch { .. }) => {}
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn type_confusion_is_rejected() {
        let codec = codec(|_| {});
        let encoded = codec.encode(ResourceType::Order, sample_id());
        match codec.validate(ResourceType::Member, encoded.as_str()) {
            Err(PublicIdError::TypeMismatch { expected, actual }) => {
                assert_eq!(expected, ResourceType::Member);
                assert_eq!(actual, ResourceType::Order);
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
        // And the happy path still returns the decoded id.
        let decoded = codec.validate(ResourceType::Order, encoded.as_str()).unwrap();
        assert_eq!(decoded.id, sample_id());
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let codec = codec(|_| {});
        let err = codec.decode("xyz_01arz3ndektsv4rrffq69g5fav").unwrap_err();
        assert_eq!(
            err,
            PublicIdError::UnknownPrefix {
                prefix: "xyz".to_owned()
            }
        );
    }

    #[test]
    fn malformed_strings_are_rejected() {
        let codec = codec(|_| {});
        for input in ["", "ord", "_", "ord_", "_abc", "ord_a_b_c"] {
            assert_eq!(codec.decode(input).unwrap_err(), PublicIdError::Malformed, "{input:?}");
        }
    }

    #[test]
    fn bad_payload_is_a_payload_error() {
        let codec = codec(|_| {});
        // 25 characters instead of 26.
        let err = codec.decode("ord_01arz3ndektsv4rrffq69g5fa").unwrap_err();
        assert!(matches!(err, PublicIdError::Payload(_)));
    }

    #[test]
    fn uppercase_payload_decodes_when_unchecksummed() {
        let codec = codec(|c| c.lower_case = false);
        let encoded = codec.encode(ResourceType::Order, sample_id());
        assert_eq!(encoded.as_str(), "ord_01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(codec.decode(encoded.as_str()).unwrap().id, sample_id());
    }

    #[test]
    fn prefix_overrides_are_honored() {
        let codec = codec(|c| {
            c.prefixes.insert(ResourceType::Member, "usr".to_owned());
        });
        let encoded = codec.encode(ResourceType::Member, sample_id());
        assert!(encoded.as_str().starts_with("usr_"));
        assert_eq!(
            codec.decode(encoded.as_str()).unwrap().resource,
            ResourceType::Member
        );
    }

    #[test]
    fn invalid_configuration_fails_construction() {
        let mut config = PublicIdConfig::default();
        config.separator = 'x';
        assert!(matches!(
            PublicIdCodec::new(&config),
            Err(IdError::InvalidSeparator { separator: 'x' })
        ));

        let mut config = PublicIdConfig::default();
        config.prefixes.insert(ResourceType::Order, "O!".to_owned());
        assert!(matches!(
            PublicIdCodec::new(&config),
            Err(IdError::InvalidPrefix { .. })
        ));

        let mut config = PublicIdConfig::default();
        config.prefixes.insert(ResourceType::Order, "dup".to_owned());
        config.prefixes.insert(ResourceType::Wallet, "dup".to_owned());
        assert!(matches!(
            PublicIdCodec::new(&config),
            Err(IdError::DuplicatePrefix { .. })
        ));
    }
}
