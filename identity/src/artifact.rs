//! Byte encoding shared by every persisted artifact.
//!
//! Artifacts are postcard-encoded and wrapped in an envelope carrying a kind
//! tag and a BLAKE3 checksum, so truncation, bit flips and passing one kind of
//! artifact where another is expected are all caught on load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};

const ENVELOPE_VERSION: u16 = 1;
const CHECKSUM_CONTEXT: &str = "identity-zk 2025 artifact checksum";

/// Values that can leave the process as bytes.
pub trait Artifact: Sized {
    const KIND: &'static str;

    fn to_bytes(&self) -> IdentityResult<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self>;
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    kind: String,
    version: u16,
    payload: Vec<u8>,
    checksum: [u8; 32],
}

fn checksum(kind: &str, version: u16, payload: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(CHECKSUM_CONTEXT);
    hasher.update(&(kind.len() as u64).to_le_bytes());
    hasher.update(kind.as_bytes());
    hasher.update(&version.to_le_bytes());
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

pub(crate) fn seal<T: Serialize>(kind: &'static str, value: &T) -> IdentityResult<Vec<u8>> {
    let encode_error = |err: postcard::Error| IdentityError::ArtifactEncode {
        kind,
        message: err.to_string(),
    };
    let payload = postcard::to_allocvec(value).map_err(encode_error)?;
    let envelope = Envelope {
        kind: kind.to_owned(),
        version: ENVELOPE_VERSION,
        checksum: checksum(kind, ENVELOPE_VERSION, &payload),
        payload,
    };
    postcard::to_allocvec(&envelope).map_err(encode_error)
}

/// Opens an envelope; the error string is wrapped by the caller.
pub(crate) fn unseal<T: DeserializeOwned>(kind: &'static str, bytes: &[u8]) -> Result<T, String> {
    let envelope: Envelope =
        postcard::from_bytes(bytes).map_err(|err| format!("bad envelope: {err}"))?;
    if envelope.kind != kind {
        return Err(format!("expected a {kind}, found a {}", envelope.kind));
    }
    if envelope.version != ENVELOPE_VERSION {
        return Err(format!("unsupported version {}", envelope.version));
    }
    if checksum(&envelope.kind, envelope.version, &envelope.payload) != envelope.checksum {
        return Err("checksum mismatch".into());
    }
    postcard::from_bytes(&envelope.payload).map_err(|err| format!("bad payload: {err}"))
}

pub(crate) fn unseal_artifact<T: DeserializeOwned>(
    kind: &'static str,
    bytes: &[u8],
) -> IdentityResult<T> {
    unseal(kind, bytes).map_err(|message| IdentityError::ArtifactDecode { kind, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u32,
        label: String,
    }

    fn sample() -> Sample {
        Sample {
            id: 7,
            label: "seven".into(),
        }
    }

    #[test]
    fn seal_then_unseal() {
        let bytes = seal("sample", &sample()).unwrap();
        let back: Sample = unseal_artifact("sample", &bytes).unwrap();
        assert_eq!(back, sample());
        assert_eq!(seal("sample", &back).unwrap(), bytes);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let bytes = seal("sample", &sample()).unwrap();
        let err = unseal::<Sample>("other", &bytes).unwrap_err();
        assert!(err.contains("expected a other"));
    }

    #[test]
    fn flipped_payload_byte_fails_the_checksum() {
        let mut bytes = seal("sample", &sample()).unwrap();
        // Last byte before the 32-byte checksum belongs to the payload.
        let index = bytes.len() - 33;
        bytes[index] ^= 0x01;
        assert!(matches!(
            unseal_artifact::<Sample>("sample", &bytes),
            Err(IdentityError::ArtifactDecode { kind: "sample", .. })
        ));
    }

    #[test]
    fn truncation_is_rejected() {
        let bytes = seal("sample", &sample()).unwrap();
        assert!(unseal::<Sample>("sample", &bytes[..bytes.len() / 2]).is_err());
        assert!(unseal::<Sample>("sample", &[]).is_err());
    }
}
