//! Collection codec: the persisted text form of one table.
//!
//! Current format is a versioned envelope:
//! `{"version":1,"records":[{...},{...}]}`.
//! A bare JSON array of objects (the unversioned format) still decodes.

use crate::{
    db::record::{Collection, Record},
    error::InternalError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Version written by [`encode`].
pub const FORMAT_VERSION: u32 = 1;

///
/// CodecError
///

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("collection payload is not valid: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("collection format version {found} is newer than supported {FORMAT_VERSION}")]
    UnsupportedVersion { found: u32 },

    #[error("collection failed to serialize: {0}")]
    Encode(serde_json::Error),
}

impl From<CodecError> for InternalError {
    fn from(err: CodecError) -> Self {
        Self::codec_corruption(err.to_string())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    records: &'a [Record],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
    Envelope { version: u32, records: Collection },
    Bare(Collection),
}

/// Serialize a collection into its persisted text form.
pub fn encode(records: &[Record]) -> Result<String, CodecError> {
    serde_json::to_string(&EnvelopeRef {
        version: FORMAT_VERSION,
        records,
    })
    .map_err(CodecError::Encode)
}

/// Strict decode; callers that must not lose data on corruption use this.
pub fn try_decode(text: &str) -> Result<Collection, CodecError> {
    match serde_json::from_str::<Persisted>(text) {
        Ok(Persisted::Envelope { version, records }) => {
            if version > FORMAT_VERSION {
                return Err(CodecError::UnsupportedVersion { found: version });
            }
            Ok(records)
        }
        Ok(Persisted::Bare(records)) => Ok(records),
        // re-run against the bare shape to surface a useful serde message
        Err(_) => Ok(serde_json::from_str::<Collection>(text)?),
    }
}

/// Tolerant decode: a corrupt payload yields an empty collection and a
/// diagnostic, never an error.
#[must_use]
pub fn decode(key: &str, text: &str) -> Collection {
    match try_decode(text) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding corrupt collection payload");
            Collection::new()
        }
    }
}

///
/// TESTS
///
