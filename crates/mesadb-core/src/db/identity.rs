use crate::error::InternalError;
use rand_chacha::{
    ChaCha20Rng,
    rand_core::{RngCore, SeedableRng},
};
use std::sync::atomic::{AtomicU64, Ordering};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use ulid::Ulid;

// Distinguishes generators created within the same clock tick.
static GENERATOR_SEQ: AtomicU64 = AtomicU64::new(0);

///
/// Timestamp
/// One wall-clock reading in both forms the store needs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Timestamp {
    pub(crate) millis: u64,
    pub(crate) rfc3339: String,
}

impl Timestamp {
    pub(crate) fn now() -> Result<Self, InternalError> {
        let now = OffsetDateTime::now_utc();
        let rfc3339 = now
            .format(&Rfc3339)
            .map_err(|err| InternalError::storage_internal(format!("clock format: {err}")))?;
        let millis = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);

        Ok(Self { millis, rfc3339 })
    }
}

///
/// IdGenerator
///
/// ULID source: 48-bit millisecond timestamp plus an 80-bit suffix from a
/// per-store ChaCha stream. Ids are strictly increasing per generator,
/// even when the clock stalls or steps backwards.
///

pub(crate) struct IdGenerator {
    rng: ChaCha20Rng,
    last: Option<Ulid>,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let seq = GENERATOR_SEQ.fetch_add(1, Ordering::Relaxed);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seed = (nanos as u64) ^ seq.rotate_left(32);

        Self::from_seed(seed)
    }

    pub(crate) fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            last: None,
        }
    }

    pub(crate) fn next_id(&mut self, millis: u64) -> Ulid {
        let random = (u128::from(self.rng.next_u64()) << 64) | u128::from(self.rng.next_u64());
        let candidate = Ulid::from_parts(millis, random);

        let id = match self.last {
            Some(last) if candidate <= last => last
                .increment()
                .unwrap_or_else(|| Ulid::from_parts(last.timestamp_ms() + 1, random)),
            _ => candidate,
        };
        self.last = Some(id);

        id
    }
}

///
/// TESTS
///
