/// Automatic `created_at` / `updated_at` management
///
/// Pure functions over a payload and a clock, so the policy can be checked
/// without a driver. Each clock call is an independent read; `created_at` is
/// always read before `updated_at`.

use firedoc_core::{Document, Timestamp, Value, CREATED_AT_FIELD, UPDATED_AT_FIELD};

/// Options for timestamp-managed writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Inject `created_at` / `updated_at` (default: true)
    pub timestamps: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { timestamps: true }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store payloads verbatim
    pub fn without_timestamps() -> Self {
        Self { timestamps: false }
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

/// Stamp a new document: both fields set to now, overriding the payload
pub fn stamp_created(mut data: Document, mut now: impl FnMut() -> Timestamp) -> Document {
    let created = now();
    let updated = now();
    data.insert(CREATED_AT_FIELD, created);
    data.insert(UPDATED_AT_FIELD, updated);
    data
}

/// Stamp an upsert: keep a truthy `created_at` from the payload, otherwise
/// use now; `updated_at` is always now.
///
/// The stored document is never consulted, so callers replacing an existing
/// document must carry its `created_at` forward themselves.
pub fn stamp_saved(mut data: Document, mut now: impl FnMut() -> Timestamp) -> Document {
    let created = match data.get(CREATED_AT_FIELD) {
        Some(value) if value.is_truthy() => value.clone(),
        _ => Value::Timestamp(now()),
    };
    let updated = now();
    data.insert(CREATED_AT_FIELD, created);
    data.insert(UPDATED_AT_FIELD, updated);
    data
}

/// Stamp a partial update: only `updated_at`
pub fn stamp_updated(mut data: Document, mut now: impl FnMut() -> Timestamp) -> Document {
    data.insert(UPDATED_AT_FIELD, now());
    data
}
