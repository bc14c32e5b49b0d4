//! Single-key storage: value, write stamp, in-flight fetch count.

use tokio::time::Instant;

use super::policy::Staleness;

/// What a reader sees for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState<T> {
    /// Never fetched.
    Absent,
    /// First fetch in flight; nothing to show yet.
    Pending,
    /// A value is present (possibly stale).
    Ready(T),
}

impl<T> EntryState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[derive(Debug)]
pub(crate) struct Slot<T> {
    value: Option<T>,
    updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: usize,
    staleness: Staleness,
}

impl<T: Clone> Slot<T> {
    pub(crate) fn empty(staleness: Staleness) -> Self {
        Self {
            value: None,
            updated_at: None,
            invalidated: false,
            in_flight: 0,
            staleness,
        }
    }

    pub(crate) fn with_value(staleness: Staleness, value: T) -> Self {
        Self {
            value: Some(value),
            updated_at: Some(Instant::now()),
            ..Self::empty(staleness)
        }
    }

    pub(crate) fn state(&self) -> EntryState<T> {
        match (&self.value, self.in_flight) {
            (Some(v), _) => EntryState::Ready(v.clone()),
            (None, 0) => EntryState::Absent,
            (None, _) => EntryState::Pending,
        }
    }

    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Value if present and not stale at `now`.
    pub(crate) fn fresh_value(&self, now: Instant) -> Option<T> {
        if self.is_stale(now) {
            None
        } else {
            self.value.clone()
        }
    }

    pub(crate) fn is_stale(&self, now: Instant) -> bool {
        match (&self.value, self.updated_at) {
            (Some(_), Some(at)) => self.invalidated || self.staleness.is_stale(at, now),
            _ => true,
        }
    }

    /// Last-write-wins.
    pub(crate) fn store(&mut self, value: T, now: Instant) {
        self.value = Some(value);
        self.updated_at = Some(now);
        self.invalidated = false;
    }

    pub(crate) fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn end_fetch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
