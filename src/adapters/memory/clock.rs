//! Manually driven clock.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Clock that only moves when told to. Second resolution.
#[derive(Debug)]
pub struct ManualClock {
    unix_secs: AtomicI64,
}

impl ManualClock {
    pub fn at(time: Timestamp) -> Self {
        Self {
            unix_secs: AtomicI64::new(time.as_unix_secs()),
        }
    }

    pub fn set(&self, time: Timestamp) {
        self.unix_secs.store(time.as_unix_secs(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.unix_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.unix_secs.load(Ordering::SeqCst))
    }
}
