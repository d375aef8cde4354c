// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Highest microsecond value handed out by [`Timestamp::now`] so far.
static LAST_MICROS: AtomicI64 = AtomicI64::new(0);

/// A wall-clock instant with microsecond resolution.
///
/// `now()` is monotonically capable: within one process, successive calls
/// never return equal or decreasing instants even if the wall clock steps
/// backwards. Chunk ordering by `cTime` relies on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        let wall = Utc::now().timestamp_micros();
        let mut last = LAST_MICROS.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match LAST_MICROS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => {
                    return Self(DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now));
                }
                Err(observed) => last = observed,
            }
        }
    }

    pub fn from_micros(micros: i64) -> Option<Self> {
        DateTime::from_timestamp_micros(micros).map(Self)
    }

    pub fn timestamp_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod test {
    use crate::Timestamp;

    #[test]
    fn test_now_is_strictly_monotonic() {
        let mut previous = Timestamp::now();
        for _ in 0..1_000 {
            let current = Timestamp::now();
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_rfc3339_round_trip() {
        let instant = Timestamp::now();
        let parsed: Timestamp = instant.to_rfc3339().parse().unwrap();
        assert_eq!(instant, parsed);
    }

    #[test]
    fn test_from_micros() {
        let instant = Timestamp::from_micros(1_700_000_000_000_000).unwrap();
        assert_eq!(instant.timestamp_micros(), 1_700_000_000_000_000);
    }
}
