//! Time source for services.
//!
//! Discount windows and double-points days are judged on the terminal's
//! local wall clock; stored timestamps are UTC. Tests pin both with
//! [`FixedClock`].

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Utc, Weekday};

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Local wall-clock time.
    fn now_local(&self) -> NaiveDateTime;

    fn weekday(&self) -> Weekday {
        self.now_local().weekday()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    utc: DateTime<Utc>,
    local: NaiveDateTime,
}

impl FixedClock {
    /// Local time equals UTC.
    pub fn at(local: NaiveDateTime) -> Self {
        FixedClock {
            utc: local.and_utc(),
            local,
        }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.utc
    }

    fn now_local(&self) -> NaiveDateTime {
        self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock_weekday() {
        // 2024-06-07 was a Friday
        let at = NaiveDate::from_ymd_opt(2024, 6, 7)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        let clock = FixedClock::at(at);
        assert_eq!(clock.weekday(), Weekday::Fri);
        assert_eq!(clock.now_utc().naive_utc(), at);
    }
}
