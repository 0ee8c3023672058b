use time::OffsetDateTime;

/// Source of "now" for expiry decisions and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Current instant as Unix epoch milliseconds.
    fn now_millis(&self) -> i64 {
        unix_millis(self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Clock that only moves when told to.
#[cfg(test)]
pub struct ManualClock(std::sync::Mutex<OffsetDateTime>);

#[cfg(test)]
impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self(std::sync::Mutex::new(start))
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn unix_millis_keeps_sub_second_precision() {
        let at = datetime!(2024-01-01 00:00:00.250 UTC);
        assert_eq!(unix_millis(at), 1_704_067_200_250);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(datetime!(2024-01-01 00:00:00 UTC));
        let before = clock.now_millis();
        clock.advance(time::Duration::milliseconds(300_001));
        assert_eq!(clock.now_millis() - before, 300_001);
    }
}
