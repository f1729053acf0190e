//! Helpers shared by everything that talks to the backend.
//!
//! - `Subscription`/`cancel_subscription` manage the handle of an in-flight request.
//! - Date conversions between `chrono` values and the two textual formats the
//!   backend uses: short request params (`yyyy-mm-dd`) and timestamps carrying a
//!   literal `+0000` suffix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use thiserror::Error;
use tokio::task::AbortHandle;

/// Suffix the backend writes instead of a zone designator.
pub const BACKEND_OFFSET_SUFFIX: &str = "+0000";

/// Offset assumed for dates coming from request params (UTC+01:00).
pub const REQUEST_PARAM_OFFSET_SECS: i32 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HelperError {
    #[error("invalid request date param: {0:?}")]
    InvalidRequestParam(String),
}

/// Handle on an in-flight request task.
///
/// Cloning shares the handle; `unsubscribe` on any clone cancels it for all.
#[derive(Clone, Debug, Default)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

#[derive(Debug, Default)]
struct SubscriptionInner {
    closed: AtomicBool,
    handle: Mutex<Option<AbortHandle>>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the task this subscription controls.
    /// If the subscription was already cancelled the task is aborted right away.
    pub fn attach(&self, handle: AbortHandle) {
        if self.inner.closed.load(Ordering::Acquire) {
            handle.abort();
            return;
        }
        if let Ok(mut slot) = self.inner.handle.lock() {
            *slot = Some(handle);
        }
        // unsubscribe may have run between the check and the store
        if self.inner.closed.load(Ordering::Acquire) {
            self.release();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    /// Cancels the subscription. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.release();
    }

    fn release(&self) {
        let handle = match self.inner.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Cancels a subscription; no-op for `None` or an already inactive one.
pub fn cancel_subscription(subscription: Option<&Subscription>) {
    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
}

/// Formats a date as `yyyy-mm-dd` using the calendar fields of its own time zone.
/// Pass a `DateTime<Local>` to get the local calendar day.
pub fn convert_date_to_request_param<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parses a `yyyy-mm-dd` request param as midnight at UTC+01:00.
pub fn convert_request_param_to_date(date_str: &str) -> Result<DateTime<FixedOffset>, HelperError> {
    let invalid = || HelperError::InvalidRequestParam(date_str.to_string());
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    let offset = FixedOffset::east_opt(REQUEST_PARAM_OFFSET_SECS).ok_or_else(invalid)?;
    offset.from_local_datetime(&midnight).single().ok_or_else(invalid)
}

/// Converts a backend date string to a UTC date time.
///
/// Never fails: missing or unparseable input yields the Unix epoch.
pub fn convert_string_to_date(date_str: Option<&str>) -> DateTime<Utc> {
    date_str
        .and_then(parse_backend_date)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_backend_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.trim().replacen(BACKEND_OFFSET_SUFFIX, "Z", 1);

    if let Ok(date) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(date.with_timezone(&Utc));
    }
    // no zone at all: read as UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Converts a date to the backend's string form, e.g. `2023-01-05T10:00:00.000+0000`.
pub fn convert_date_to_string(date: Option<&DateTime<Utc>>) -> Option<String> {
    date.map(|date| {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
            .replacen('Z', BACKEND_OFFSET_SUFFIX, 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn request_param_is_zero_padded() {
        assert_eq!(convert_date_to_request_param(&utc(2023, 1, 5, 23, 0, 0)), "2023-01-05");
        assert_eq!(convert_date_to_request_param(&utc(2023, 11, 25, 0, 0, 0)), "2023-11-25");
    }

    #[test]
    fn request_param_uses_the_dates_own_calendar() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let late_utc = utc(2023, 1, 5, 23, 30, 0).with_timezone(&plus_two);
        assert_eq!(convert_date_to_request_param(&late_utc), "2023-01-06");
    }

    #[test]
    fn request_param_parses_as_midnight_plus_one() {
        let date = convert_request_param_to_date("2023-01-05").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 3600);
        assert_eq!(date.hour(), 0);
        assert_eq!(date.with_timezone(&Utc), utc(2023, 1, 4, 23, 0, 0));
    }

    #[test]
    fn request_param_rejects_garbage() {
        assert_eq!(
            convert_request_param_to_date("05.01.2023"),
            Err(HelperError::InvalidRequestParam("05.01.2023".into()))
        );
    }

    #[test]
    fn backend_suffix_is_read_as_utc() {
        let date = convert_string_to_date(Some("2023-01-05T10:00:00+0000"));
        assert_eq!(date, utc(2023, 1, 5, 10, 0, 0));

        let with_millis = convert_string_to_date(Some("2023-01-05T10:00:00.250+0000"));
        assert_eq!(with_millis, utc(2023, 1, 5, 10, 0, 0) + Duration::milliseconds(250));
    }

    #[test]
    fn other_offsets_are_honoured() {
        let date = convert_string_to_date(Some("2023-01-05T10:00:00+0100"));
        assert_eq!(date, utc(2023, 1, 5, 9, 0, 0));
        let date = convert_string_to_date(Some("2023-01-05T10:00:00+01:00"));
        assert_eq!(date, utc(2023, 1, 5, 9, 0, 0));
    }

    #[test]
    fn bare_dates_are_utc_midnight() {
        assert_eq!(convert_string_to_date(Some("2023-01-05")), utc(2023, 1, 5, 0, 0, 0));
    }

    #[test]
    fn invalid_input_falls_back_to_epoch() {
        assert_eq!(convert_string_to_date(None), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(convert_string_to_date(Some("not-a-date")), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(convert_string_to_date(Some("")), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn date_to_string_reapplies_suffix() {
        assert_eq!(
            convert_date_to_string(Some(&utc(2023, 1, 5, 10, 0, 0))).as_deref(),
            Some("2023-01-05T10:00:00.000+0000")
        );
        assert_eq!(convert_date_to_string(None), None);
    }

    #[test]
    fn string_round_trip_truncates_to_millis() {
        let precise = utc(2024, 2, 29, 13, 14, 15) + Duration::nanoseconds(123_456_789);
        let text = convert_date_to_string(Some(&precise)).unwrap();
        let back = convert_string_to_date(Some(&text));
        assert_eq!(back, utc(2024, 2, 29, 13, 14, 15) + Duration::milliseconds(123));
    }

    #[test]
    fn cancel_subscription_accepts_none() {
        cancel_subscription(None);
    }

    #[tokio::test]
    async fn cancel_twice_is_a_noop() {
        let task = tokio::spawn(std::future::pending::<()>());
        let subscription = Subscription::new();
        subscription.attach(task.abort_handle());
        assert!(subscription.is_active());

        cancel_subscription(Some(&subscription));
        cancel_subscription(Some(&subscription));

        assert!(!subscription.is_active());
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn attach_after_cancel_aborts_immediately() {
        let subscription = Subscription::new();
        subscription.unsubscribe();

        let task = tokio::spawn(std::future::pending::<()>());
        subscription.attach(task.abort_handle());
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
