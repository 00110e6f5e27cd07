// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elapsed-response-time buckets for reporting and CRM tagging.

use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

/// Named range of elapsed time between the orchestrator's previous outbound
/// reply and the counterpart's latest inbound message.
///
/// The ordering of variants follows the ordering of the ranges, so bucket
/// comparisons behave like elapsed-time comparisons. Labels are stable --
/// they end up in external CRM fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString,
)]
pub enum ResponseBucket {
    /// No prior outbound reply exists for this counterpart.
    #[strum(serialize = "first-message")]
    FirstContact,
    #[strum(serialize = "0-2m")]
    Under2Min,
    #[strum(serialize = "2-5m")]
    TwoToFiveMin,
    #[strum(serialize = "5-10m")]
    FiveToTenMin,
    #[strum(serialize = "10-20m")]
    TenToTwentyMin,
    #[strum(serialize = "20-30m")]
    TwentyToThirtyMin,
    #[strum(serialize = "30-60m")]
    ThirtyToSixtyMin,
    #[strum(serialize = "1-2h")]
    OneToTwoHours,
    #[strum(serialize = "2-5h")]
    TwoToFiveHours,
    #[strum(serialize = "5h+")]
    OverFiveHours,
}

impl ResponseBucket {
    /// Classifies the elapsed time since the orchestrator's last outbound
    /// reply into a bucket.
    ///
    /// Total over its inputs: a missing prior outbound yields
    /// [`FirstContact`](Self::FirstContact), and negative deltas (clock skew
    /// or out-of-order events) clamp to zero seconds.
    pub fn classify(
        last_outbound_at: Option<DateTime<Utc>>,
        inbound_at: DateTime<Utc>,
    ) -> Self {
        let Some(last_outbound_at) = last_outbound_at else {
            return Self::FirstContact;
        };

        let elapsed_secs = (inbound_at - last_outbound_at).num_seconds().max(0);
        Self::from_elapsed_secs(elapsed_secs as u64)
    }

    /// Bucket for a non-negative elapsed duration in whole seconds.
    pub fn from_elapsed_secs(elapsed_secs: u64) -> Self {
        let minutes = elapsed_secs / 60;
        match minutes {
            0..=1 => Self::Under2Min,
            2..=4 => Self::TwoToFiveMin,
            5..=9 => Self::FiveToTenMin,
            10..=19 => Self::TenToTwentyMin,
            20..=29 => Self::TwentyToThirtyMin,
            30..=59 => Self::ThirtyToSixtyMin,
            60..=119 => Self::OneToTwoHours,
            120..=299 => Self::TwoToFiveHours,
            _ => Self::OverFiveHours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn no_prior_outbound_is_first_contact() {
        assert_eq!(
            ResponseBucket::classify(None, at(0)),
            ResponseBucket::FirstContact
        );
    }

    #[test]
    fn boundary_values_land_in_expected_buckets() {
        let cases = [
            (0, ResponseBucket::Under2Min),
            (119, ResponseBucket::Under2Min),
            (120, ResponseBucket::TwoToFiveMin),
            (299, ResponseBucket::TwoToFiveMin),
            (300, ResponseBucket::FiveToTenMin),
            (600, ResponseBucket::TenToTwentyMin),
            (1200, ResponseBucket::TwentyToThirtyMin),
            (1800, ResponseBucket::ThirtyToSixtyMin),
            (3599, ResponseBucket::ThirtyToSixtyMin),
            (3600, ResponseBucket::OneToTwoHours),
            (7200, ResponseBucket::TwoToFiveHours),
            (18_000, ResponseBucket::OverFiveHours),
            (100_000, ResponseBucket::OverFiveHours),
        ];
        for (elapsed, expected) in cases {
            assert_eq!(
                ResponseBucket::from_elapsed_secs(elapsed),
                expected,
                "elapsed {elapsed}s"
            );
        }
    }

    #[test]
    fn forty_minutes_is_thirty_to_sixty() {
        let outbound = at(0);
        let inbound = at(40 * 60);
        assert_eq!(
            ResponseBucket::classify(Some(outbound), inbound),
            ResponseBucket::ThirtyToSixtyMin
        );
    }

    #[test]
    fn negative_delta_clamps_to_zero() {
        // Inbound timestamp earlier than last outbound (clock skew).
        let outbound = at(100);
        let inbound = at(40);
        assert_eq!(
            ResponseBucket::classify(Some(outbound), inbound),
            ResponseBucket::Under2Min
        );
    }

    #[test]
    fn bucket_ordering_is_monotonic_in_elapsed_time() {
        let mut prev = ResponseBucket::from_elapsed_secs(0);
        for elapsed in (0..30_000).step_by(37) {
            let bucket = ResponseBucket::from_elapsed_secs(elapsed);
            assert!(bucket >= prev, "bucket regressed at {elapsed}s");
            prev = bucket;
        }
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ResponseBucket::FirstContact.to_string(), "first-message");
        assert_eq!(ResponseBucket::Under2Min.to_string(), "0-2m");
        assert_eq!(ResponseBucket::ThirtyToSixtyMin.to_string(), "30-60m");
        assert_eq!(ResponseBucket::OverFiveHours.to_string(), "5h+");
    }
}
