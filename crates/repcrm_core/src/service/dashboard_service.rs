//! Dashboard counters.
//!
//! # Invariants
//! - Sold properties and closed clients are excluded from totals.
//! - "Today" starts at local midnight of the supplied instant, or at the
//!   first valid local time after it when midnight is skipped by DST.

use crate::model::client::ClientStatus;
use crate::model::matching::MatchStatus;
use crate::model::property::PropertyStatus;
use crate::repo::client_repo::ClientRepository;
use crate::repo::match_repo::MatchRepository;
use crate::repo::property_repo::PropertyRepository;
use crate::repo::StatusPredicate;
use crate::service::ServiceResult;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Properties not yet sold.
    pub total_properties: u64,
    /// Clients whose deal is not closed.
    pub total_clients: u64,
    pub properties_in_negotiation: u64,
    /// Matches still pending a decision.
    pub active_matches: u64,
    pub new_matches_today: u64,
}

pub struct DashboardService<P, C, M>
where
    P: PropertyRepository,
    C: ClientRepository,
    M: MatchRepository,
{
    properties: P,
    clients: C,
    matches: M,
}

impl<P, C, M> DashboardService<P, C, M>
where
    P: PropertyRepository,
    C: ClientRepository,
    M: MatchRepository,
{
    pub fn new(properties: P, clients: C, matches: M) -> Self {
        Self {
            properties,
            clients,
            matches,
        }
    }

    /// Computes counters as of `now_ms`, using the machine's local day.
    pub fn stats(&self, now_ms: i64) -> ServiceResult<DashboardStats> {
        self.stats_in(&Local, now_ms)
    }

    /// Same as [`DashboardService::stats`] with an explicit day boundary zone.
    pub fn stats_in<Tz: TimeZone>(&self, tz: &Tz, now_ms: i64) -> ServiceResult<DashboardStats> {
        Ok(DashboardStats {
            total_properties: self
                .properties
                .count_properties(StatusPredicate::IsNot(PropertyStatus::Vendido))?,
            total_clients: self
                .clients
                .count_clients(StatusPredicate::IsNot(ClientStatus::Fechado))?,
            properties_in_negotiation: self
                .properties
                .count_properties(StatusPredicate::Is(PropertyStatus::Negociacao))?,
            active_matches: self
                .matches
                .count_matches(StatusPredicate::Is(MatchStatus::Pending))?,
            new_matches_today: self
                .matches
                .count_created_since(start_of_day_ms(tz, now_ms))?,
        })
    }
}

const MINUTES_PER_DAY: u32 = 24 * 60;
const DAY_START_STEP_MINUTES: usize = 15;

/// Epoch ms of the first instant (in `tz`) of the day containing `now_ms`.
///
/// That is local midnight, or the first valid local time after it when
/// midnight falls in a DST gap.
pub fn start_of_day_ms<Tz: TimeZone>(tz: &Tz, now_ms: i64) -> i64 {
    let Some(today) = tz
        .timestamp_millis_opt(now_ms)
        .single()
        .map(|now| now.date_naive())
    else {
        return now_ms;
    };
    (0..MINUTES_PER_DAY)
        .step_by(DAY_START_STEP_MINUTES)
        .filter_map(|minute| today.and_hms_opt(minute / 60, minute % 60, 0))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|start| start.timestamp_millis().min(now_ms))
        .unwrap_or(now_ms)
}

#[cfg(test)]
mod tests {
    use super::start_of_day_ms;
    use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn start_of_day_in_utc() {
        // 2024-05-10T15:30:00Z
        let now = 1_715_355_000_000;
        assert_eq!(start_of_day_ms(&Utc, now), 1_715_299_200_000);
    }

    #[test]
    fn start_of_day_respects_offset() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        // 2024-05-10T01:00:00Z is still 2024-05-09 22:00 in BRT.
        let now = 1_715_302_800_000;
        let midnight = start_of_day_ms(&brt, now);
        assert_eq!(midnight, 1_715_299_200_000 - 24 * HOUR_MS + 3 * HOUR_MS);
    }

    /// UTC-3 until 2018-11-04T03:00Z, UTC-2 after: local 00:00-00:59 of
    /// that day does not exist.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    fn switch_utc() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 11, 4)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap()
    }

    fn standard() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn summer() -> FixedOffset {
        FixedOffset::west_opt(2 * 3600).unwrap()
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid = |offset: FixedOffset, before_switch: bool| {
                let utc = *local - offset.fix();
                (utc < switch_utc()) == before_switch
            };
            match (valid(standard(), true), valid(summer(), false)) {
                (true, true) => LocalResult::Ambiguous(standard(), summer()),
                (true, false) => LocalResult::Single(standard()),
                (false, true) => LocalResult::Single(summer()),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < switch_utc() {
                standard()
            } else {
                summer()
            }
        }
    }

    #[test]
    fn day_starting_in_a_dst_gap_begins_at_first_valid_time() {
        let switch_ms = Utc.from_utc_datetime(&switch_utc()).timestamp_millis();
        // Local 10:00 on the switch day.
        let now = switch_ms + 9 * HOUR_MS;
        assert_eq!(start_of_day_ms(&MidnightGap, now), switch_ms);

        // The day before still starts at plain midnight (03:00Z).
        let day_before = switch_ms - 12 * HOUR_MS;
        assert_eq!(
            start_of_day_ms(&MidnightGap, day_before),
            switch_ms - 24 * HOUR_MS
        );
    }
}
