use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::types::ActivityRecord;

/// Sentinel group for records whose start date is missing or unparseable.
pub const INVALID_DATE_KEY: &str = "Invalid Date";

/// Date-bucketing unit for the timeline view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    /// View-selector order, matching the rendered buttons.
    pub const ALL: [Granularity; 4] = [
        Granularity::Monthly,
        Granularity::Weekly,
        Granularity::Yearly,
        Granularity::Daily,
    ];

    /// Parse a granularity name. Unrecognized values fall back to the
    /// monthly default rather than erroring.
    pub fn from_param(value: &str) -> Self {
        match value {
            "daily" => Granularity::Daily,
            "weekly" => Granularity::Weekly,
            "yearly" => Granularity::Yearly,
            _ => Granularity::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        }
    }

    /// Button caption in the view selector.
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily",
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
            Granularity::Yearly => "Yearly",
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Monthly
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named bucket of records sharing one date key.
///
/// Record order inside a group follows dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityGroup<'a> {
    pub key: String,
    pub records: Vec<&'a ActivityRecord>,
}

impl ActivityGroup<'_> {
    pub fn is_invalid(&self) -> bool {
        self.key == INVALID_DATE_KEY
    }
}

/// Derive the group key for a start date under the given granularity.
///
/// Keys are zero-padded (`2024-01-05`, `2024-W03`, `2024-01`, `2024`) so
/// lexicographic order matches chronological order within one render.
pub fn group_key(start: Option<NaiveDateTime>, granularity: Granularity) -> String {
    let Some(start) = start else {
        return INVALID_DATE_KEY.to_string();
    };
    let date = start.date();
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Monthly => date.format("%Y-%m").to_string(),
        Granularity::Yearly => date.format("%Y").to_string(),
        Granularity::Weekly => format!("{}-W{:02}", date.year(), week_of_year(date)),
    }
}

/// Week-of-year, 1-based: `ceil((days_since_jan1 + weekday_of_jan1 + 1) / 7)`
/// with Sunday-first weekdays. Not ISO-8601; weeks never borrow from
/// adjacent years, so January 1st is always part of week 1.
pub fn week_of_year(date: NaiveDate) -> u32 {
    // January 1st of the same year always exists
    let jan1 = date.with_ordinal(1).unwrap_or(date);
    let days_since_jan1 = date.ordinal0();
    let jan1_weekday = jan1.weekday().num_days_from_sunday();
    (days_since_jan1 + jan1_weekday + 1).div_ceil(7)
}

/// Bucket records by date key and order the groups for display: newest
/// key first, the invalid-date bucket always last.
///
/// Every input record lands in exactly one group; membership is a pure
/// function of (scheduled start, granularity).
pub fn group_and_order(
    records: &[ActivityRecord],
    granularity: Granularity,
) -> Vec<ActivityGroup<'_>> {
    let mut groups: Vec<ActivityGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = group_key(record.scheduled_start, granularity);
        match index.get(&key) {
            Some(&i) => groups[i].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ActivityGroup {
                    key,
                    records: vec![record],
                });
            }
        }
    }

    groups.sort_by(|a, b| match (a.is_invalid(), b.is_invalid()) {
        (false, false) => b.key.cmp(&a.key),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    });

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_datetime;

    /// Helper to create a record with only a start date
    fn record_on(date: &str) -> ActivityRecord {
        ActivityRecord::new(
            Some(format!("Activity {date}")),
            None,
            parse_datetime(date),
            None,
            0,
        )
    }

    fn keys<'a>(groups: &'a [ActivityGroup<'a>]) -> Vec<&'a str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    // ========== Granularity tests ==========

    #[test]
    fn test_from_param_known_values() {
        assert_eq!(Granularity::from_param("daily"), Granularity::Daily);
        assert_eq!(Granularity::from_param("weekly"), Granularity::Weekly);
        assert_eq!(Granularity::from_param("monthly"), Granularity::Monthly);
        assert_eq!(Granularity::from_param("yearly"), Granularity::Yearly);
    }

    #[test]
    fn test_from_param_unrecognized_falls_back_to_monthly() {
        assert_eq!(Granularity::from_param("hourly"), Granularity::Monthly);
        assert_eq!(Granularity::from_param(""), Granularity::Monthly);
        assert_eq!(Granularity::from_param("DAILY"), Granularity::Monthly);
    }

    #[test]
    fn test_default_is_monthly() {
        assert_eq!(Granularity::default(), Granularity::Monthly);
    }

    // ========== group_key tests ==========

    #[test]
    fn test_group_key_per_granularity() {
        let start = parse_datetime("2024-01-15T09:00:00");

        assert_eq!(group_key(start, Granularity::Daily), "2024-01-15");
        assert_eq!(group_key(start, Granularity::Weekly), "2024-W03");
        assert_eq!(group_key(start, Granularity::Monthly), "2024-01");
        assert_eq!(group_key(start, Granularity::Yearly), "2024");
    }

    #[test]
    fn test_group_key_missing_date_is_sentinel() {
        for granularity in Granularity::ALL {
            assert_eq!(group_key(None, granularity), INVALID_DATE_KEY);
        }
    }

    #[test]
    fn test_group_key_zero_padding() {
        let start = parse_datetime("2024-03-05");
        assert_eq!(group_key(start, Granularity::Daily), "2024-03-05");
        assert_eq!(group_key(start, Granularity::Monthly), "2024-03");
    }

    // ========== week_of_year tests ==========

    #[test]
    fn test_week_of_year_first_week() {
        // 2024-01-01 is a Monday; Jan 1 weekday (Sunday-first) = 1
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_of_year(date), 1);
    }

    #[test]
    fn test_week_of_year_breaks_on_sunday() {
        // Saturday 2024-01-06 closes week 1; Sunday 2024-01-07 opens week 2
        assert_eq!(
            week_of_year(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()),
            1
        );
        assert_eq!(
            week_of_year(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()),
            2
        );
    }

    #[test]
    fn test_week_of_year_mid_january() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(week_of_year(date), 3);
    }

    #[test]
    fn test_week_of_year_end_of_leap_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(week_of_year(date), 53);
    }

    #[test]
    fn test_week_of_year_is_not_iso() {
        // 2022-01-02 is a Sunday: the heuristic opens week 2 while
        // ISO-8601 would still call it week 52 of 2021.
        let date = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();
        assert_eq!(week_of_year(date), 2);
        assert_ne!(week_of_year(date), date.iso_week().week());
    }

    // ========== group_and_order tests ==========

    #[test]
    fn test_monthly_grouping_descending() {
        let records = vec![record_on("2024-01-15"), record_on("2024-02-20")];

        let groups = group_and_order(&records, Granularity::Monthly);

        assert_eq!(keys(&groups), vec!["2024-02", "2024-01"]);
        assert_eq!(groups[0].records.len(), 1);
        assert_eq!(groups[1].records.len(), 1);
    }

    #[test]
    fn test_grouping_partitions_records() {
        let records = vec![
            record_on("2024-01-15"),
            record_on("2024-01-20"),
            record_on("2024-02-01"),
            record_on("2023-12-31"),
            ActivityRecord::new(Some("undated".to_string()), None, None, None, 0),
        ];

        for granularity in Granularity::ALL {
            let groups = group_and_order(&records, granularity);
            let total: usize = groups.iter().map(|g| g.records.len()).sum();
            assert_eq!(total, records.len());

            // every record id appears exactly once
            let mut ids: Vec<&str> = groups
                .iter()
                .flat_map(|g| g.records.iter().map(|r| r.id.as_str()))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), records.len());
        }
    }

    #[test]
    fn test_grouping_is_stable_under_granularity_roundtrip() {
        let records = vec![
            record_on("2024-01-15"),
            record_on("2024-01-20"),
            record_on("2024-02-01"),
        ];

        let before = group_and_order(&records, Granularity::Monthly);
        let _ = group_and_order(&records, Granularity::Daily);
        let after = group_and_order(&records, Granularity::Monthly);

        assert_eq!(before, after);
    }

    #[test]
    fn test_groups_ordered_descending_for_shuffled_input() {
        let records = vec![
            record_on("2023-06-10"),
            record_on("2024-03-01"),
            record_on("2022-11-05"),
            record_on("2024-01-15"),
        ];

        let groups = group_and_order(&records, Granularity::Daily);

        assert_eq!(
            keys(&groups),
            vec!["2024-03-01", "2024-01-15", "2023-06-10", "2022-11-05"]
        );
    }

    #[test]
    fn test_invalid_date_group_sorts_last() {
        // "Invalid Date" is lexicographically greater than any digit key,
        // so an unguarded descending sort would put it first.
        let records = vec![
            ActivityRecord::new(Some("undated".to_string()), None, None, None, 0),
            record_on("2024-01-15"),
            record_on("2024-02-20"),
        ];

        let groups = group_and_order(&records, Granularity::Monthly);

        assert_eq!(keys(&groups), vec!["2024-02", "2024-01", INVALID_DATE_KEY]);
    }

    #[test]
    fn test_records_keep_dataset_order_within_group() {
        let mut records = Vec::new();
        for hour in ["09:00", "08:00", "11:00"] {
            let mut record = record_on("2024-01-15");
            record.subject = Some(format!("at {hour}"));
            record.scheduled_start = parse_datetime(&format!("2024-01-15 {hour}"));
            records.push(record);
        }

        let groups = group_and_order(&records, Granularity::Daily);

        assert_eq!(groups.len(), 1);
        let subjects: Vec<&str> = groups[0]
            .records
            .iter()
            .map(|r| r.subject.as_deref().unwrap())
            .collect();
        assert_eq!(subjects, vec!["at 09:00", "at 08:00", "at 11:00"]);
    }

    #[test]
    fn test_weekly_grouping_collects_same_week() {
        // 2024-01-14 (Sunday) through 2024-01-20 (Saturday) share week 3
        let records = vec![
            record_on("2024-01-14"),
            record_on("2024-01-17"),
            record_on("2024-01-20"),
        ];

        let groups = group_and_order(&records, Granularity::Weekly);

        assert_eq!(keys(&groups), vec!["2024-W03"]);
        assert_eq!(groups[0].records.len(), 3);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let groups = group_and_order(&[], Granularity::Monthly);
        assert!(groups.is_empty());
    }
}
