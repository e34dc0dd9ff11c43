//! Daily and hourly views over 3-hour forecast samples.

use chrono::{Local, NaiveDate, TimeZone};
use std::collections::HashMap;

use crate::model::{DailyForecastSummary, ForecastEntry};

/// Samples shown in the hourly strip (8 x 3h = 24h).
pub const HOURLY_SAMPLES: usize = 8;

/// Group samples by local calendar day.
///
/// Days keep the order in which they first appear. Temperature is the mean of
/// every sample of the day; condition and description come from the first one.
pub fn daily_summaries(entries: &[ForecastEntry], limit: usize) -> Vec<DailyForecastSummary> {
    daily_summaries_in(entries, &Local, limit)
}

/// Same as [`daily_summaries`], with the calendar day taken in `tz`.
pub fn daily_summaries_in<Tz: TimeZone>(
    entries: &[ForecastEntry],
    tz: &Tz,
    limit: usize,
) -> Vec<DailyForecastSummary> {
    let mut days: Vec<(DailyForecastSummary, f64)> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for entry in entries {
        let date = entry.timestamp.with_timezone(tz).date_naive();

        match index.get(&date) {
            Some(&i) => {
                let (summary, total) = &mut days[i];
                *total += entry.temperature_c;
                summary.samples += 1;
            }
            None => {
                index.insert(date, days.len());
                days.push((
                    DailyForecastSummary {
                        date,
                        temperature_c: entry.temperature_c,
                        condition_code: entry.condition_code,
                        description: entry.description.clone(),
                        samples: 1,
                    },
                    entry.temperature_c,
                ));
            }
        }
    }

    days.into_iter()
        .take(limit)
        .map(|(mut summary, total)| {
            summary.temperature_c = total / summary.samples as f64;
            summary
        })
        .collect()
}

/// The next `count` samples.
pub fn hourly(entries: &[ForecastEntry], count: usize) -> &[ForecastEntry] {
    &entries[..entries.len().min(count)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};

    fn sample(ts: &str, temp: f64, code: u16, desc: &str) -> ForecastEntry {
        ForecastEntry {
            timestamp: ts.parse::<DateTime<Utc>>().unwrap(),
            temperature_c: temp,
            condition_code: code,
            description: desc.to_string(),
        }
    }

    #[test]
    fn averages_per_day_in_first_seen_order() {
        let entries = vec![
            sample("2024-06-01T09:00:00Z", 30.0, 800, "clear sky"),
            sample("2024-06-01T12:00:00Z", 32.0, 500, "light rain"),
            sample("2024-06-02T09:00:00Z", 20.0, 801, "few clouds"),
        ];

        let days = daily_summaries_in(&entries, &Utc, 5);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[0].temperature_c, 31.0);
        assert_eq!(days[0].samples, 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(days[1].temperature_c, 20.0);
    }

    #[test]
    fn condition_comes_from_first_sample_of_day() {
        let entries = vec![
            sample("2024-06-01T00:00:00Z", 10.0, 800, "clear sky"),
            sample("2024-06-01T03:00:00Z", 10.0, 211, "thunderstorm"),
        ];

        let days = daily_summaries_in(&entries, &Utc, 5);
        assert_eq!(days[0].condition_code, 800);
        assert_eq!(days[0].description, "clear sky");
    }

    #[test]
    fn truncates_to_limit() {
        let entries: Vec<_> = (1..=7)
            .map(|d| sample(&format!("2024-06-0{d}T12:00:00Z"), d as f64, 800, "clear sky"))
            .collect();

        let days = daily_summaries_in(&entries, &Utc, 5);
        assert_eq!(days.len(), 5);
        assert_eq!(days[4].temperature_c, 5.0);
    }

    #[test]
    fn day_boundary_follows_timezone() {
        let entries = vec![
            sample("2024-06-01T22:00:00Z", 10.0, 800, "clear sky"),
            sample("2024-06-02T01:00:00Z", 20.0, 800, "clear sky"),
        ];

        assert_eq!(daily_summaries_in(&entries, &Utc, 5).len(), 2);

        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let days = daily_summaries_in(&entries, &plus_three, 5);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temperature_c, 15.0);
    }

    #[test]
    fn empty_input_gives_no_days() {
        assert!(daily_summaries(&[], 5).is_empty());
    }

    #[test]
    fn hourly_takes_at_most_count() {
        let entries: Vec<_> = (0..3)
            .map(|h| sample(&format!("2024-06-01T0{h}:00:00Z"), 1.0, 800, "clear sky"))
            .collect();
        assert_eq!(hourly(&entries, HOURLY_SAMPLES).len(), 3);
        assert_eq!(hourly(&entries, 2).len(), 2);
    }
}
