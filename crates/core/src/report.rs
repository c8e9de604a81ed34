//! Pure formatting logic behind the weekly report: grouping, length-bounded
//! partitioning, entry rendering, and the reporting window itself.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::domain::product::Product;
use crate::domain::progress_log::ProgressLog;

/// Per-field character budget imposed by the chat platform's embeds.
pub const EMBED_FIELD_BUDGET: usize = 1024;

/// Inclusive reporting window over `created_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The ISO week (Monday through Sunday, UTC) immediately before the week
/// containing `now`: Monday 00:00:00.000 through Sunday 23:59:59.999.
pub fn last_week_window(now: DateTime<Utc>) -> ReportWindow {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let this_week_monday = now.date_naive() - Duration::days(days_from_monday);
    let start_date = this_week_monday - Duration::days(7);

    let start = Utc.from_utc_datetime(&start_date.and_time(NaiveTime::MIN));
    let end = start + Duration::days(7) - Duration::milliseconds(1);

    ReportWindow { start, end }
}

/// Groups logs by product in first-seen order. Entry order within a group
/// follows the input; callers sort by `created_at` before rendering.
pub fn group_by_product(logs: Vec<ProgressLog>) -> Vec<(Product, Vec<ProgressLog>)> {
    let mut groups: Vec<(Product, Vec<ProgressLog>)> = Vec::new();

    for log in logs {
        match groups.iter_mut().find(|(product, _)| *product == log.product) {
            Some((_, entries)) => entries.push(log),
            None => groups.push((log.product, vec![log])),
        }
    }

    groups
}

/// Greedily packs pre-formatted lines into chunks whose summed character
/// counts stay within `max_len`. Separators are not counted. A single line
/// longer than the budget still gets a chunk of its own and exceeds it;
/// that is the documented exception, not an overflow policy.
pub fn partition_by_length(items: &[String], max_len: usize) -> Vec<Vec<String>> {
    let mut chunks: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for item in items {
        let item_len = item.chars().count();
        if !current.is_empty() && current_len + item_len > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += item_len;
        current.push(item.clone());
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Renders one report line: `<name> • <emoji> <summary>`.
pub fn format_entry(display_name: &str, log: &ProgressLog) -> String {
    format!("{display_name} • {} {}", log.log_type.emoji(), log.summary)
}

/// Named randomness seam so probabilistic content substitution can be pinned
/// in tests instead of sampling a bare RNG inline.
pub trait ChanceSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn roll(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngChance;

impl ChanceSource for ThreadRngChance {
    fn roll(&self) -> f64 {
        rand::random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::domain::log_type::LogType;
    use crate::domain::product::Product;
    use crate::domain::progress_log::ProgressLog;

    use super::{
        format_entry, group_by_product, last_week_window, partition_by_length, ChanceSource,
        ThreadRngChance,
    };

    fn log(id: i64, product: Product, log_type: LogType, summary: &str) -> ProgressLog {
        ProgressLog {
            id,
            user_id: format!("10000000000000{id:04}"),
            log_type,
            product,
            summary: summary.to_owned(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).single().expect("valid date"),
        }
    }

    #[test]
    fn window_spans_exactly_the_previous_iso_week() {
        // Thursday 2024-05-16.
        let now = Utc.with_ymd_and_hms(2024, 5, 16, 15, 30, 0).single().expect("valid date");
        let window = last_week_window(now);

        assert_eq!(window.start.to_rfc3339(), "2024-05-06T00:00:00+00:00");
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 5, 12, 23, 59, 59).single().expect("valid date")
                + chrono::Duration::milliseconds(999)
        );
    }

    #[test]
    fn window_from_a_monday_still_points_at_the_week_before() {
        // Monday 2024-05-13 at midnight exactly.
        let now = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).single().expect("valid date");
        let window = last_week_window(now);

        assert_eq!(window.start.to_rfc3339(), "2024-05-06T00:00:00+00:00");
    }

    #[test]
    fn window_crosses_year_boundaries() {
        // Wednesday 2025-01-01 sits in the ISO week starting Monday 2024-12-30.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).single().expect("valid date");
        let window = last_week_window(now);

        assert_eq!(window.start.to_rfc3339(), "2024-12-23T00:00:00+00:00");
        assert_eq!(window.end.date_naive().to_string(), "2024-12-29");
    }

    #[test]
    fn grouping_preserves_every_record_exactly_once() {
        let logs = vec![
            log(1, Product::TauOs, LogType::Feature, "a"),
            log(2, Product::Terra, LogType::BugFix, "b"),
            log(3, Product::TauOs, LogType::Release, "c"),
            log(4, Product::Homepage, LogType::Other, "d"),
        ];

        let groups = group_by_product(logs.clone());

        let total: usize = groups.iter().map(|(_, entries)| entries.len()).sum();
        assert_eq!(total, logs.len());

        let mut flattened: Vec<i64> =
            groups.iter().flat_map(|(_, entries)| entries.iter().map(|entry| entry.id)).collect();
        flattened.sort_unstable();
        assert_eq!(flattened, vec![1, 2, 3, 4]);

        for (product, entries) in &groups {
            assert!(entries.iter().all(|entry| entry.product == *product));
        }
    }

    #[test]
    fn grouping_keeps_first_seen_product_order() {
        let logs = vec![
            log(1, Product::Terra, LogType::Feature, "a"),
            log(2, Product::TauOs, LogType::Feature, "b"),
            log(3, Product::Terra, LogType::Feature, "c"),
        ];

        let groups = group_by_product(logs);
        let order: Vec<Product> = groups.iter().map(|(product, _)| *product).collect();
        assert_eq!(order, vec![Product::Terra, Product::TauOs]);
    }

    #[test]
    fn partition_respects_the_budget_and_preserves_order() {
        let items: Vec<String> = vec!["aaaa".into(), "bbbb".into(), "cccc".into(), "dd".into()];

        let chunks = partition_by_length(&items, 8);

        assert_eq!(chunks, vec![vec!["aaaa".to_owned(), "bbbb".to_owned()], vec![
            "cccc".to_owned(),
            "dd".to_owned()
        ]]);

        let rejoined: Vec<String> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn partition_never_exceeds_budget_except_for_a_single_oversized_item() {
        let items: Vec<String> =
            vec!["aa".into(), "x".repeat(20), "bb".into(), "cc".into(), "dd".into()];

        let chunks = partition_by_length(&items, 6);

        for chunk in &chunks {
            let total: usize = chunk.iter().map(|item| item.chars().count()).sum();
            if total > 6 {
                // The only permitted overflow is a lone item that is itself
                // longer than the budget.
                assert_eq!(chunk.len(), 1);
                assert!(chunk[0].chars().count() > 6);
            }
        }

        let rejoined: Vec<String> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn partition_counts_characters_not_bytes() {
        let items: Vec<String> = vec!["ééé".into(), "ééé".into()];
        let chunks = partition_by_length(&items, 6);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn partition_of_nothing_is_no_chunks() {
        assert!(partition_by_length(&[], 1024).is_empty());
    }

    #[test]
    fn entry_format_is_name_bullet_emoji_summary() {
        let entry = log(7, Product::TauOs, LogType::BugFix, "fixed crash");
        assert_eq!(format_entry("lea", &entry), "lea • :bug: fixed crash");
    }

    #[test]
    fn thread_rng_chance_stays_in_unit_interval() {
        let chance = ThreadRngChance;
        for _ in 0..64 {
            let roll = chance.roll();
            assert!((0.0..1.0).contains(&roll));
        }
    }
}
