//! Analytics response types and the day-bucket reduction.

use std::collections::HashMap;

use serde::Serialize;

use super::scan::ScanEvent;

/// Scan counts per calendar day, in first-seen order.
///
/// The order of days is the order in which each day key first occurs in the
/// event log, not chronological order. Charts rely on this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBuckets {
    buckets: Vec<(String, u64)>,
}

impl DayBuckets {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ScanEvent>) -> Self {
        let mut buckets: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for event in events {
            let day = event.time.day_key();
            match index.get(day) {
                Some(&slot) => buckets[slot].1 += 1,
                None => {
                    index.insert(day.to_string(), buckets.len());
                    buckets.push((day.to_string(), 1));
                }
            }
        }

        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum over all buckets; equals the number of events reduced.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|(_, count)| count).sum()
    }
}

/// Chart series with parallel `labels` and `values` arrays.
///
/// ```json
/// { "labels": ["2024-01-01", "2024-01-02"], "values": [2, 1] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucketSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl From<DayBuckets> for DayBucketSeries {
    fn from(buckets: DayBuckets) -> Self {
        let (labels, values) = buckets.buckets.into_iter().unzip();
        Self { labels, values }
    }
}

/// Live counter polled by dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanCountResponse {
    pub count: u64,
}

/// One row of an owner's analytics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessScanStat {
    pub name: String,
    pub count: u64,
}

/// Global totals for administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    pub total_businesses: u64,
    pub total_scans: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::BusinessId;
    use crate::models::scan::ScanTimestamp;

    fn scan(time: &str) -> ScanEvent {
        ScanEvent::new(BusinessId::from("b1"), ScanTimestamp::from(time))
    }

    #[test]
    fn groups_by_day_in_first_seen_order() {
        let events = vec![
            scan("2024-01-02 09:00"),
            scan("2024-01-01 10:00"),
            scan("2024-01-02 18:00"),
        ];
        let series = DayBucketSeries::from(DayBuckets::from_events(&events));
        assert_eq!(series.labels, vec!["2024-01-02", "2024-01-01"]);
        assert_eq!(series.values, vec![2, 1]);
    }

    #[test]
    fn empty_log_yields_empty_series() {
        let buckets = DayBuckets::from_events(&Vec::<ScanEvent>::new());
        assert!(buckets.is_empty());
        assert_eq!(buckets.total(), 0);
        let series = DayBucketSeries::from(buckets);
        assert!(series.labels.is_empty() && series.values.is_empty());
    }

    #[test]
    fn total_matches_event_count() {
        let events: Vec<_> = (0..7)
            .map(|i| scan(&format!("2024-02-0{} 12:00", i % 3 + 1)))
            .collect();
        let buckets = DayBuckets::from_events(&events);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.total(), 7);
    }
}
