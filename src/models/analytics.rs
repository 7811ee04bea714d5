use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::bookings::{self, BookingView, Status};
use crate::models::service_areas;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_guests: u64,
    pub total_casts: u64,
    pub total_bookings: u64,
    pub total_revenue: f64,
    pub recent_bookings: Vec<BookingView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub bookings: u64,
    pub revenue: f64,
}

/// Bookings per date; revenue counts completed bookings only.
pub fn booking_trend(rows: &[(NaiveDate, Status, f64)]) -> Vec<DailyTrend> {
    let mut by_date: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for &(date, status, amount) in rows {
        let entry = by_date.entry(date).or_default();
        entry.0 += 1;
        if status == Status::Completed {
            entry.1 += amount;
        }
    }
    by_date
        .into_iter()
        .map(|(date, (bookings, revenue))| DailyTrend {
            date,
            bookings,
            revenue,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCast {
    pub cast_id: Uuid,
    pub name: Option<String>,
    pub completed_bookings: u64,
    pub revenue: f64,
    pub average_rating: f64,
}

/// `(cast_id, amount)` of completed bookings, grouped and cut to the top `limit` earners.
pub fn top_earners(completed: &[(Uuid, f64)], limit: usize) -> Vec<(Uuid, u64, f64)> {
    let mut totals: HashMap<Uuid, (u64, f64)> = HashMap::new();
    for &(cast_id, amount) in completed {
        let entry = totals.entry(cast_id).or_default();
        entry.0 += 1;
        entry.1 += amount;
    }
    let mut ranked: Vec<(Uuid, u64, f64)> = totals
        .into_iter()
        .map(|(id, (count, revenue))| (id, count, revenue))
        .collect();
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then(b.1.cmp(&a.1)).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaStat {
    pub area: String,
    pub cast_count: u64,
}

/// Approved casts per known area, busiest first.
pub fn casts_per_area(areas: &[service_areas::Model], cast_areas: &[Vec<String>]) -> Vec<AreaStat> {
    let mut ordered: Vec<&service_areas::Model> = areas.iter().collect();
    ordered.sort_by_key(|a| a.display_order);

    let mut stats: Vec<AreaStat> = ordered
        .into_iter()
        .map(|area| AreaStat {
            cast_count: cast_areas
                .iter()
                .filter(|served| served.iter().any(|s| *s == area.name))
                .count() as u64,
            area: area.name.clone(),
        })
        .collect();
    // Stable sort keeps display order among equal counts.
    stats.sort_by(|a, b| b.cast_count.cmp(&a.cast_count));
    stats
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub booking_trend: Vec<DailyTrend>,
    pub top_casts: Vec<TopCast>,
    pub area_stats: Vec<AreaStat>,
}

/// Earnings overview for one cast.
#[derive(Debug, Serialize)]
pub struct Earnings {
    pub total_earnings: f64,
    pub this_month: f64,
    pub pending_amount: f64,
    pub completed_count: u64,
    pub recent_completed: Vec<BookingView>,
}

pub const RECENT_COMPLETED: usize = 10;

impl Earnings {
    /// `bookings` are all of one cast's bookings in any order.
    pub fn from_bookings(bookings: Vec<bookings::Model>, now: DateTime<Utc>) -> Self {
        let mut total_earnings = 0.0;
        let mut this_month = 0.0;
        let mut pending_amount = 0.0;
        let mut completed = Vec::new();

        for b in bookings {
            match b.status {
                Status::Completed => {
                    total_earnings += b.amount;
                    let done = b.completed_at.unwrap_or(b.updated_at);
                    if done.year() == now.year() && done.month() == now.month() {
                        this_month += b.amount;
                    }
                    completed.push(b);
                }
                Status::Accepted => pending_amount += b.amount,
                Status::Pending | Status::Declined | Status::Cancelled => {}
            }
        }

        let completed_count = completed.len() as u64;
        completed.sort_by_key(|b| std::cmp::Reverse(b.completed_at.unwrap_or(b.updated_at)));
        completed.truncate(RECENT_COMPLETED);

        Self {
            total_earnings,
            this_month,
            pending_amount,
            completed_count,
            recent_completed: completed
                .into_iter()
                .map(|b| BookingView::new(b, now))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bookings::tests::booking;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn trend_groups_by_date_and_counts_completed_revenue() {
        let rows = vec![
            (day(2), Status::Completed, 100.0),
            (day(1), Status::Pending, 60.0),
            (day(2), Status::Cancelled, 300.0),
            (day(2), Status::Completed, 150.0),
        ];
        let trend = booking_trend(&rows);
        assert_eq!(
            trend,
            vec![
                DailyTrend { date: day(1), bookings: 1, revenue: 0.0 },
                DailyTrend { date: day(2), bookings: 3, revenue: 250.0 },
            ]
        );
    }

    #[test]
    fn top_earners_are_ranked_by_revenue() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![(a, 60.0), (b, 300.0), (a, 60.0), (c, 100.0)];
        let top = top_earners(&rows, 2);
        assert_eq!(top, vec![(b, 1, 300.0), (a, 2, 120.0)]);
    }

    #[test]
    fn area_counts_follow_served_areas() {
        let areas = vec![
            service_areas::Model { id: 1, name: "Shibuya".into(), display_order: 1 },
            service_areas::Model { id: 2, name: "Ginza".into(), display_order: 2 },
            service_areas::Model { id: 3, name: "Ebisu".into(), display_order: 3 },
        ];
        let served = vec![
            vec!["Ginza".to_string()],
            vec!["Ginza".to_string(), "Shibuya".to_string()],
            vec!["Unknown".to_string()],
        ];
        let stats = casts_per_area(&areas, &served);
        let pairs: Vec<_> = stats.iter().map(|s| (s.area.as_str(), s.cast_count)).collect();
        assert_eq!(pairs, vec![("Ginza", 2), ("Shibuya", 1), ("Ebisu", 0)]);
    }

    #[test]
    fn earnings_split_by_status_and_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();

        let mut this_month = booking(Status::Completed, "10:00", 3);
        this_month.completed_at = Some(now - Duration::days(2));
        let mut last_month = booking(Status::Completed, "10:00", 1);
        last_month.completed_at = Some(now - Duration::days(40));
        let accepted = booking(Status::Accepted, "10:00", 2);
        let declined = booking(Status::Declined, "10:00", 2);

        let e = Earnings::from_bookings(vec![last_month, accepted, this_month, declined], now);
        assert_eq!(e.total_earnings, 400.0);
        assert_eq!(e.this_month, 300.0);
        assert_eq!(e.pending_amount, 200.0);
        assert_eq!(e.completed_count, 2);
        assert_eq!(e.recent_completed.len(), 2);
        assert_eq!(e.recent_completed[0].amount, 300.0);
    }
}
