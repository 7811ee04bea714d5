use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::models::time_of_day;
use crate::models::users::UserSummary;

/// Hours a cast has to accept or decline a new request.
pub const RESPONSE_WINDOW_HOURS: i64 = 24;
pub const MAX_DURATION_HOURS: i32 = 24;

/// Booking lifecycle status. Declined, completed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Actions that move a booking between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
    Cancel,
    Complete,
}

impl Status {
    /// Statuses that hold the cast's time slot.
    pub const ACTIVE: [Status; 2] = [Status::Pending, Status::Accepted];

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Declined | Status::Completed | Status::Cancelled)
    }

    pub fn holds_slot(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn allows_messaging(self) -> bool {
        matches!(self, Status::Accepted | Status::Completed)
    }

    /// The state reached by applying `transition`, if it is legal from here.
    pub fn apply(self, transition: Transition) -> Result<Status, LifecycleError> {
        match (self, transition) {
            (Status::Pending, Transition::Accept) => Ok(Status::Accepted),
            (Status::Pending, Transition::Decline) => Ok(Status::Declined),
            (Status::Pending, Transition::Cancel) => Ok(Status::Cancelled),
            (Status::Accepted, Transition::Complete) => Ok(Status::Completed),
            (current, transition) => Err(LifecycleError::InvalidTransition {
                current,
                transition,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{}", invalid_transition_message(*.current, *.transition))]
    InvalidTransition { current: Status, transition: Transition },
    #[error("Response window expired")]
    ResponseWindowExpired,
    #[error("Cannot complete booking before its scheduled end")]
    NotYetEnded,
}

fn invalid_transition_message(current: Status, transition: Transition) -> String {
    match transition {
        Transition::Accept | Transition::Decline => "Booking already responded".to_string(),
        Transition::Cancel => "Only pending bookings can be cancelled".to_string(),
        Transition::Complete => format!("Booking must be accepted to complete (currently {current:?})"),
    }
}

/// SeaORM entity for the `bookings` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub guest_id: Uuid,
    pub cast_id: Uuid,
    pub booking_date: Date,
    pub start_time: Time,
    pub duration_hours: i32,
    pub location: String,
    pub amount: f64,
    pub status: Status,
    pub payment_intent_id: Option<String>,
    pub accepted_at: Option<DateTimeUtc>,
    pub declined_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::GuestId",
        to = "super::users::Column::Id"
    )]
    Guest,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CastId",
        to = "super::users::Column::Id"
    )]
    Cast,
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Which side of a booking a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Guest,
    Cast,
}

impl Model {
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.booking_date,
            start: self.start_time,
            duration_hours: self.duration_hours,
        }
    }

    pub fn party_of(&self, user_id: Uuid) -> Option<Party> {
        if user_id == self.guest_id {
            Some(Party::Guest)
        } else if user_id == self.cast_id {
            Some(Party::Cast)
        } else {
            None
        }
    }

    /// The user on the other side of the booking from `party`.
    pub fn counterpart(&self, party: Party) -> Uuid {
        match party {
            Party::Guest => self.cast_id,
            Party::Cast => self.guest_id,
        }
    }

    pub fn response_deadline(&self) -> DateTime<Utc> {
        response_deadline(self.created_at)
    }

    /// Pending and past its deadline; the booking stays pending until acted on.
    pub fn response_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == Status::Pending && now > self.response_deadline()
    }

    /// Guard for accept/decline.
    pub fn check_response(&self, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        self.status.apply(Transition::Accept)?;
        if now > self.response_deadline() {
            return Err(LifecycleError::ResponseWindowExpired);
        }
        Ok(())
    }

    pub fn check_cancel(&self) -> Result<(), LifecycleError> {
        self.status.apply(Transition::Cancel).map(|_| ())
    }

    pub fn check_complete(&self, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        if now < self.slot().ends_at() {
            return Err(LifecycleError::NotYetEnded);
        }
        self.status.apply(Transition::Complete).map(|_| ())
    }
}

/// A cast's time slot on one calendar date, in UTC wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_hours: i32,
}

impl Slot {
    fn start_secs(&self) -> i64 {
        i64::from(self.start.num_seconds_from_midnight())
    }

    fn end_secs(&self) -> i64 {
        self.start_secs() + i64::from(self.duration_hours) * 3600
    }

    /// Half-open interval overlap on the same date.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.date == other.date
            && self.start_secs() < other.end_secs()
            && other.start_secs() < self.end_secs()
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start).and_utc() + Duration::hours(i64::from(self.duration_hours))
    }
}

pub fn response_deadline(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::hours(RESPONSE_WINDOW_HOURS)
}

/// Price of a booking, rounded to cents.
pub fn booking_amount(hourly_rate: f64, duration_hours: i32) -> f64 {
    (hourly_rate * f64::from(duration_hours) * 100.0).round() / 100.0
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub cast_id: Uuid,
    pub booking_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[validate(range(min = 1, max = 24, message = "Duration must be 1-24 hours"))]
    pub duration_hours: i32,
    #[validate(length(min = 1, max = 255, message = "Location is required"))]
    pub location: String,
}

impl CreateBookingRequest {
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.booking_date,
            start: self.start_time,
            duration_hours: self.duration_hours,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseAction {
    Accept,
    Decline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    pub action: ResponseAction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<Status>,
}

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    pub booking_id: Uuid,
    pub amount: f64,
    pub status: Status,
    pub client_secret: Option<String>,
    pub payment_intent: String,
}

/// A booking as returned to either party or an admin.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub cast_id: Uuid,
    pub booking_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    pub duration_hours: i32,
    pub location: String,
    pub amount: f64,
    pub status: Status,
    pub accepted_at: Option<DateTimeUtc>,
    pub declined_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub response_deadline: DateTimeUtc,
    pub response_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<UserSummary>,
}

impl BookingView {
    pub fn new(m: Model, now: DateTime<Utc>) -> Self {
        Self {
            response_deadline: m.response_deadline(),
            response_expired: m.response_expired(now),
            id: m.id,
            guest_id: m.guest_id,
            cast_id: m.cast_id,
            booking_date: m.booking_date,
            start_time: m.start_time,
            duration_hours: m.duration_hours,
            location: m.location,
            amount: m.amount,
            status: m.status,
            accepted_at: m.accepted_at,
            declined_at: m.declined_at,
            completed_at: m.completed_at,
            cancelled_at: m.cancelled_at,
            created_at: m.created_at,
            guest: None,
            cast: None,
        }
    }

    pub fn with_guest(mut self, guest: Option<UserSummary>) -> Self {
        self.guest = guest;
        self
    }

    pub fn with_cast(mut self, cast: Option<UserSummary>) -> Self {
        self.cast = cast;
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn booking(status: Status, start: &str, hours: i32) -> Model {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Model {
            id: Uuid::new_v4(),
            guest_id: Uuid::new_v4(),
            cast_id: Uuid::new_v4(),
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: time_of_day::parse(start).unwrap(),
            duration_hours: hours,
            location: "Shibuya".into(),
            amount: booking_amount(100.0, hours),
            status,
            payment_intent_id: Some("pi_123".into()),
            accepted_at: None,
            declined_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn slot(start: &str, hours: i32) -> Slot {
        Slot {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start: time_of_day::parse(start).unwrap(),
            duration_hours: hours,
        }
    }

    #[test]
    fn premium_three_hours_costs_three_hundred() {
        assert_eq!(booking_amount(100.0, 3), 300.0);
        assert_eq!(booking_amount(60.0, 1), 60.0);
    }

    #[test]
    fn overlapping_slots_conflict() {
        let booked = slot("10:00", 2);
        assert!(booked.overlaps(&slot("11:00", 1)));
        assert!(booked.overlaps(&slot("09:00", 2)));
        assert!(booked.overlaps(&slot("09:00", 4)));
        assert!(!booked.overlaps(&slot("12:00", 1)));
        assert!(!booked.overlaps(&slot("08:00", 2)));
    }

    #[test]
    fn different_dates_never_overlap() {
        let mut other = slot("10:00", 2);
        other.date = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert!(!slot("10:00", 2).overlaps(&other));
    }

    #[test]
    fn only_the_documented_transitions_are_legal() {
        use Status::*;
        use Transition::*;

        assert_eq!(Pending.apply(Accept), Ok(Accepted));
        assert_eq!(Pending.apply(Decline), Ok(Declined));
        assert_eq!(Pending.apply(Cancel), Ok(Cancelled));
        assert_eq!(Accepted.apply(Complete), Ok(Completed));

        for status in [Accepted, Declined, Completed, Cancelled] {
            assert!(status.apply(Accept).is_err());
            assert!(status.apply(Cancel).is_err());
        }
        for status in [Pending, Declined, Completed, Cancelled] {
            assert!(status.apply(Complete).is_err());
        }
        assert!(Declined.is_terminal() && Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn response_window_is_twenty_four_hours() {
        let b = booking(Status::Pending, "10:00", 2);
        let within = b.created_at + Duration::hours(24);
        let after = b.created_at + Duration::hours(24) + Duration::seconds(1);

        assert!(b.check_response(within).is_ok());
        assert_eq!(b.check_response(after), Err(LifecycleError::ResponseWindowExpired));
        assert!(b.response_expired(after));
        assert!(!b.response_expired(within));
    }

    #[test]
    fn responding_twice_is_rejected() {
        let b = booking(Status::Accepted, "10:00", 2);
        let err = b.check_response(b.created_at).unwrap_err();
        assert_eq!(err.to_string(), "Booking already responded");
        assert!(!b.response_expired(b.created_at + Duration::days(3)));
    }

    #[test]
    fn completion_waits_for_the_scheduled_end() {
        let b = booking(Status::Accepted, "10:00", 2);
        let end = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        assert_eq!(b.slot().ends_at(), end);
        assert_eq!(
            b.check_complete(end - Duration::minutes(1)),
            Err(LifecycleError::NotYetEnded)
        );
        assert!(b.check_complete(end).is_ok());

        let pending = booking(Status::Pending, "10:00", 2);
        assert_eq!(
            pending.check_complete(end - Duration::minutes(1)),
            Err(LifecycleError::NotYetEnded)
        );
        assert!(pending.check_complete(end).is_err());
    }

    #[test]
    fn only_pending_bookings_can_be_cancelled() {
        assert!(booking(Status::Pending, "10:00", 1).check_cancel().is_ok());
        assert!(booking(Status::Accepted, "10:00", 1).check_cancel().is_err());
    }

    #[test]
    fn parties_and_counterparts() {
        let b = booking(Status::Accepted, "10:00", 1);
        assert_eq!(b.party_of(b.guest_id), Some(Party::Guest));
        assert_eq!(b.party_of(b.cast_id), Some(Party::Cast));
        assert_eq!(b.party_of(Uuid::new_v4()), None);
        assert_eq!(b.counterpart(Party::Guest), b.cast_id);
        assert_eq!(b.counterpart(Party::Cast), b.guest_id);
    }

    #[test]
    fn create_request_accepts_short_times() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "cast_id": Uuid::nil(),
            "booking_date": "2025-03-10",
            "start_time": "10:00",
            "duration_hours": 0,
            "location": "Ginza",
        }))
        .unwrap();
        assert!(req.validate().is_err());
        assert_eq!(req.slot().start, time_of_day::parse("10:00").unwrap());
    }

    #[test]
    fn view_reports_deadline() {
        let b = booking(Status::Pending, "10:00", 1);
        let now = b.created_at + Duration::hours(30);
        let view = BookingView::new(b.clone(), now);
        assert!(view.response_expired);
        assert_eq!(view.response_deadline, b.created_at + Duration::hours(24));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["start_time"], "10:00");
        assert_eq!(json["status"], "pending");
        assert!(json.get("guest").is_none());
    }
}
