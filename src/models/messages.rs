use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// SeaORM entity for the `messages` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    pub sender_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_delete = "Cascade"
    )]
    Booking,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SenderId",
        to = "super::users::Column::Id"
    )]
    Sender,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub body: String,
}

/// A message as seen by one of the two parties.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: Option<String>,
    pub body: String,
    pub created_at: DateTimeUtc,
    pub is_mine: bool,
}

impl MessageView {
    pub fn new(m: Model, viewer: Uuid, sender_name: Option<String>) -> Self {
        Self {
            is_mine: m.sender_id == viewer,
            id: m.id,
            sender_id: m.sender_id,
            sender_name,
            body: m.body,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn body_length_is_bounded() {
        let empty = SendMessageRequest { body: String::new() };
        let long = SendMessageRequest { body: "a".repeat(1001) };
        let ok = SendMessageRequest { body: "a".repeat(1000) };

        assert!(empty.validate().is_err());
        assert!(long.validate().is_err());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn view_marks_own_messages() {
        let me = Uuid::new_v4();
        let msg = Model {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            sender_id: me,
            body: "see you at 10".into(),
            created_at: Utc::now(),
        };
        assert!(MessageView::new(msg.clone(), me, None).is_mine);
        assert!(!MessageView::new(msg, Uuid::new_v4(), None).is_mine);
    }
}
