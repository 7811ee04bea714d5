use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::users::UserSummary;

/// SeaORM entity for the `blocks` table. `user_id` blocked `blocked_user_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub blocked_user_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::BlockedUserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    BlockedUser,
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlockRequest {
    pub blocked_user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub id: Uuid,
    pub blocked_user: Option<UserSummary>,
    pub created_at: DateTimeUtc,
}
