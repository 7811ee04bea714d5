use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const MAX_GALLERY_IMAGES: u64 = 5;

/// SeaORM entity for the `cast_gallery_images` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cast_gallery_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cast_profile_id: Uuid,
    pub image_url: String,
    pub display_order: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cast_profiles::Entity",
        from = "Column::CastProfileId",
        to = "super::cast_profiles::Column::Id",
        on_delete = "Cascade"
    )]
    CastProfile,
}

impl Related<super::cast_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CastProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryImageResponse {
    pub id: Uuid,
    pub image_url: String,
    pub display_order: i32,
}

impl From<Model> for GalleryImageResponse {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            image_url: m.image_url,
            display_order: m.display_order,
        }
    }
}
