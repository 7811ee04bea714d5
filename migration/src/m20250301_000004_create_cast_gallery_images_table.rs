use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum CastGalleryImages {
    Table,
    Id,
    CastProfileId,
    ImageUrl,
    DisplayOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CastProfiles {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CastGalleryImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CastGalleryImages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CastGalleryImages::CastProfileId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CastGalleryImages::ImageUrl).string().not_null())
                    .col(
                        ColumnDef::new(CastGalleryImages::DisplayOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CastGalleryImages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cast_gallery_images_profile_id")
                            .from(CastGalleryImages::Table, CastGalleryImages::CastProfileId)
                            .to(CastProfiles::Table, CastProfiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CastGalleryImages::Table).to_owned())
            .await
    }
}
