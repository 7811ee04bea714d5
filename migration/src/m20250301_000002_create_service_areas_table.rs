use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ServiceAreas {
    Table,
    Id,
    Name,
    DisplayOrder,
}

/// Areas available out of the box, in display order.
const DEFAULT_AREAS: [&str; 8] = [
    "Shibuya",
    "Shinjuku",
    "Roppongi",
    "Ginza",
    "Ebisu",
    "Ikebukuro",
    "Akasaka",
    "Nishiazabu",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceAreas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceAreas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceAreas::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceAreas::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(ServiceAreas::Table)
            .columns([ServiceAreas::Name, ServiceAreas::DisplayOrder]);
        for (order, name) in DEFAULT_AREAS.iter().enumerate() {
            seed.values_panic([(*name).into(), (order as i32).into()]);
        }

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceAreas::Table).to_owned())
            .await
    }
}
