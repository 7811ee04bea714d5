use sea_orm::*;

use crate::models::service_areas;

/// All service areas by display order.
pub async fn get_service_areas(db: &DatabaseConnection) -> Result<Vec<service_areas::Model>, DbErr> {
    service_areas::Entity::find()
        .order_by_asc(service_areas::Column::DisplayOrder)
        .all(db)
        .await
}

/// Names from `names` that are not known service areas.
pub async fn find_unknown_areas(
    db: &DatabaseConnection,
    names: &[String],
) -> Result<Vec<String>, DbErr> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let known: Vec<String> = service_areas::Entity::find()
        .select_only()
        .column(service_areas::Column::Name)
        .filter(service_areas::Column::Name.is_in(names.iter().cloned()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(names
        .iter()
        .filter(|n| !known.contains(n))
        .cloned()
        .collect())
}
