use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use crate::db::entities::setting;

// --- Settings Service Functions ---

/// Retrieves a setting by its key.
pub async fn get_setting(db: &DatabaseConnection, key: &str) -> Result<Option<setting::Model>, DbErr> {
    setting::Entity::find_by_id(key.to_owned()).one(db).await
}

pub async fn list_settings(db: &DatabaseConnection) -> Result<Vec<setting::Model>, DbErr> {
    setting::Entity::find()
        .order_by_asc(setting::Column::Key)
        .all(db)
        .await
}

/// Creates or updates a setting.
pub async fn update_setting(
    db: &DatabaseConnection,
    key: &str,
    value: &serde_json::Value,
) -> Result<setting::Model, DbErr> {
    let active_setting = setting::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value.clone()),
        updated_at: Set(Utc::now()),
    };
    setting::Entity::insert(active_setting)
        .on_conflict(
            OnConflict::column(setting::Column::Key)
                .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;
    get_setting(db, key)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Setting '{key}' vanished after upsert")))
}
