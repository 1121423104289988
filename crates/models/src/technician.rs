use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, location, user};

pub const AVAILABILITY_VALUES: [&str; 3] = ["AVAILABLE", "BUSY", "UNAVAILABLE"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technician")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub profession: String,
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub years_experience: Option<i32>,
    pub availability: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Location,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Location => Entity::has_one(location::Entity).into(),
        }
    }
}

impl Related<location::Entity> for Entity {
    fn to() -> RelationDef { Relation::Location.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Normalize availability to its stored upper-case form.
pub fn validate_availability(value: &str) -> Result<String, errors::ModelError> {
    let up = value.trim().to_ascii_uppercase();
    if !AVAILABILITY_VALUES.contains(&up.as_str()) {
        return Err(errors::ModelError::Validation(format!(
            "availability must be one of {}",
            AVAILABILITY_VALUES.join(", ")
        )));
    }
    Ok(up)
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    profession: &str,
    business_name: Option<&str>,
    bio: Option<&str>,
) -> Result<Model, errors::ModelError> {
    if profession.trim().is_empty() {
        return Err(errors::ModelError::Validation("profession required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        profession: Set(profession.trim().to_string()),
        business_name: Set(business_name.map(str::to_string)),
        bio: Set(bio.map(str::to_string)),
        profile_picture: Set(None),
        years_experience: Set(None),
        availability: Set("AVAILABLE".into()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
