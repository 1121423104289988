use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, technician};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub technician_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub last_updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Technician,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Technician => Entity::belongs_to(technician::Entity)
                .from(Column::TechnicianId)
                .to(technician::Column::Id)
                .into(),
        }
    }
}

impl Related<technician::Entity> for Entity {
    fn to() -> RelationDef { Relation::Technician.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), errors::ModelError> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(errors::ModelError::Validation("lat must be within [-90, 90]".into()));
    }
    if !(lng.is_finite() && (-180.0..=180.0).contains(&lng)) {
        return Err(errors::ModelError::Validation("lng must be within [-180, 180]".into()));
    }
    Ok(())
}

/// Insert or replace the single location row of a technician.
pub async fn upsert(db: &DatabaseConnection, technician_id: Uuid, lat: f64, lng: f64) -> Result<Model, errors::ModelError> {
    validate_coordinates(lat, lng)?;
    let existing = Entity::find()
        .filter(Column::TechnicianId.eq(technician_id))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    let now = Utc::now().into();
    match existing {
        Some(found) => {
            let mut am: ActiveModel = found.into();
            am.lat = Set(lat);
            am.lng = Set(lng);
            am.last_updated_at = Set(now);
            am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
        }
        None => {
            let am = ActiveModel {
                id: Set(Uuid::new_v4()),
                technician_id: Set(technician_id),
                lat: Set(lat),
                lng: Set(lng),
                last_updated_at: Set(now),
            };
            am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
        }
    }
}
