//! Listings whose rows carry the records they point at.
//!
//! The page itself is a keyset walk over the base table, so cursors and seek
//! order are exactly those of [`SeaOrmRecordSource`]. Related records are
//! then loaded in one batch per relation and attached in memory.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use models::{bookmark, review, technician, user};

use super::{CursorEntity, RecordSource, SeaOrmRecordSource};
use crate::errors::ServiceError;
use crate::pagination::{Keyed, SortKey, SortSpec};

/// A listed record built from a base row plus its related records.
#[async_trait]
pub trait Embed: Keyed + Clone + Send + Sync + Sized + 'static {
    type Row: Keyed + Clone + Send + Sync;
    type Base: CursorEntity<Model = Self::Row>;

    /// Attach related records, keeping the order of `rows`.
    async fn embed(db: &DatabaseConnection, rows: Vec<Self::Row>) -> Result<Vec<Self>, ServiceError>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewWithParties {
    #[serde(flatten)]
    pub review: review::Model,
    pub user: Option<user::Model>,
    pub technician: Option<technician::Model>,
}

impl Keyed for ReviewWithParties {
    fn sort_key(&self) -> SortKey { self.review.sort_key() }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TechnicianWithUser {
    #[serde(flatten)]
    pub technician: technician::Model,
    pub user: Option<user::Model>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookmarkWithTechnician {
    #[serde(flatten)]
    pub bookmark: bookmark::Model,
    pub technician: Option<TechnicianWithUser>,
}

impl Keyed for BookmarkWithTechnician {
    fn sort_key(&self) -> SortKey { self.bookmark.sort_key() }
}

fn distinct_ids<T>(rows: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    rows.iter().map(id).collect::<BTreeSet<_>>().into_iter().collect()
}

async fn users_by_id(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
    operation: &'static str,
) -> Result<HashMap<Uuid, user::Model>, ServiceError> {
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(|e| ServiceError::data_source(operation, e))?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

#[async_trait]
impl Embed for ReviewWithParties {
    type Row = review::Model;
    type Base = review::Entity;

    async fn embed(db: &DatabaseConnection, rows: Vec<review::Model>) -> Result<Vec<Self>, ServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let users = users_by_id(db, distinct_ids(&rows, |r| r.user_id), "embed_review_users").await?;
        let technicians: HashMap<Uuid, technician::Model> = technician::Entity::find()
            .filter(technician::Column::Id.is_in(distinct_ids(&rows, |r| r.technician_id)))
            .all(db)
            .await
            .map_err(|e| ServiceError::data_source("embed_review_technicians", e))?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        Ok(rows
            .into_iter()
            .map(|review| ReviewWithParties {
                user: users.get(&review.user_id).cloned(),
                technician: technicians.get(&review.technician_id).cloned(),
                review,
            })
            .collect())
    }
}

#[async_trait]
impl Embed for BookmarkWithTechnician {
    type Row = bookmark::Model;
    type Base = bookmark::Entity;

    async fn embed(db: &DatabaseConnection, rows: Vec<bookmark::Model>) -> Result<Vec<Self>, ServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let technicians: HashMap<Uuid, TechnicianWithUser> = technician::Entity::find()
            .filter(technician::Column::Id.is_in(distinct_ids(&rows, |b| b.technician_id)))
            .find_also_related(user::Entity)
            .all(db)
            .await
            .map_err(|e| ServiceError::data_source("embed_bookmark_technicians", e))?
            .into_iter()
            .map(|(technician, user)| (technician.id, TechnicianWithUser { technician, user }))
            .collect();
        Ok(rows
            .into_iter()
            .map(|bookmark| BookmarkWithTechnician {
                technician: technicians.get(&bookmark.technician_id).cloned(),
                bookmark,
            })
            .collect())
    }
}

/// Keyset listing over `T::Base` that returns `T`.
pub struct EmbeddingRecordSource<T: Embed> {
    db: DatabaseConnection,
    rows: SeaOrmRecordSource<T::Base>,
}

impl<T: Embed> EmbeddingRecordSource<T> {
    pub fn new(db: DatabaseConnection) -> Self { Self { rows: SeaOrmRecordSource::new(db.clone()), db } }
}

#[async_trait]
impl<T> RecordSource for EmbeddingRecordSource<T>
where
    T: Embed,
    SeaOrmRecordSource<T::Base>: RecordSource<Record = T::Row, Filter = Condition>,
{
    type Record = T;
    type Filter = Condition;

    fn sort_spec(&self) -> SortSpec { self.rows.sort_spec() }

    async fn fetch_ordered(
        &self,
        filter: &Condition,
        sort: SortSpec,
        start_after: Option<&SortKey>,
        limit: u64,
    ) -> Result<Vec<T>, ServiceError> {
        let rows = self.rows.fetch_ordered(filter, sort, start_after, limit).await?;
        T::embed(&self.db, rows).await
    }

    async fn fetch_offset(&self, filter: &Condition, sort: SortSpec, skip: u64, take: u64) -> Result<Vec<T>, ServiceError> {
        let rows = self.rows.fetch_offset(filter, sort, skip, take).await?;
        T::embed(&self.db, rows).await
    }

    async fn count(&self, filter: &Condition) -> Result<u64, ServiceError> { self.rows.count(filter).await }
}
