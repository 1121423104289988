//! Keyset listing over any SeaORM entity.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::DateTime;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Value,
};

use models::{bookmark, review, service, service_category, technician, user};

use super::RecordSource;
use crate::errors::ServiceError;
use crate::pagination::{Keyed, SortDirection, SortKey, SortKind, SortSpec, SortValue};

/// Entity that can be listed by keyset: a sort column plus an id tiebreak.
pub trait CursorEntity: EntityTrait {
    const DEFAULT_SORT: SortSpec;
    const SORT_KIND: SortKind;

    fn sort_column() -> Self::Column;

    fn id_column() -> Self::Column;
}

pub struct SeaOrmRecordSource<E> {
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SeaOrmRecordSource<E> {
    pub fn new(db: DatabaseConnection) -> Self { Self { db, _entity: PhantomData } }
}

impl<E> Clone for SeaOrmRecordSource<E> {
    fn clone(&self) -> Self { Self::new(self.db.clone()) }
}

fn order_of(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Convert a cursor's primary value into a bind value for `E`'s sort column.
fn bind_value<E: CursorEntity>(value: &SortValue) -> Result<Value, ServiceError> {
    if value.kind() != E::SORT_KIND {
        return Err(ServiceError::InvalidCursor("cursor does not belong to this listing".into()));
    }
    Ok(match value {
        SortValue::Timestamp(micros) => {
            let ts = DateTime::from_timestamp_micros(*micros)
                .ok_or_else(|| ServiceError::InvalidCursor("cursor timestamp out of range".into()))?;
            Value::from(ts.fixed_offset())
        }
        SortValue::Integer(n) => Value::from(*n),
        SortValue::Text(s) => Value::from(s.clone()),
    })
}

/// `(sort, id)` strictly after `key` in `direction`.
fn seek_condition<E: CursorEntity>(key: &SortKey, direction: SortDirection) -> Result<Condition, ServiceError> {
    let primary = bind_value::<E>(&key.primary)?;
    let (sort, id) = (E::sort_column(), E::id_column());
    let cond = match direction {
        SortDirection::Desc => Condition::any()
            .add(sort.lt(primary.clone()))
            .add(Condition::all().add(sort.eq(primary)).add(id.lt(key.id))),
        SortDirection::Asc => Condition::any()
            .add(sort.gt(primary.clone()))
            .add(Condition::all().add(sort.eq(primary)).add(id.gt(key.id))),
    };
    Ok(cond)
}

#[async_trait]
impl<E> RecordSource for SeaOrmRecordSource<E>
where
    E: CursorEntity,
    E::Model: Keyed + Clone + Send + Sync,
{
    type Record = E::Model;
    type Filter = Condition;

    fn sort_spec(&self) -> SortSpec { E::DEFAULT_SORT }

    async fn fetch_ordered(
        &self,
        filter: &Condition,
        sort: SortSpec,
        start_after: Option<&SortKey>,
        limit: u64,
    ) -> Result<Vec<E::Model>, ServiceError> {
        let mut query = E::find().filter(filter.clone());
        if let Some(key) = start_after {
            query = query.filter(seek_condition::<E>(key, sort.direction)?);
        }
        let order = order_of(sort.direction);
        query
            .order_by(E::sort_column(), order.clone())
            .order_by(E::id_column(), order)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::data_source("fetch_ordered", e))
    }

    async fn fetch_offset(
        &self,
        filter: &Condition,
        sort: SortSpec,
        skip: u64,
        take: u64,
    ) -> Result<Vec<E::Model>, ServiceError> {
        let order = order_of(sort.direction);
        E::find()
            .filter(filter.clone())
            .order_by(E::sort_column(), order.clone())
            .order_by(E::id_column(), order)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::data_source("fetch_offset", e))
    }

    async fn count(&self, filter: &Condition) -> Result<u64, ServiceError> {
        E::find()
            .filter(filter.clone())
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::data_source("count", e))
    }
}

macro_rules! created_at_listing {
    ($($entity:ident),+ $(,)?) => {$(
        impl CursorEntity for $entity::Entity {
            const DEFAULT_SORT: SortSpec = SortSpec::desc();
            const SORT_KIND: SortKind = SortKind::Timestamp;

            fn sort_column() -> Self::Column { $entity::Column::CreatedAt }

            fn id_column() -> Self::Column { $entity::Column::Id }
        }

        impl Keyed for $entity::Model {
            fn sort_key(&self) -> SortKey { SortKey::from_timestamp(&self.created_at, self.id) }
        }
    )+};
}

created_at_listing!(user, technician, service, review, bookmark);

impl CursorEntity for service_category::Entity {
    const DEFAULT_SORT: SortSpec = SortSpec::asc();
    const SORT_KIND: SortKind = SortKind::Text;

    fn sort_column() -> Self::Column { service_category::Column::Name }

    fn id_column() -> Self::Column { service_category::Column::Id }
}

impl Keyed for service_category::Model {
    fn sort_key(&self) -> SortKey { SortKey::new(SortValue::Text(self.name.clone()), self.id) }
}
