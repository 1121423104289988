//! Cursor and offset pagination over any [`RecordSource`](crate::source::RecordSource).

pub mod cursor;
pub mod executor;

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use configs::PaginationConfig;

use crate::errors::ServiceError;

pub use cursor::Cursor;
pub use executor::PaginatedQueryExecutor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Primary sort field value carried inside a cursor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum SortValue {
    /// Microseconds since the unix epoch, UTC.
    Timestamp(i64),
    Integer(i64),
    Text(String),
}

impl SortValue {
    pub fn kind(&self) -> SortKind {
        match self {
            SortValue::Timestamp(_) => SortKind::Timestamp,
            SortValue::Integer(_) => SortKind::Integer,
            SortValue::Text(_) => SortKind::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKind {
    Timestamp,
    Integer,
    Text,
}

/// Primary value plus id tiebreak; a total order over a collection.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SortKey {
    pub primary: SortValue,
    pub id: Uuid,
}

impl SortKey {
    pub fn new(primary: SortValue, id: Uuid) -> Self { Self { primary, id } }

    pub fn from_timestamp(ts: &DateTime<FixedOffset>, id: Uuid) -> Self {
        Self::new(SortValue::Timestamp(ts.timestamp_micros()), id)
    }

    /// Ordering of `self` relative to `other` when listed in `direction`.
    pub fn cmp_in(&self, other: &Self, direction: SortDirection) -> Ordering {
        match direction {
            SortDirection::Asc => self.cmp(other),
            SortDirection::Desc => other.cmp(self),
        }
    }
}

/// Sort applied by a listing. The field is fixed per source; only the
/// direction varies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn asc() -> Self { Self { direction: SortDirection::Asc } }
    pub const fn desc() -> Self { Self { direction: SortDirection::Desc } }
}

/// Records that can report their own position in a listing.
pub trait Keyed {
    fn sort_key(&self) -> SortKey;
}

#[derive(Clone, Debug)]
pub struct PageRequest<F> {
    pub cursor: Option<Cursor>,
    /// `None` means the configured default.
    pub limit: Option<i64>,
    pub filter: F,
}

impl<F> PageRequest<F> {
    pub fn first(filter: F, limit: Option<i64>) -> Self { Self { cursor: None, limit, filter } }

    pub fn after(cursor: Cursor, filter: F, limit: Option<i64>) -> Self {
        Self { cursor: Some(cursor), limit, filter }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_next_page: bool,
    pub next_cursor: Option<Cursor>,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            has_next_page: self.has_next_page,
            next_cursor: self.next_cursor,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OffsetPageRequest<F> {
    pub skip: i64,
    /// `None` means the configured default.
    pub take: Option<i64>,
    pub filter: F,
}

impl<F> OffsetPageRequest<F> {
    pub fn new(skip: i64, take: Option<i64>, filter: F) -> Self { Self { skip, take, filter } }

    /// Translate a 1-based page number. Page 0 is read as page 1.
    pub fn from_page(page: u32, page_size: Option<i64>, filter: F, limits: PageLimits) -> Self {
        let page = if page == 0 { 1 } else { page };
        let size = page_size.unwrap_or(limits.default_limit as i64).max(0);
        let skip = i64::from(page - 1).saturating_mul(size);
        Self { skip, take: page_size, filter }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OffsetPageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_next_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_skip: Option<u64>,
}

impl<T> OffsetPageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> OffsetPageResult<U> {
        OffsetPageResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            has_next_page: self.has_next_page,
            next_skip: self.next_skip,
        }
    }
}

/// Default and ceiling for page sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PageLimits {
    fn default() -> Self { Self { default_limit: 10, max_limit: 100 } }
}

impl From<PaginationConfig> for PageLimits {
    fn from(cfg: PaginationConfig) -> Self {
        Self { default_limit: cfg.default_limit, max_limit: cfg.max_limit }
    }
}

impl PageLimits {
    /// Resolve a requested size against the default and ceiling.
    pub fn resolve(&self, requested: Option<i64>) -> Result<u64, ServiceError> {
        let Some(n) = requested else { return Ok(self.default_limit) };
        if n <= 0 {
            return Err(ServiceError::InvalidLimit(format!("limit must be positive, got {n}")));
        }
        let n = n as u64;
        if n > self.max_limit {
            return Err(ServiceError::InvalidLimit(format!("limit {n} exceeds maximum {}", self.max_limit)));
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults_and_bounds() {
        let limits = PageLimits::default();
        assert_eq!(limits.resolve(None).unwrap(), 10);
        assert_eq!(limits.resolve(Some(100)).unwrap(), 100);
        assert!(matches!(limits.resolve(Some(0)), Err(ServiceError::InvalidLimit(_))));
        assert!(matches!(limits.resolve(Some(-3)), Err(ServiceError::InvalidLimit(_))));
        assert!(matches!(limits.resolve(Some(101)), Err(ServiceError::InvalidLimit(_))));
    }

    #[test]
    fn from_page_treats_zero_as_first() {
        let limits = PageLimits::default();
        let req = OffsetPageRequest::from_page(0, Some(20), (), limits);
        assert_eq!((req.skip, req.take), (0, Some(20)));
        let req = OffsetPageRequest::from_page(5, None, (), limits);
        assert_eq!((req.skip, req.take), (40, None));
    }

    #[test]
    fn desc_order_reverses_keys() {
        let id = Uuid::nil();
        let older = SortKey::new(SortValue::Timestamp(1), id);
        let newer = SortKey::new(SortValue::Timestamp(2), id);
        assert_eq!(newer.cmp_in(&older, SortDirection::Desc), Ordering::Less);
        assert_eq!(newer.cmp_in(&older, SortDirection::Asc), Ordering::Greater);
    }

    #[test]
    fn equal_primary_breaks_tie_on_id() {
        let a = SortKey::new(SortValue::Integer(7), Uuid::from_u128(1));
        let b = SortKey::new(SortValue::Integer(7), Uuid::from_u128(2));
        assert!(a < b);
    }

    #[test]
    fn offset_page_omits_absent_next_skip() {
        let page: OffsetPageResult<u8> =
            OffsetPageResult { items: vec![], total_count: 0, has_next_page: false, next_skip: None };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("next_skip").is_none());
    }
}
