use std::sync::Arc;

use tracing::{debug, instrument};

use super::{Cursor, Keyed, OffsetPageRequest, OffsetPageResult, PageLimits, PageRequest, PageResult, SortSpec};
use crate::errors::ServiceError;
use crate::source::RecordSource;

/// Listing engine shared by every entity endpoint.
///
/// Fetch and count are independent reads issued concurrently; the page's
/// `total_count` may therefore lag `items` under concurrent writes.
pub struct PaginatedQueryExecutor<S> {
    source: Arc<S>,
    sort: SortSpec,
    limits: PageLimits,
}

impl<S> Clone for PaginatedQueryExecutor<S> {
    fn clone(&self) -> Self { Self { source: self.source.clone(), sort: self.sort, limits: self.limits } }
}

impl<S: RecordSource> PaginatedQueryExecutor<S> {
    pub fn new(source: Arc<S>, limits: PageLimits) -> Self {
        let sort = source.sort_spec();
        Self { source, sort, limits }
    }

    pub fn source(&self) -> &Arc<S> { &self.source }

    pub fn limits(&self) -> PageLimits { self.limits }

    /// Cursor-mode page. A cursor whose record has since been deleted still
    /// resumes at the next record after its key.
    #[instrument(skip_all, fields(limit = ?req.limit, has_cursor = req.cursor.is_some()))]
    pub async fn list_page(&self, req: &PageRequest<S::Filter>) -> Result<PageResult<S::Record>, ServiceError> {
        let limit = self.limits.resolve(req.limit)?;
        let start_after = req.cursor.as_ref().map(Cursor::decode).transpose()?;

        let (mut items, total_count) = tokio::try_join!(
            self.source.fetch_ordered(&req.filter, self.sort, start_after.as_ref(), limit + 1),
            self.source.count(&req.filter),
        )?;

        let has_next_page = items.len() as u64 > limit;
        items.truncate(limit as usize);
        let next_cursor = if has_next_page {
            items.last().map(|last| Cursor::encode(&last.sort_key()))
        } else {
            None
        };
        debug!(returned = items.len(), total_count, has_next_page, "page fetched");
        Ok(PageResult { items, total_count, has_next_page, next_cursor })
    }

    /// Offset-mode page. Pages can shift under concurrent inserts.
    #[instrument(skip_all, fields(skip = req.skip, take = ?req.take))]
    pub async fn list_page_offset(
        &self,
        req: &OffsetPageRequest<S::Filter>,
    ) -> Result<OffsetPageResult<S::Record>, ServiceError> {
        if req.skip < 0 {
            return Err(ServiceError::InvalidLimit(format!("skip must not be negative, got {}", req.skip)));
        }
        let take = self.limits.resolve(req.take)?;
        let skip = req.skip as u64;

        let (items, total_count) = tokio::try_join!(
            self.source.fetch_offset(&req.filter, self.sort, skip, take),
            self.source.count(&req.filter),
        )?;

        let end = skip.saturating_add(take);
        let has_next_page = end < total_count;
        let next_skip = has_next_page.then_some(end);
        debug!(returned = items.len(), total_count, has_next_page, "offset page fetched");
        Ok(OffsetPageResult { items, total_count, has_next_page, next_skip })
    }
}
