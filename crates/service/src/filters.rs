//! Listing filters, translated into SeaORM conditions.
//!
//! Text search is a case-insensitive substring match over a fixed set of
//! columns per entity. Empty or whitespace-only search text means no filter.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use models::{bookmark, review, service, service_category, technician, user};

use crate::errors::ServiceError;

/// Lower-cased `%text%` pattern with LIKE metacharacters escaped.
pub fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for ch in text.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn normalize_search(search: Option<String>) -> Option<String> {
    search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn ilike(col: impl IntoColumnRef, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}

/// Any of `cols` containing `search`; `None` when there is nothing to match.
fn text_match<C: IntoColumnRef>(search: Option<&str>, cols: impl IntoIterator<Item = C>) -> Option<Condition> {
    let pattern = like_pattern(search?);
    Some(cols.into_iter().fold(Condition::any(), |cond, col| cond.add(ilike(col, &pattern))))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TechnicianFilter {
    pub search: Option<String>,
    /// Stored upper-case form.
    pub availability: Option<String>,
}

impl TechnicianFilter {
    pub fn new(search: Option<String>, availability: Option<&str>) -> Result<Self, ServiceError> {
        let availability = availability.map(technician::validate_availability).transpose()?;
        Ok(Self { search: normalize_search(search), availability })
    }

    pub fn search_pattern(&self) -> Option<String> { self.search.as_deref().map(like_pattern) }

    pub fn condition(&self) -> Condition {
        let text = text_match(
            self.search.as_deref(),
            [
                (technician::Entity, technician::Column::BusinessName),
                (technician::Entity, technician::Column::Profession),
                (technician::Entity, technician::Column::Bio),
            ],
        );
        Condition::all()
            .add_option(text)
            .add_option(self.availability.clone().map(|a| technician::Column::Availability.eq(a)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceFilter {
    pub search: Option<String>,
    pub technician_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl ServiceFilter {
    pub fn new(search: Option<String>, technician_id: Option<Uuid>, category_id: Option<Uuid>) -> Self {
        Self { search: normalize_search(search), technician_id, category_id }
    }

    pub fn condition(&self) -> Condition {
        let text = text_match(
            self.search.as_deref(),
            [(service::Entity, service::Column::Name), (service::Entity, service::Column::Description)],
        );
        Condition::all()
            .add_option(text)
            .add_option(self.technician_id.map(|id| service::Column::TechnicianId.eq(id)))
            .add_option(self.category_id.map(|id| service::Column::ServiceCategoryId.eq(id)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewFilter {
    pub search: Option<String>,
    pub technician_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ReviewFilter {
    pub fn new(search: Option<String>, technician_id: Option<Uuid>, user_id: Option<Uuid>) -> Self {
        Self { search: normalize_search(search), technician_id, user_id }
    }

    pub fn condition(&self) -> Condition {
        let text = text_match(self.search.as_deref(), [(review::Entity, review::Column::Comment)]);
        Condition::all()
            .add_option(text)
            .add_option(self.technician_id.map(|id| review::Column::TechnicianId.eq(id)))
            .add_option(self.user_id.map(|id| review::Column::UserId.eq(id)))
    }
}

/// Bookmarks are always listed for one user.
#[derive(Clone, Debug, PartialEq)]
pub struct BookmarkFilter {
    pub user_id: Uuid,
    pub technician_id: Option<Uuid>,
}

impl BookmarkFilter {
    pub fn new(user_id: Uuid, technician_id: Option<Uuid>) -> Self { Self { user_id, technician_id } }

    pub fn condition(&self) -> Condition {
        Condition::all()
            .add(bookmark::Column::UserId.eq(self.user_id))
            .add_option(self.technician_id.map(|id| bookmark::Column::TechnicianId.eq(id)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
}

impl UserFilter {
    pub fn new(search: Option<String>) -> Self { Self { search: normalize_search(search) } }

    pub fn condition(&self) -> Condition {
        let text = text_match(
            self.search.as_deref(),
            [
                (user::Entity, user::Column::Email),
                (user::Entity, user::Column::FirstName),
                (user::Entity, user::Column::LastName),
            ],
        );
        Condition::all().add_option(text)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryFilter {
    pub search: Option<String>,
}

impl CategoryFilter {
    pub fn new(search: Option<String>) -> Self { Self { search: normalize_search(search) } }

    pub fn condition(&self) -> Condition {
        let text = text_match(
            self.search.as_deref(),
            [
                (service_category::Entity, service_category::Column::Name),
                (service_category::Entity, service_category::Column::Description),
            ],
        );
        Condition::all().add_option(text)
    }
}
