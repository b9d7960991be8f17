//! Listing parameters: pagination, sorting and post filters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::DomainError;
use crate::viewer::Viewer;

pub const DEFAULT_LIMIT: u64 = 10;

/// Requested page. Always 1-indexed with a positive limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Coerce raw values: page below 1 becomes 1, a missing or non-positive
    /// limit becomes [`DEFAULT_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).map_or(1, |p| p as u64);
        let limit = limit.filter(|l| *l >= 1).map_or(DEFAULT_LIMIT, |l| l as u64);
        Self { page, limit }
    }

    /// Parse from query-string text, ignoring anything that is not a number.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(
            page.and_then(|p| p.trim().parse().ok()),
            limit.and_then(|l| l.trim().parse().ok()),
        )
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice an in-memory result set according to this request.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.iter().skip(start).take(take).cloned().collect()
    }
}

/// Pagination block returned alongside every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        Self {
            total_items,
            total_pages: total_items.div_ceil(request.limit),
            current_page: request.page,
            items_per_page: request.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total_items),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    /// Net score, `likes_count - dislikes_count`.
    #[default]
    Likes,
    Date,
}

impl PostSort {
    /// Unknown keys fall back to [`PostSort::Likes`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("date") => Self::Date,
            _ => Self::Likes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Which posts a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVisibility {
    /// Admin view: every status.
    All,
    /// Non-inactive posts plus the given user's own.
    VisibleTo(i32),
    /// Non-inactive posts only.
    Public,
}

impl PostVisibility {
    /// Resolve the visibility for `viewer`. A non-admin asking for the admin
    /// view silently gets the standard one.
    pub fn for_viewer(viewer: &Viewer, admin_view: bool) -> Self {
        match viewer {
            v if admin_view && v.is_admin() => Self::All,
            Viewer::Member { id, .. } => Self::VisibleTo(*id),
            Viewer::Anonymous => Self::Public,
        }
    }
}

/// Value of the `status` query parameter that requests the admin view.
pub const ADMIN_VIEW: &str = "admin_view";

/// Fully resolved post listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Inclusive-OR match on category ids. Empty means no filter.
    pub categories: Vec<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub visibility: PostVisibility,
    pub sort: PostSort,
    pub order: SortOrder,
    pub page: PageRequest,
}

impl PostQuery {
    pub fn new(visibility: PostVisibility) -> Self {
        Self {
            categories: Vec::new(),
            date_from: None,
            date_to: None,
            visibility,
            sort: PostSort::default(),
            order: SortOrder::default(),
            page: PageRequest::default(),
        }
    }
}

/// Raw listing parameters as they arrive from the query string.
#[derive(Debug, Clone, Default)]
pub struct PostListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    /// Each entry may itself be a comma-separated list.
    pub categories: Vec<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Option<String>,
}

impl PostListParams {
    pub fn wants_admin_view(&self) -> bool {
        self.status.as_deref() == Some(ADMIN_VIEW)
    }

    /// Resolve into a [`PostQuery`] for `viewer`.
    pub fn resolve(&self, viewer: &Viewer) -> Result<PostQuery, DomainError> {
        let visibility = PostVisibility::for_viewer(viewer, self.wants_admin_view());
        Ok(PostQuery {
            categories: parse_category_ids(&self.categories)?,
            date_from: self
                .date_from
                .as_deref()
                .map(|s| parse_date_bound(s, DateBound::Start, "dateFrom"))
                .transpose()?,
            date_to: self
                .date_to
                .as_deref()
                .map(|s| parse_date_bound(s, DateBound::End, "dateTo"))
                .transpose()?,
            visibility,
            sort: PostSort::parse(self.sort_by.as_deref()),
            order: SortOrder::parse(self.order.as_deref()),
            page: PageRequest::parse(self.page.as_deref(), self.limit.as_deref()),
        })
    }
}

/// Parse repeated and/or comma-separated category ids, dropping duplicates.
pub fn parse_category_ids(raw: &[String]) -> Result<Vec<i32>, DomainError> {
    let mut ids = Vec::new();
    for part in raw.iter().flat_map(|r| r.split(',')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: i32 = part
            .parse()
            .map_err(|_| DomainError::validation(format!("Invalid category id '{part}'")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[derive(Debug, Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps verbatim, or a bare `YYYY-MM-DD` which is
/// widened to the start or end of that UTC day so both bounds stay inclusive.
fn parse_date_bound(
    raw: &str,
    bound: DateBound,
    field: &str,
) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid {field} date '{raw}'")))?;
    let at = match bound {
        DateBound::Start => day.and_hms_opt(0, 0, 0),
        DateBound::End => day.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    at.map(|dt| dt.and_utc())
        .ok_or_else(|| DomainError::validation(format!("Invalid {field} date '{raw}'")))
}
