//! Dashboard-side shaping of a merged list: search, status and owner filters,
//! ordering, stats and pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::UnparseableOwnerFilter;
use crate::models::Todo;

pub const DEFAULT_PER_PAGE: usize = 20;
const MAX_VISIBLE_PAGES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter {
    Any,
    Exactly(i64),
    Nothing,
}

impl OwnerFilter {
    /// Empty input means no filter. Anything that is not a whole number is
    /// resolved by `policy`.
    pub fn parse(raw: &str, policy: UnparseableOwnerFilter) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return OwnerFilter::Any;
        }
        match raw.parse::<i64>() {
            Ok(user_id) => OwnerFilter::Exactly(user_id),
            Err(_) => match policy {
                UnparseableOwnerFilter::MatchNothing => OwnerFilter::Nothing,
                UnparseableOwnerFilter::NoFilter => OwnerFilter::Any,
            },
        }
    }

    fn accepts(&self, todo: &Todo) -> bool {
        match self {
            OwnerFilter::Any => true,
            OwnerFilter::Exactly(user_id) => todo.user_id == *user_id,
            OwnerFilter::Nothing => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoFilter {
    pub search: String,
    pub status: StatusFilter,
    pub owner: OwnerFilter,
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            owner: OwnerFilter::Any,
        }
    }
}

impl TodoFilter {
    pub fn accepts(&self, todo: &Todo) -> bool {
        let search = self.search.trim();
        if !search.is_empty() && !todo.todo.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => todo.completed,
            StatusFilter::Pending => !todo.completed,
        };
        status_ok && self.owner.accepts(todo)
    }

    pub fn apply(&self, todos: Vec<Todo>) -> Vec<Todo> {
        todos.into_iter().filter(|t| self.accepts(t)).collect()
    }
}

/// Records with a readable creation time first, newest first. Then records
/// whose creation time does not parse, by raw text descending. The rest by id,
/// highest first.
pub fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(|a, b| match (created_key(a), created_key(b)) {
        (CreatedKey::Time(a_time), CreatedKey::Time(b_time)) => b_time.cmp(&a_time),
        (CreatedKey::Raw(a_raw), CreatedKey::Raw(b_raw)) => b_raw.cmp(a_raw),
        (CreatedKey::Missing, CreatedKey::Missing) => b.id.cmp(&a.id),
        (a_key, b_key) => a_key.tier().cmp(&b_key.tier()),
    });
}

enum CreatedKey<'a> {
    Time(DateTime<Utc>),
    Raw(&'a str),
    Missing,
}

impl CreatedKey<'_> {
    fn tier(&self) -> u8 {
        match self {
            CreatedKey::Time(_) => 0,
            CreatedKey::Raw(_) => 1,
            CreatedKey::Missing => 2,
        }
    }
}

fn created_key(todo: &Todo) -> CreatedKey<'_> {
    match todo.created_at.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => CreatedKey::Time(dt.with_timezone(&Utc)),
            Err(_) => CreatedKey::Raw(raw),
        },
        None => CreatedKey::Missing,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TodoStats {
    pub fn of(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|t| t.completed).count();
        Self {
            total: todos.len(),
            completed,
            pending: todos.len() - completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(page) => serializer.serialize_u64(*page as u64),
            PageMarker::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub pages: Vec<PageMarker>,
}

/// 1-based. A page past the end clamps to the last page; zero sizes fall back to defaults.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    let slice = if start < items.len() { items[start..end].to_vec() } else { Vec::new() };

    Page {
        items: slice,
        page,
        per_page,
        total_items: items.len(),
        total_pages,
        pages: page_markers(page, total_pages),
    }
}

pub fn page_markers(current: usize, total_pages: usize) -> Vec<PageMarker> {
    use PageMarker::{Ellipsis, Page};

    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(Page).collect();
    }

    let mut pages = Vec::with_capacity(7);
    if current <= 3 {
        pages.extend((1..=4).map(Page));
        pages.push(Ellipsis);
        pages.push(Page(total_pages));
    } else if current >= total_pages - 2 {
        pages.push(Page(1));
        pages.push(Ellipsis);
        pages.extend((total_pages - 3..=total_pages).map(Page));
    } else {
        pages.push(Page(1));
        pages.push(Ellipsis);
        pages.extend((current - 1..=current + 1).map(Page));
        pages.push(Ellipsis);
        pages.push(Page(total_pages));
    }
    pages
}
