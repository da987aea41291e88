use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{ColumnTrait, QueryFilter};

use crate::entity::{content, entry};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A single restriction on listed entries. Predicates in a query are ANDed.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryPredicate {
    /// Entry name or original filename contains the term (case-insensitive).
    Search(String),
    /// Entry name equals the value (case-insensitive).
    NameEquals(String),
    /// Original filename or media type contains the term (case-insensitive).
    AdvancedSearch(String),
    /// Full media type, or media subtype when given without a `/`.
    FileType(String),
    MinSize(i64),
    MaxSize(i64),
    /// Bounds are inclusive and apply to the content's creation time.
    UploadedAfter(DateTime<Utc>),
    UploadedBefore(DateTime<Utc>),
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn lower<T>(col: T) -> Expr
where
    T: sea_orm::sea_query::IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(col)))
}

fn contains_ci<T>(col: T, term: &str) -> Expr
where
    T: sea_orm::sea_query::IntoColumnRef,
{
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    lower(col).like(LikeExpr::new(pattern).escape('\\'))
}

impl EntryPredicate {
    pub fn condition(&self) -> Condition {
        let entry_name = (entry::Entity, entry::Column::Name);
        let filename = (content::Entity, content::Column::OriginalFilename);
        let file_type = (content::Entity, content::Column::FileType);

        match self {
            Self::Search(term) => Condition::any()
                .add(contains_ci(entry_name, term))
                .add(contains_ci(filename, term)),
            Self::NameEquals(name) => Condition::all().add(lower(entry_name).eq(name.to_lowercase())),
            Self::AdvancedSearch(term) => Condition::any()
                .add(contains_ci(filename, term))
                .add(contains_ci(file_type, term)),
            Self::FileType(kind) => {
                let kind = kind.to_lowercase();
                if kind.contains('/') {
                    Condition::all().add(lower(file_type).eq(kind))
                } else {
                    let pattern = format!("%/{}", escape_like(&kind));
                    Condition::any()
                        .add(lower(file_type).eq(kind))
                        .add(lower(file_type).like(LikeExpr::new(pattern).escape('\\')))
                }
            }
            Self::MinSize(min) => Condition::all().add(content::Column::Size.gte(*min)),
            Self::MaxSize(max) => Condition::all().add(content::Column::Size.lte(*max)),
            Self::UploadedAfter(at) => Condition::all().add(content::Column::CreatedAt.gte(*at)),
            Self::UploadedBefore(at) => Condition::all().add(content::Column::CreatedAt.lte(*at)),
        }
    }
}

/// Predicates plus paging for an entry listing.
#[derive(Clone, Debug)]
pub struct EntryQuery {
    predicates: Vec<EntryPredicate>,
    page: u64,
    page_size: u64,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: EntryPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Page number, clamped to at least 1.
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Ord::max(page, 1);
        self
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn predicates(&self) -> &[EntryPredicate] {
        &self.predicates
    }

    /// Add every predicate to `select` as an AND-ed filter.
    pub fn apply<S: QueryFilter>(&self, select: S) -> S {
        self.predicates
            .iter()
            .fold(select, |select, predicate| select.filter(predicate.condition()))
    }
}
