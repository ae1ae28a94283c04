//! Page-at-a-time fetching.
//!
//! # Design Decisions
//! - The page fetch and the total count are two separate statements with
//!   no transaction around them; rows may change in between
//! - A requested page past the last page is reported as page 1 but the
//!   (empty) page that was actually fetched is returned as is

use serde::Serialize;

use crate::query::builder::Query;
use crate::query::connection::{Connection, Row};
use crate::query::error::QueryResult;
use crate::query::value::{raw, Column};

/// One page of results plus the numbers needed to render page links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginator {
    pub results: Vec<Row>,
    pub total: u64,
    pub per_page: u64,
    pub page: u64,
    pub last_page: u64,
}

impl Paginator {
    pub fn new(results: Vec<Row>, total: u64, per_page: u64, page: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let page = if page > last_page { 1 } else { page.max(1) };
        Self {
            results,
            total,
            per_page,
            page,
            last_page,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.last_page
    }
}

impl Query {
    /// Fetch `page` (1-based) of `per_page` rows and count the total.
    ///
    /// `columns` apply only when no explicit select was set. On grammars
    /// with a found-rows marker the total is read back from the server;
    /// otherwise a `COUNT(*)` runs with ordering and paging removed.
    pub fn paginate<C: Into<Column>>(
        &mut self,
        conn: &Connection,
        per_page: u64,
        columns: impl IntoIterator<Item = C>,
        page: u64,
    ) -> QueryResult<Paginator> {
        let grammar = conn.grammar();
        let per_page = per_page.max(1);
        let page = page.max(1);

        let mut columns: Vec<Column> = match self.projection.columns.take() {
            Some(selected) => selected,
            None => columns.into_iter().map(Into::into).collect(),
        };
        if let (Some(marker), Some(first)) = (grammar.found_rows_marker(), columns.first_mut()) {
            *first = Column::Raw(raw(format!("{} {}", marker, grammar.wrap(first))));
        }

        self.projection.columns = Some(columns);
        self.offset = Some((page - 1).saturating_mul(per_page));
        self.limit = Some(per_page);
        let results = self.get(conn)?;

        let total = match grammar.found_rows_query() {
            Some(sql) => conn.only(sql, &[])?.as_i64().unwrap_or(0).max(0) as u64,
            None => self.count_unpaged(conn)?,
        };

        tracing::debug!(
            table = ?self.table,
            page,
            per_page,
            total,
            "Paginated query"
        );

        Ok(Paginator::new(results, total, per_page, page))
    }

    /// `COUNT(*)` over the where-state with ordering, limit and offset
    /// lifted for the duration of the call.
    fn count_unpaged(&mut self, conn: &Connection) -> QueryResult<u64> {
        let orderings = std::mem::take(&mut self.orderings);
        let limit = self.limit.take();
        let offset = self.offset.take();

        let total = self.count(conn);

        self.orderings = orderings;
        self.limit = limit;
        self.offset = offset;
        total
    }
}
