//! Public feed filtering, ordering and pagination.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::recipes::repo::RECIPE_COLUMNS;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Newest,
    Popular,
    Trending,
}

impl SortBy {
    pub fn order_clause(self) -> &'static str {
        match self {
            SortBy::Newest => " ORDER BY created_at DESC",
            SortBy::Popular => " ORDER BY likes DESC, views DESC",
            SortBy::Trending => " ORDER BY likes DESC, created_at DESC",
        }
    }
}

/// Raw query string of `GET /recipes/public/feed`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub sort_by: Option<SortBy>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalized feed query: blanks dropped, page and limit clamped to >= 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub sort_by: SortBy,
    pub page: i64,
    pub limit: i64,
}

impl From<FeedQuery> for FeedFilter {
    fn from(q: FeedQuery) -> Self {
        Self {
            category: non_blank(q.category),
            difficulty: non_blank(q.difficulty),
            search: non_blank(q.search),
            tag: non_blank(q.tag),
            sort_by: q.sort_by.unwrap_or_default(),
            page: q.page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: q.limit.unwrap_or(DEFAULT_LIMIT).max(1),
        }
    }
}

impl FeedFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `SELECT` of one page of matching public recipes.
    pub fn page_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes"));
        self.push_conditions(&mut qb);
        qb.push(self.sort_by.order_clause());
        qb.push(" LIMIT ").push_bind(self.limit);
        qb.push(" OFFSET ").push_bind(self.offset());
        qb
    }

    /// `SELECT COUNT(*)` over the same conditions, ignoring pagination.
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM recipes");
        self.push_conditions(&mut qb);
        qb
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE is_public = TRUE");
        if let Some(category) = &self.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(difficulty) = &self.difficulty {
            qb.push(" AND difficulty = ").push_bind(difficulty.clone());
        }
        if let Some(tag) = &self.tag {
            // exact tag membership, unlike `search`
            qb.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
        }
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS ing WHERE ing->>'name' ILIKE ")
                .push_bind(pattern.clone())
                .push(") OR EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE t ILIKE ")
                .push_bind(pattern)
                .push("))");
        }
    }
}

/// `ceil(total / limit)`; zero matches means zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    total / limit + i64::from(total % limit != 0)
}

/// Substring pattern for `ILIKE` with `%`, `_` and `\` taken literally.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
