//! Parameterized SQL plans for the Postgres store.
//!
//! A [`QueryPlan`] is statement text with positional placeholders plus the
//! ordered values bound to them. The text only depends on which optional
//! predicates are active; user input never reaches it.

use hotentry_core::query::{is_word_term, word_pattern};
use hotentry_core::{ListQuery, SortMode, Threshold};
use uuid::Uuid;

/// Columns selected for every entry row.
pub const ENTRY_COLUMNS: &str = "e.id, e.title, e.url, e.excerpt, e.subject, e.search_text, \
     e.count, e.posted_at_us, e.created_at_us, e.updated_at_us";

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Text(String),
    TextArray(Vec<String>),
    Uuid(Uuid),
    UuidArray(Vec<Uuid>),
}

/// Which projection a list plan returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// A single `COUNT(*)` scalar; no ordering or pagination.
    Count,
    /// The requested page of rows.
    Rows,
    /// The requested page with `total_count` computed by a window function.
    RowsWithTotal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// Accumulates bound values and hands out their placeholders.
#[derive(Debug, Default)]
struct Params {
    args: Vec<Arg>,
}

impl Params {
    fn bind(&mut self, arg: Arg) -> String {
        self.args.push(arg);
        format!("${}", self.args.len())
    }
}

/// Compiles normalized list queries into [`QueryPlan`]s.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    candidate_ceiling: i64,
}

impl PlanBuilder {
    pub fn new(candidate_ceiling: i64) -> Self {
        Self {
            candidate_ceiling: candidate_ceiling.max(1),
        }
    }

    pub fn candidate_ceiling(&self) -> i64 {
        self.candidate_ceiling
    }

    /// Builds the list plan for `query`.
    ///
    /// Queries with keyword terms take the two-stage path: a substring
    /// prefilter capped at the candidate ceiling, then a whole-word
    /// refinement over those candidates only.
    pub fn list(&self, query: &ListQuery, mode: PlanMode) -> QueryPlan {
        if query.has_keyword() {
            self.keyword_plan(query, mode)
        } else {
            self.filter_plan(query, mode)
        }
    }

    fn filter_plan(&self, query: &ListQuery, mode: PlanMode) -> QueryPlan {
        let mut params = Params::default();
        let predicates = filter_predicates(query, &mut params);

        let mut sql = match mode {
            PlanMode::Count => "SELECT COUNT(*) FROM entries e".to_string(),
            PlanMode::Rows => format!("SELECT {ENTRY_COLUMNS} FROM entries e"),
            PlanMode::RowsWithTotal => format!(
                "SELECT {ENTRY_COLUMNS}, COUNT(*) OVER () AS total_count FROM entries e"
            ),
        };
        sql.push_str(&where_clause(&predicates));

        if mode != PlanMode::Count {
            push_page(&mut sql, query, &mut params);
        }

        QueryPlan {
            sql,
            args: params.args,
        }
    }

    fn keyword_plan(&self, query: &ListQuery, mode: PlanMode) -> QueryPlan {
        let mut params = Params::default();
        let terms = query.terms();

        // Stage A: structural filters plus case-insensitive substring tests.
        let mut candidate_predicates = filter_predicates(query, &mut params);
        for term in &terms {
            let placeholder = params.bind(Arg::Text((*term).to_string()));
            candidate_predicates.push(format!(
                "strpos(lower(e.search_text), lower({placeholder})) > 0"
            ));
        }
        let ceiling = params.bind(Arg::Int(self.candidate_ceiling));

        let mut sql = String::from("WITH candidates AS (SELECT e.id FROM entries e");
        sql.push_str(&where_clause(&candidate_predicates));
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by(query.sort));
        sql.push_str(" LIMIT ");
        sql.push_str(&ceiling);
        sql.push_str(") ");

        // Stage B: whole-word check for ASCII alphanumeric terms.
        let mut refine_predicates = Vec::new();
        for term in terms.iter().filter(|term| is_word_term(term)) {
            let placeholder = params.bind(Arg::Text(word_pattern(term)));
            refine_predicates.push(format!("e.search_text ~* {placeholder}"));
        }

        match mode {
            PlanMode::Count => sql.push_str("SELECT COUNT(*)"),
            PlanMode::Rows => {
                sql.push_str("SELECT ");
                sql.push_str(ENTRY_COLUMNS);
            }
            PlanMode::RowsWithTotal => {
                sql.push_str("SELECT ");
                sql.push_str(ENTRY_COLUMNS);
                sql.push_str(", COUNT(*) OVER () AS total_count");
            }
        }
        sql.push_str(" FROM entries e JOIN candidates c ON c.id = e.id");
        sql.push_str(&where_clause(&refine_predicates));

        if mode != PlanMode::Count {
            push_page(&mut sql, query, &mut params);
        }

        QueryPlan {
            sql,
            args: params.args,
        }
    }
}

fn filter_predicates(query: &ListQuery, params: &mut Params) -> Vec<String> {
    let mut predicates = Vec::new();

    if query.min_count > 0 {
        let placeholder = params.bind(Arg::Int(query.min_count));
        predicates.push(format!("e.count >= {placeholder}"));
    }

    if !query.tags.is_empty() {
        let placeholder = params.bind(Arg::TextArray(query.tags.clone()));
        predicates.push(format!(
            "EXISTS (SELECT 1 FROM taggings tg JOIN tags t ON t.id = tg.tag_id \
             WHERE tg.entry_id = e.id AND t.name = ANY({placeholder}))"
        ));
    }

    if let Some(from) = query.from {
        let placeholder = params.bind(Arg::Int(from.as_microsecond()));
        predicates.push(format!("e.posted_at_us >= {placeholder}"));
    }

    if let Some(to) = query.to {
        let placeholder = params.bind(Arg::Int(to.as_microsecond()));
        predicates.push(format!("e.posted_at_us < {placeholder}"));
    }

    predicates
}

fn where_clause(predicates: &[String]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

fn order_by(sort: SortMode) -> &'static str {
    match sort {
        SortMode::Hot => "e.count DESC, e.posted_at_us DESC, e.id DESC",
        SortMode::Recent => "e.posted_at_us DESC, e.id DESC",
    }
}

fn push_page(sql: &mut String, query: &ListQuery, params: &mut Params) {
    let limit = params.bind(Arg::Int(query.limit));
    let offset = params.bind(Arg::Int(query.offset));
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by(query.sort));
    sql.push_str(" LIMIT ");
    sql.push_str(&limit);
    sql.push_str(" OFFSET ");
    sql.push_str(&offset);
}

/// Taggings of a batch of entries, highest score first within each entry.
pub fn taggings(ids: &[Uuid]) -> QueryPlan {
    QueryPlan {
        sql: "SELECT tg.entry_id, tg.tag_id, t.name AS tag_name, tg.score \
              FROM taggings tg JOIN tags t ON t.id = tg.tag_id \
              WHERE tg.entry_id = ANY($1) \
              ORDER BY tg.entry_id, tg.score DESC, t.name"
            .to_string(),
        args: vec![Arg::UuidArray(ids.to_vec())],
    }
}

/// Per-day counts in `zone` (an IANA name), newest day first.
pub fn archive_counts(threshold: Threshold, zone: &str) -> QueryPlan {
    QueryPlan {
        sql: "SELECT to_char((to_timestamp(e.posted_at_us / 1000000.0) AT TIME ZONE $2)::date, \
              'YYYY-MM-DD') AS day, COUNT(*) AS count \
              FROM entries e WHERE e.count >= $1 \
              GROUP BY day ORDER BY day DESC"
            .to_string(),
        args: vec![Arg::Int(threshold.get()), Arg::Text(zone.to_string())],
    }
}

pub fn entry_by_id(id: Uuid) -> QueryPlan {
    QueryPlan {
        sql: format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = $1"),
        args: vec![Arg::Uuid(id)],
    }
}

pub fn popular_tags(limit: i64) -> QueryPlan {
    QueryPlan {
        sql: "SELECT t.name, COUNT(*) AS count \
              FROM taggings tg JOIN tags t ON t.id = tg.tag_id \
              GROUP BY t.name ORDER BY count DESC, t.name LIMIT $1"
            .to_string(),
        args: vec![Arg::Int(limit)],
    }
}
