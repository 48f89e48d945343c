//! Query shaping over untrusted request parameters
//!
//! Listing endpoints hand their raw key-value parameters to [`QuerySpec`],
//! which turns them into SQL fragments plus an ordered bind list. Each
//! shaping step consumes the spec and returns a new one, so partially
//! shaped specs can be reused freely. The helper carries no business
//! rules; every column it will touch comes from a caller-supplied
//! whitelist.

use std::collections::HashMap;

/// Parameter keys with shaping meaning, never treated as filters
const RESERVED_KEYS: [&str; 5] = ["page", "sort", "limit", "fields", "search"];

const DEFAULT_PAGE_SIZE: i64 = 10;
const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

/// SQL type a whitelisted column binds as; text parameters are cast
/// accordingly in the generated placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Bool,
    Timestamp,
}

/// A column untrusted parameters are allowed to touch
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

pub const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Op {
    fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gte => ">=",
            Op::Gt => ">",
            Op::Lte => "<=",
            Op::Lt => "<",
        }
    }
}

#[derive(Debug, Clone)]
struct FilterClause {
    column: &'static str,
    kind: ColumnKind,
    op: Op,
    value: String,
}

#[derive(Debug, Clone)]
struct SearchClause {
    fields: Vec<&'static str>,
    pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDir {
    Asc,
    Desc,
}

/// Rendered fragments ready for a repository to splice into its statement.
/// `where_sql` omits the WHERE keyword and is empty when nothing filters;
/// `binds` are the text parameters in placeholder order.
#[derive(Debug, Clone)]
pub struct QueryClauses {
    pub where_sql: String,
    pub binds: Vec<String>,
    pub order_sql: String,
    pub select_list: String,
    pub limit: i64,
    pub offset: i64,
}

/// Immutable query specification built from untrusted parameters
#[derive(Debug, Clone)]
pub struct QuerySpec {
    columns: &'static [Column],
    search_fields: Vec<&'static str>,
    filters: Vec<FilterClause>,
    search: Option<SearchClause>,
    sort: Vec<(&'static str, SortDir)>,
    fields: Option<Vec<&'static str>>,
    page: i64,
    limit: i64,
    max_limit: i64,
}

impl QuerySpec {
    pub fn new(columns: &'static [Column]) -> Self {
        let search_fields = ["title", "description"]
            .into_iter()
            .filter(|f| columns.iter().any(|c| c.name == *f))
            .collect();

        Self {
            columns,
            search_fields,
            filters: Vec::new(),
            search: None,
            sort: Vec::new(),
            fields: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            max_limit: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Override the text columns a `search` term matches against
    pub fn with_search_fields(mut self, fields: &[&'static str]) -> Self {
        self.search_fields = fields
            .iter()
            .copied()
            .filter(|f| self.lookup(f).is_some())
            .collect();
        self
    }

    /// Override pagination defaults from configuration
    pub fn with_page_size(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Apply all shaping steps in the canonical order
    pub fn shape(self, params: &HashMap<String, String>) -> Self {
        self.filter(params)
            .search(params)
            .sort(params)
            .limit_fields(params)
            .paginate(params)
    }

    /// Pass-through filters: every non-reserved key naming a whitelisted
    /// column becomes an equality clause; `_gte`/`_gt`/`_lte`/`_lt`
    /// suffixes become comparison operators. Unknown keys are dropped.
    pub fn filter(mut self, params: &HashMap<String, String>) -> Self {
        // Sort keys so the generated SQL is deterministic
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for key in keys {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            let (name, op) = split_operator(key);
            if let Some(column) = self.lookup(name) {
                self.filters.push(FilterClause {
                    column: column.name,
                    kind: column.kind,
                    op,
                    value: params[key].clone(),
                });
            }
        }

        self
    }

    /// Case-insensitive OR-match of an escaped search term across the
    /// configured text fields
    pub fn search(mut self, params: &HashMap<String, String>) -> Self {
        if let Some(term) = params.get("search") {
            let term = term.trim();
            if !term.is_empty() && !self.search_fields.is_empty() {
                self.search = Some(SearchClause {
                    fields: self.search_fields.clone(),
                    pattern: regex::escape(term),
                });
            }
        }
        self
    }

    /// Comma-separated sort list with `-` prefix for descending;
    /// defaults to newest-first
    pub fn sort(mut self, params: &HashMap<String, String>) -> Self {
        if let Some(raw) = params.get("sort") {
            for token in raw.split(',') {
                let token = token.trim();
                let (name, dir) = match token.strip_prefix('-') {
                    Some(rest) => (rest, SortDir::Desc),
                    None => (token, SortDir::Asc),
                };
                if let Some(column) = self.lookup(name) {
                    self.sort.push((column.name, dir));
                }
            }
        }
        self
    }

    /// Comma-separated projection list; defaults to all columns
    pub fn limit_fields(mut self, params: &HashMap<String, String>) -> Self {
        if let Some(raw) = params.get("fields") {
            let fields: Vec<&'static str> = raw
                .split(',')
                .filter_map(|f| self.lookup(f.trim()).map(|c| c.name))
                .collect();
            if !fields.is_empty() {
                self.fields = Some(fields);
            }
        }
        self
    }

    /// 1-based page and page size, clamped to the configured maximum
    pub fn paginate(mut self, params: &HashMap<String, String>) -> Self {
        if let Some(page) = params.get("page").and_then(|p| p.parse::<i64>().ok()) {
            if page >= 1 {
                self.page = page;
            }
        }
        if let Some(limit) = params.get("limit").and_then(|l| l.parse::<i64>().ok()) {
            if limit >= 1 {
                self.limit = limit.min(self.max_limit);
            }
        }
        self
    }

    /// Render fragments for a SELECT; `first_bind` is the placeholder
    /// number the caller's own scope parameters end just before.
    pub fn clauses(&self, first_bind: usize) -> QueryClauses {
        let mut parts: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();
        let mut next = first_bind;

        for clause in &self.filters {
            parts.push(format!(
                "{} {} {}",
                clause.column,
                clause.op.sql(),
                placeholder(next, clause.kind)
            ));
            binds.push(clause.value.clone());
            next += 1;
        }

        if let Some(search) = &self.search {
            let alternatives: Vec<String> = search
                .fields
                .iter()
                .map(|f| format!("{} ~* ${}", f, next))
                .collect();
            parts.push(format!("({})", alternatives.join(" OR ")));
            binds.push(search.pattern.clone());
            next += 1;
        }

        let order_sql = if self.sort.is_empty() {
            "created_at DESC".to_string()
        } else {
            self.sort
                .iter()
                .map(|(name, dir)| match dir {
                    SortDir::Asc => format!("{} ASC", name),
                    SortDir::Desc => format!("{} DESC", name),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let select_list = match &self.fields {
            Some(fields) => fields.join(", "),
            None => "*".to_string(),
        };

        QueryClauses {
            where_sql: parts.join(" AND "),
            binds,
            order_sql,
            select_list,
            limit: self.limit,
            // page is untrusted and unbounded; saturate instead of overflowing
            offset: (self.page - 1).saturating_mul(self.limit),
        }
    }

    /// Full SELECT statement over a single table
    pub fn select_sql(&self, table: &str) -> (String, Vec<String>) {
        let clauses = self.clauses(1);
        let mut sql = format!("SELECT {} FROM {}", clauses.select_list, table);
        if !clauses.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.where_sql);
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            clauses.order_sql, clauses.limit, clauses.offset
        ));
        (sql, clauses.binds)
    }

    /// COUNT statement re-running filter and search without pagination,
    /// so totals stay accurate
    pub fn count_sql(&self, table: &str) -> (String, Vec<String>) {
        let clauses = self.clauses(1);
        let mut sql = format!("SELECT COUNT(*) FROM {}", table);
        if !clauses.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.where_sql);
        }
        (sql, clauses.binds)
    }

    fn lookup(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn placeholder(index: usize, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::Text => format!("${}", index),
        ColumnKind::Int => format!("${}::bigint", index),
        ColumnKind::Bool => format!("${}::boolean", index),
        ColumnKind::Timestamp => format!("${}::timestamptz", index),
    }
}

/// Strip a trailing comparison token from a parameter key. Longer
/// suffixes are checked first so `_gte` is never read as `_gt`.
fn split_operator(key: &str) -> (&str, Op) {
    for (suffix, op) in [
        ("_gte", Op::Gte),
        ("_lte", Op::Lte),
        ("_gt", Op::Gt),
        ("_lt", Op::Lt),
    ] {
        if let Some(name) = key.strip_suffix(suffix) {
            return (name, op);
        }
    }
    (key, Op::Eq)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        col("title", ColumnKind::Text),
        col("description", ColumnKind::Text),
        col("status", ColumnKind::Text),
        col("event_id", ColumnKind::Int),
        col("created_at", ColumnKind::Timestamp),
        col("is_free", ColumnKind::Bool),
    ];

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let (sql, binds) = QuerySpec::new(COLUMNS).select_sql("applications");
        assert_eq!(
            sql,
            "SELECT * FROM applications ORDER BY created_at DESC LIMIT 10 OFFSET 0"
        );
        assert!(binds.is_empty());
    }

    #[test]
    fn test_equality_filter() {
        let spec = QuerySpec::new(COLUMNS).filter(&params(&[("status", "pending")]));
        let (sql, binds) = spec.select_sql("applications");
        assert!(sql.contains("WHERE status = $1"));
        assert_eq!(binds, vec!["pending".to_string()]);
    }

    #[test]
    fn test_suffix_operators_and_casts() {
        let spec = QuerySpec::new(COLUMNS).filter(&params(&[
            ("event_id", "42"),
            ("created_at_gte", "2026-01-01T00:00:00Z"),
        ]));
        let (sql, binds) = spec.select_sql("applications");
        assert!(sql.contains("created_at >= $1::timestamptz"));
        assert!(sql.contains("event_id = $2::bigint"));
        assert_eq!(binds.len(), 2);
        // Keys are sorted, so created_at_gte binds first
        assert_eq!(binds[0], "2026-01-01T00:00:00Z");
        assert_eq!(binds[1], "42");
    }

    #[test]
    fn test_gte_not_read_as_gt() {
        let spec = QuerySpec::new(COLUMNS).filter(&params(&[("event_id_gte", "10")]));
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains("event_id >= $1::bigint"));
    }

    #[test]
    fn test_reserved_and_unknown_keys_dropped() {
        let spec = QuerySpec::new(COLUMNS).filter(&params(&[
            ("page", "3"),
            ("limit", "50"),
            ("sort", "-created_at"),
            ("fields", "title"),
            ("search", "rust"),
            ("no_such_column", "x"),
            ("status; DROP TABLE users", "x"),
        ]));
        let (sql, binds) = spec.select_sql("applications");
        assert!(!sql.contains("WHERE"));
        assert!(binds.is_empty());
    }

    #[test]
    fn test_search_escapes_metacharacters() {
        let spec = QuerySpec::new(COLUMNS).search(&params(&[("search", "c++ (v2)")]));
        let (sql, binds) = spec.select_sql("events");
        assert!(sql.contains("(title ~* $1 OR description ~* $1)"));
        assert_eq!(binds, vec![regex::escape("c++ (v2)")]);
    }

    #[test]
    fn test_search_fields_override() {
        let spec = QuerySpec::new(COLUMNS)
            .with_search_fields(&["title"])
            .search(&params(&[("search", "expo")]));
        let (sql, _) = spec.select_sql("events");
        assert!(sql.contains("(title ~* $1)"));
        assert!(!sql.contains("description ~*"));
    }

    #[test]
    fn test_sort_parsing() {
        let spec = QuerySpec::new(COLUMNS).sort(&params(&[("sort", "status,-created_at,bogus")]));
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains("ORDER BY status ASC, created_at DESC"));
        assert!(!sql.contains("bogus"));
    }

    #[test]
    fn test_field_projection() {
        let spec =
            QuerySpec::new(COLUMNS).limit_fields(&params(&[("fields", "title,status,secret")]));
        let (sql, _) = spec.select_sql("events");
        assert!(sql.starts_with("SELECT title, status FROM events"));
    }

    #[test]
    fn test_pagination_math_and_clamping() {
        let spec = QuerySpec::new(COLUMNS)
            .with_page_size(10, 100)
            .paginate(&params(&[("page", "3"), ("limit", "25")]));
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains("LIMIT 25 OFFSET 50"));

        let spec = QuerySpec::new(COLUMNS)
            .with_page_size(10, 100)
            .paginate(&params(&[("limit", "5000")]));
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains("LIMIT 100"));

        let spec = QuerySpec::new(COLUMNS).paginate(&params(&[("page", "-2"), ("limit", "0")]));
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains("LIMIT 10 OFFSET 0"));
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let spec = QuerySpec::new(COLUMNS)
            .with_page_size(10, 100)
            .paginate(&params(&[("page", "922337203685477580"), ("limit", "100")]));
        let clauses = spec.clauses(1);
        assert_eq!(clauses.offset, i64::MAX);
        let (sql, _) = spec.select_sql("applications");
        assert!(sql.contains(&format!("OFFSET {}", i64::MAX)));
    }

    #[test]
    fn test_count_ignores_pagination() {
        let spec = QuerySpec::new(COLUMNS).shape(&params(&[
            ("status", "pending"),
            ("search", "rust"),
            ("page", "7"),
            ("limit", "3"),
        ]));
        let (sql, binds) = spec.count_sql("applications");
        assert!(sql.starts_with("SELECT COUNT(*) FROM applications WHERE "));
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("$2"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_builder_steps_are_pure() {
        let base = QuerySpec::new(COLUMNS);
        let filtered = base.clone().filter(&params(&[("status", "pending")]));
        let (plain_sql, _) = base.select_sql("applications");
        let (filtered_sql, _) = filtered.select_sql("applications");
        assert!(!plain_sql.contains("WHERE"));
        assert!(filtered_sql.contains("WHERE"));
    }

    #[test]
    fn test_scoped_bind_offset() {
        let spec = QuerySpec::new(COLUMNS).filter(&params(&[("status", "pending")]));
        let clauses = spec.clauses(3);
        assert_eq!(clauses.where_sql, "status = $3");
        assert_eq!(clauses.binds, vec!["pending".to_string()]);
    }
}
