use serde_json::Value;
use sqlx::{mysql::MySqlArguments, mysql::MySqlRow, Arguments, FromRow, MySqlPool, Row};

use crate::database::manager::DatabaseError;

/// Rendered statement plus positional parameters, bound in order
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single WHERE predicate. Column names are quoted on render.
#[derive(Debug, Clone)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
    Gte(String, Value),
    In(String, Vec<Value>),
    /// `JSON_CONTAINS(column, candidate)`; the candidate is bound as JSON text
    JsonContains(String, Value),
    NotNull(String),
    /// Pre-rendered SQL fragment with its own `?` parameters
    Raw(String, Vec<Value>),
    /// OR-group; an empty group matches nothing
    Any(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Condition::Eq(column.to_string(), value.into())
    }

    pub fn raw(sql: &str, params: Vec<Value>) -> Self {
        Condition::Raw(sql.to_string(), params)
    }

    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Condition::Eq(column, Value::Null) => format!("{} IS NULL", quote_identifier(column)),
            Condition::Eq(column, value) => {
                params.push(value.clone());
                format!("{} = ?", quote_identifier(column))
            }
            Condition::Ne(column, Value::Null) => format!("{} IS NOT NULL", quote_identifier(column)),
            Condition::Ne(column, value) => {
                params.push(value.clone());
                format!("{} <> ?", quote_identifier(column))
            }
            Condition::Gte(column, value) => {
                params.push(value.clone());
                format!("{} >= ?", quote_identifier(column))
            }
            Condition::In(_, values) if values.is_empty() => "1=0".to_string(),
            Condition::In(column, values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned());
                format!("{} IN ({})", quote_identifier(column), placeholders)
            }
            Condition::JsonContains(column, candidate) => {
                params.push(Value::String(candidate.to_string()));
                format!("JSON_CONTAINS({}, ?)", quote_identifier(column))
            }
            Condition::NotNull(column) => format!("{} IS NOT NULL", quote_identifier(column)),
            Condition::Raw(sql, raw_params) => {
                params.extend(raw_params.iter().cloned());
                sql.clone()
            }
            Condition::Any(conditions) if conditions.is_empty() => "1=0".to_string(),
            Condition::Any(conditions) => {
                let parts: Vec<String> = conditions.iter().map(|c| format!("({})", c.render(params))).collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }
}

/// Small SELECT builder for the list endpoints whose filters are optional
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    alias: Option<String>,
    columns: Vec<String>,
    joins: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<String>,
    limit: Option<i64>,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Result<Self, DatabaseError> {
        if !is_valid_identifier(table) {
            return Err(DatabaseError::QueryError(format!("invalid table name: {}", table)));
        }
        Ok(Self {
            table: table.to_string(),
            alias: None,
            columns: vec![],
            joins: vec![],
            conditions: vec![],
            order: vec![],
            limit: None,
        })
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Select expressions are emitted verbatim (`jp.title AS title`, `COUNT(*) AS count`)
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn join(mut self, join: &str) -> Self {
        self.joins.push(join.to_string());
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filter_opt(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(condition) => self.filter(condition),
            None => self,
        }
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order.push(format!("{} {}", quote_identifier(column), direction.to_sql()));
        self
    }

    pub fn order_random(mut self) -> Self {
        self.order.push("RAND()".to_string());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut params = vec![];
        let columns = if self.columns.is_empty() { "*".to_string() } else { self.columns.join(", ") };
        let mut query = format!("SELECT {} FROM {}", columns, quote_identifier(&self.table));
        if let Some(alias) = &self.alias {
            query.push_str(&format!(" AS {}", quote_identifier(alias)));
        }
        for join in &self.joins {
            query.push(' ');
            query.push_str(join);
        }
        query.push_str(&self.where_clause(&mut params));
        if !self.order.is_empty() {
            query.push_str(&format!(" ORDER BY {}", self.order.join(", ")));
        }
        if let Some(limit) = self.limit {
            query.push_str(" LIMIT ?");
            params.push(Value::from(limit));
        }
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let mut params = vec![];
        let mut query = format!("SELECT COUNT(*) AS count FROM {}", quote_identifier(&self.table));
        if let Some(alias) = &self.alias {
            query.push_str(&format!(" AS {}", quote_identifier(alias)));
        }
        for join in &self.joins {
            query.push(' ');
            query.push_str(join);
        }
        query.push_str(&self.where_clause(&mut params));
        SqlResult { query, params }
    }

    fn where_clause(&self, params: &mut Vec<Value>) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.conditions.iter().map(|c| c.render(params)).collect();
        format!(" WHERE {}", parts.join(" AND "))
    }

    pub async fn fetch_all<T>(&self, pool: &MySqlPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let rows = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql.params))
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn fetch_optional<T>(&self, pool: &MySqlPool) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let row = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql.params))
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn count(&self, pool: &MySqlPool) -> Result<i64, DatabaseError> {
        let sql = self.to_count_sql();
        let row = sqlx::query_with(&sql.query, arguments(&sql.params)).fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// Back-tick quote an identifier; `a.b` becomes `` `a`.`b` ``
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Positional arguments for a rendered statement. Arrays and objects go in as JSON text.
pub fn arguments(params: &[Value]) -> MySqlArguments {
    let mut args = MySqlArguments::default();
    for value in params {
        let args = &mut args;
        match value {
            Value::Null => Arguments::add(args, None::<String>),
            Value::Bool(b) => Arguments::add(args, *b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Arguments::add(args, i)
                } else if let Some(u) = n.as_u64() {
                    Arguments::add(args, u)
                } else if let Some(f) = n.as_f64() {
                    Arguments::add(args, f)
                } else {
                    Arguments::add(args, n.to_string())
                }
            }
            Value::String(s) => Arguments::add(args, s.clone()),
            Value::Array(_) | Value::Object(_) => Arguments::add(args, value.to_string()),
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_plain_select() {
        let sql = QueryBuilder::new("job_category").unwrap().select(&["id", "name"]).to_sql();
        assert_eq!(sql.query, "SELECT id, name FROM `job_category`");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn rejects_invalid_table_names() {
        assert!(QueryBuilder::new("user; DROP TABLE user").is_err());
        assert!(QueryBuilder::new("").is_err());
    }

    #[test]
    fn renders_conditions_in_order_with_params() {
        let sql = QueryBuilder::new("job_posting")
            .unwrap()
            .alias("jp")
            .select(&["jp.id AS id"])
            .filter(Condition::eq("jp.is_deleted", false))
            .filter(Condition::Gte("jp.deadline".into(), json!("2024-01-01")))
            .filter(Condition::In("jp.job_category_id".into(), vec![json!(1), json!(2)]))
            .order_random()
            .to_sql();
        assert_eq!(
            sql.query,
            "SELECT jp.id AS id FROM `job_posting` AS `jp` WHERE `jp`.`is_deleted` = ? AND `jp`.`deadline` >= ? AND `jp`.`job_category_id` IN (?, ?) ORDER BY RAND()"
        );
        assert_eq!(sql.params, vec![json!(false), json!("2024-01-01"), json!(1), json!(2)]);
    }

    #[test]
    fn empty_in_and_empty_any_match_nothing() {
        let sql = QueryBuilder::new("t")
            .unwrap()
            .filter(Condition::In("id".into(), vec![]))
            .filter(Condition::Any(vec![]))
            .to_sql();
        assert_eq!(sql.query, "SELECT * FROM `t` WHERE 1=0 AND 1=0");
    }

    #[test]
    fn any_group_wraps_alternatives() {
        let sql = QueryBuilder::new("student")
            .unwrap()
            .filter(Condition::Any(vec![Condition::eq("uni_id", "2020"), Condition::eq("name", "kim")]))
            .filter(Condition::NotNull("uni_id".into()))
            .to_sql();
        assert_eq!(sql.query, "SELECT * FROM `student` WHERE ((`uni_id` = ?) OR (`name` = ?)) AND `uni_id` IS NOT NULL");
        assert_eq!(sql.params, vec![json!("2020"), json!("kim")]);
    }

    #[test]
    fn json_contains_binds_candidate_as_text() {
        let sql = QueryBuilder::new("senior_project")
            .unwrap()
            .filter(Condition::JsonContains("platform".into(), json!([1, 3])))
            .to_sql();
        assert_eq!(sql.query, "SELECT * FROM `senior_project` WHERE JSON_CONTAINS(`platform`, ?)");
        assert_eq!(sql.params, vec![json!("[1,3]")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let sql = QueryBuilder::new("auth").unwrap().filter(Condition::eq("verified_at", Value::Null)).to_sql();
        assert_eq!(sql.query, "SELECT * FROM `auth` WHERE `verified_at` IS NULL");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn limit_is_bound_last() {
        let builder = QueryBuilder::new("board_content")
            .unwrap()
            .filter(Condition::eq("category_id", 2))
            .order_by("uploaded_at", SortDirection::Desc)
            .limit(20);
        let sql = builder.to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM `board_content` WHERE `category_id` = ? ORDER BY `uploaded_at` DESC LIMIT ?"
        );
        assert_eq!(sql.params, vec![json!(2), json!(20)]);

        let count = builder.to_count_sql();
        assert_eq!(count.query, "SELECT COUNT(*) AS count FROM `board_content` WHERE `category_id` = ?");
        assert_eq!(count.params, vec![json!(2)]);
    }

    #[test]
    fn arguments_cover_every_param() {
        let args = arguments(&[json!(null), json!(true), json!(3), json!("x"), json!([1, 2])]);
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn quotes_dotted_identifiers() {
        assert_eq!(quote_identifier("jp.title"), "`jp`.`title`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }
}
