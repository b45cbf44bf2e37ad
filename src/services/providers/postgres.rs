/// PostgreSQL catalog and testing results provider
///
/// Reads channels, solutions, PubMed publication types, channel co-occurrence
/// and testing results. Listings are cached in Redis; co-occurrence and
/// testing results are always read fresh.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ChannelDirectory, CoOccurrence, TestingResult},
    services::providers::{Catalog, TestingResultSource},
};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashSet};

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    cache: Cache,
    cache_ttl: u64,
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct CoOccurrenceRow {
    partner_id: String,
    partner_name: Option<String>,
    visit_count: i64,
}

impl From<CoOccurrenceRow> for CoOccurrence {
    fn from(row: CoOccurrenceRow) -> Self {
        CoOccurrence {
            partner_id: row.partner_id,
            partner_name: row.partner_name,
            visit_count: u64::try_from(row.visit_count).unwrap_or(0),
        }
    }
}

impl PgCatalog {
    pub fn new(pool: PgPool, cache: Cache, cache_ttl: u64) -> Self {
        Self {
            pool,
            cache,
            cache_ttl,
        }
    }

    async fn query_names(&self, sql: &str) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(sql).fetch_all(&self.pool).await?;
        Ok(names)
    }

    async fn query_publication_types(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT publication_types::text
            FROM pubmed_studies
            WHERE publication_types IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let types: BTreeSet<String> = rows
            .iter()
            .flat_map(|raw| parse_publication_types(raw))
            .collect();

        tracing::debug!(rows = rows.len(), types = types.len(), "Parsed publication types");

        Ok(types.into_iter().collect())
    }

    async fn query_directory(&self) -> AppResult<Vec<(String, String)>> {
        let rows: Vec<ChannelRow> = sqlx::query_as(
            r#"
            SELECT id::text AS id, name
            FROM channels
            WHERE name IS NOT NULL
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.id, r.name)).collect())
    }
}

fn catalog_unavailable(listing: &'static str) -> impl Fn(AppError) -> AppError {
    move |e| {
        tracing::error!(error = %e, listing, "Catalog listing failed");
        AppError::CatalogUnavailable(format!("Failed to fetch {}", listing))
    }
}

#[async_trait::async_trait]
impl Catalog for PgCatalog {
    async fn list_channels(&self) -> AppResult<Vec<String>> {
        cached!(self.cache, CacheKey::Channels, self.cache_ttl, async {
            self.query_names("SELECT name FROM channels WHERE name IS NOT NULL ORDER BY name")
                .await
                .map_err(catalog_unavailable("channels"))
        })
    }

    async fn list_solutions(&self) -> AppResult<Vec<String>> {
        cached!(self.cache, CacheKey::Solutions, self.cache_ttl, async {
            self.query_names("SELECT name FROM solutions WHERE name IS NOT NULL ORDER BY name")
                .await
                .map_err(catalog_unavailable("solutions"))
        })
    }

    async fn list_publication_types(&self) -> AppResult<Vec<String>> {
        cached!(self.cache, CacheKey::PublicationTypes, self.cache_ttl, async {
            self.query_publication_types()
                .await
                .map_err(catalog_unavailable("publication types"))
        })
    }

    async fn channel_directory(&self) -> AppResult<ChannelDirectory> {
        let pairs: AppResult<Vec<(String, String)>> =
            cached!(self.cache, CacheKey::ChannelDirectory, self.cache_ttl, async {
                self.query_directory()
                    .await
                    .map_err(catalog_unavailable("channel directory"))
            });
        Ok(pairs?.into_iter().collect())
    }

    async fn co_occurrence(&self, channel_id: &str) -> AppResult<Vec<CoOccurrence>> {
        let rows: Vec<CoOccurrenceRow> = sqlx::query_as(
            r#"
            SELECT
                cr.youtube_channel_id AS partner_id,
                cr.expert_name AS partner_name,
                COUNT(*)::bigint AS visit_count
            FROM v_channel_relations cr
            WHERE cr.channel_id::text = $1
                AND cr.youtube_channel_id IS NOT NULL
            GROUP BY cr.youtube_channel_id, cr.expert_name
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(channel_id = %channel_id, partners = rows.len(), "Fetched co-occurrence");

        Ok(rows.into_iter().map(CoOccurrence::from).collect())
    }
}

/// Columns of `testing_results` that older schemas lack, with their SQL types
const OPTIONAL_TESTING_COLUMNS: [(&str, &str); 3] = [
    ("testing_date", "date"),
    ("testing_institution", "text"),
    ("testing_location", "text"),
];

impl PgCatalog {
    /// Which optional `testing_results` columns exist; none when the probe fails
    async fn optional_testing_columns(&self) -> HashSet<String> {
        let names: Vec<&str> = OPTIONAL_TESTING_COLUMNS.iter().map(|(name, _)| *name).collect();

        let probe: Result<Vec<String>, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema()
                AND table_name = 'testing_results'
                AND column_name = ANY($1)
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await;

        match probe {
            Ok(columns) => columns.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not check optional testing result columns");
                HashSet::new()
            }
        }
    }
}

/// Select for testing results; optional columns missing from the schema read as NULL
pub fn testing_results_query(existing: &HashSet<String>) -> String {
    let optional: Vec<String> = OPTIONAL_TESTING_COLUMNS
        .iter()
        .map(|(name, sql_type)| {
            if existing.contains(*name) {
                format!("{name}::{sql_type} AS {name}")
            } else {
                format!("NULL::{sql_type} AS {name}")
            }
        })
        .collect();

    format!(
        r#"
        SELECT
            id::bigint AS id,
            test_object,
            normalized_test_object,
            result_value::float8 AS result_value,
            result_unit,
            reference_value::float8 AS reference_value,
            comments,
            flag,
            {},
            COALESCE(updated_at, NOW()) AS updated_at
        FROM testing_results
        WHERE test_object IS NOT NULL
        ORDER BY id
        "#,
        optional.join(",\n            ")
    )
}

#[async_trait::async_trait]
impl TestingResultSource for PgCatalog {
    async fn fetch_testing_results(&self) -> AppResult<Vec<TestingResult>> {
        let existing = self.optional_testing_columns().await;
        if existing.len() < OPTIONAL_TESTING_COLUMNS.len() {
            tracing::debug!(present = existing.len(), "Some optional testing result columns are missing");
        }

        let sql = testing_results_query(&existing);
        let rows: Vec<TestingResult> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        tracing::info!(count = rows.len(), "Fetched testing results");

        Ok(rows)
    }
}

/// Flattens one stored `publication_types` value into type names
///
/// Accepts a JSON array, a JSON object (its string values), a Postgres array
/// literal such as `{"Journal Article",Review}`, or a plain string.
pub fn parse_publication_types(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        match value {
            Value::Array(items) => return clean(items.iter().filter_map(Value::as_str)),
            Value::Object(map) => return clean(map.values().filter_map(Value::as_str)),
            Value::String(inner) => return parse_publication_types(&inner),
            _ => {}
        }
    }

    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return clean(split_array_literal(inner).iter().map(String::as_str));
    }

    if raw.contains('"') {
        // Quoted names embedded in free text
        return clean(raw.split('"').skip(1).step_by(2));
    }

    vec![raw.to_string()]
}

/// Splits the inside of a Postgres array literal on commas outside quotes
fn split_array_literal(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in inner.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

fn clean<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::trim)
        .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("null"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        assert_eq!(
            parse_publication_types(r#"["Journal Article", " Review "]"#),
            vec!["Journal Article", "Review"]
        );
    }

    #[test]
    fn test_parse_json_object_values() {
        let mut types = parse_publication_types(r#"{"a": "Review", "b": "Clinical Trial"}"#);
        types.sort();
        assert_eq!(types, vec!["Clinical Trial", "Review"]);
    }

    #[test]
    fn test_parse_postgres_array_literal() {
        assert_eq!(
            parse_publication_types(r#"{"Journal Article","Randomized Controlled Trial"}"#),
            vec!["Journal Article", "Randomized Controlled Trial"]
        );
        assert_eq!(
            parse_publication_types(r#"{Review,"Case Reports, Clinical"}"#),
            vec!["Review", "Case Reports, Clinical"]
        );
    }

    #[test]
    fn test_parse_array_literal_with_escapes_and_nulls() {
        assert_eq!(
            parse_publication_types(r#"{"Letter \"to\" Editor",NULL}"#),
            vec![r#"Letter "to" Editor"#]
        );
    }

    #[test]
    fn test_parse_plain_string() {
        assert_eq!(parse_publication_types("Meta-Analysis"), vec!["Meta-Analysis"]);
        assert_eq!(parse_publication_types("   "), Vec::<String>::new());
    }

    #[test]
    fn test_parse_json_string_wrapping_array() {
        assert_eq!(
            parse_publication_types(r#""[\"Review\"]""#),
            vec!["Review"]
        );
    }

    #[test]
    fn test_co_occurrence_row_clamps_negative_counts() {
        let row = CoOccurrenceRow {
            partner_id: "UC1".to_string(),
            partner_name: None,
            visit_count: -3,
        };
        assert_eq!(CoOccurrence::from(row).visit_count, 0);
    }

    #[test]
    fn test_testing_results_query_with_full_schema() {
        let existing: HashSet<String> = OPTIONAL_TESTING_COLUMNS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        let sql = testing_results_query(&existing);

        assert!(sql.contains("testing_date::date AS testing_date"));
        assert!(sql.contains("testing_institution::text AS testing_institution"));
        assert!(!sql.contains("NULL::"));
    }

    #[test]
    fn test_testing_results_query_degrades_missing_columns() {
        let existing: HashSet<String> = ["testing_location".to_string()].into_iter().collect();
        let sql = testing_results_query(&existing);

        assert!(sql.contains("NULL::date AS testing_date"));
        assert!(sql.contains("NULL::text AS testing_institution"));
        assert!(sql.contains("testing_location::text AS testing_location"));
    }
}
