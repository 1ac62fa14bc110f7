use std::collections::BTreeSet;

use anyhow::{bail, Result};

use super::schema::Database;
use super::types::{Category, Country};
use crate::util::strip_control_chars;

/// Country codes offered even when the user has added none.
pub const DEFAULT_COUNTRIES: &[&str] = &["us", "no", "fr", "de", "es"];

/// Headline categories offered even when the user has added none.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "general",
    "business",
    "entertainment",
    "health",
    "science",
    "sports",
    "technology",
];

/// Which filter table an operation targets. Both tables share one shape.
#[derive(Debug, Clone, Copy)]
enum FilterTable {
    Countries,
    Categories,
}

impl FilterTable {
    fn name(self) -> &'static str {
        match self {
            FilterTable::Countries => "countries",
            FilterTable::Categories => "categories",
        }
    }
}

/// Union of the defaults and user values, deduplicated and sorted.
pub fn merge_with_defaults<'a>(
    defaults: &[&'a str],
    user: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    defaults
        .iter()
        .copied()
        .chain(user)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

impl Database {
    // ========================================================================
    // Filter Value Operations
    // ========================================================================

    /// Strip control chars, trim and lowercase a filter name; reject empties.
    ///
    /// The service expects lowercase codes (`us`, `technology`).
    fn sanitize_filter_name(name: &str) -> Result<String> {
        let sanitized = strip_control_chars(name);
        let trimmed = sanitized.trim();
        if trimmed.is_empty() {
            bail!("Name cannot be empty or whitespace-only");
        }
        Ok(trimmed.to_lowercase())
    }

    async fn insert_filter(&self, table: FilterTable, name: &str) -> Result<i64> {
        let clean_name = Self::sanitize_filter_name(name)?;

        // DO UPDATE (not DO NOTHING) so RETURNING yields the existing id
        let sql = format!(
            "INSERT INTO {} (name) VALUES (?) ON CONFLICT(name) DO UPDATE SET name = excluded.name RETURNING id",
            table.name()
        );
        let row: (i64,) = sqlx::query_as(&sql)
            .bind(&clean_name)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(table = table.name(), name = %clean_name, id = row.0, "Added filter value");
        Ok(row.0)
    }

    async fn delete_filter(&self, table: FilterTable, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn filter_names(&self, table: FilterTable) -> Result<Vec<String>> {
        let sql = format!("SELECT name FROM {} ORDER BY name", table.name());
        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Add a user-defined country, returning its ID (existing ID if already present).
    pub async fn add_country(&self, name: &str) -> Result<i64> {
        self.insert_filter(FilterTable::Countries, name).await
    }

    /// Permanently delete a user-defined country.
    pub async fn delete_country(&self, id: i64) -> Result<bool> {
        self.delete_filter(FilterTable::Countries, id).await
    }

    /// All user-defined countries ordered by name.
    pub async fn get_countries(&self) -> Result<Vec<Country>> {
        let rows = sqlx::query_as::<_, Country>("SELECT id, name FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Add a user-defined category, returning its ID (existing ID if already present).
    pub async fn add_category(&self, name: &str) -> Result<i64> {
        self.insert_filter(FilterTable::Categories, name).await
    }

    /// Permanently delete a user-defined category.
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        self.delete_filter(FilterTable::Categories, id).await
    }

    /// All user-defined categories ordered by name.
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Default countries merged with user-defined ones, sorted.
    pub async fn combined_countries(&self) -> Result<Vec<String>> {
        let user = self.filter_names(FilterTable::Countries).await?;
        Ok(merge_with_defaults(
            DEFAULT_COUNTRIES,
            user.iter().map(String::as_str),
        ))
    }

    /// Default categories merged with user-defined ones, sorted.
    pub async fn combined_categories(&self) -> Result<Vec<String>> {
        let user = self.filter_names(FilterTable::Categories).await?;
        Ok(merge_with_defaults(
            DEFAULT_CATEGORIES,
            user.iter().map(String::as_str),
        ))
    }
}
