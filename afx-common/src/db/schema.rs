//! Declarative table definitions
//!
//! Tables are described as ordered lists of [`ColumnDefinition`]s and turned
//! into `CREATE TABLE IF NOT EXISTS` statements. Column order in the generated
//! DDL is the order of the definition list.

use crate::Result;
use sqlx::SqlitePool;

/// Column definition for table creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "BLOB")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
    /// REFERENCES clause target, e.g. `tracks(id) ON DELETE CASCADE`
    pub references: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
            references: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as UNIQUE
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Add a foreign key reference
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.references = Some(target.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(target) = &self.references {
            sql.push_str(" REFERENCES ");
            sql.push_str(target);
        }
        sql
    }
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement
pub fn create_table_sql(table: &str, columns: &[ColumnDefinition]) -> String {
    let body = columns
        .iter()
        .map(|c| format!("    {}", c.to_sql()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", table, body)
}

/// Check whether a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_sql_modifiers() {
        let col = ColumnDefinition::new("asset_id", "INTEGER")
            .not_null()
            .unique()
            .references("tracks(id) ON DELETE CASCADE");
        assert_eq!(
            col.to_sql(),
            "asset_id INTEGER NOT NULL UNIQUE REFERENCES tracks(id) ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_create_table_keeps_column_order() {
        let sql = create_table_sql(
            "demo",
            &[
                ColumnDefinition::new("id", "INTEGER").primary_key(),
                ColumnDefinition::new("b", "REAL"),
                ColumnDefinition::new("a", "TEXT").default("'x'"),
            ],
        );
        let id = sql.find("id INTEGER PRIMARY KEY").unwrap();
        let b = sql.find("b REAL").unwrap();
        let a = sql.find("a TEXT DEFAULT 'x'").unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS demo ("));
        assert!(id < b && b < a);
    }

    #[tokio::test]
    async fn test_table_exists() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        assert!(!table_exists(&pool, "demo").await.unwrap());
        sqlx::query("CREATE TABLE demo (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        assert!(table_exists(&pool, "demo").await.unwrap());
    }
}
