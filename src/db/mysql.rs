use crate::db::config::DatabaseConfig;
use crate::db::context::{ColumnInfo, TableInfo};
use crate::error::ResqError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::info;

/// Tabular query result handed to the web UI: column headers plus rows of
/// JSON cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Live connection to the configured MySQL schema.
pub struct Database {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl Database {
    pub async fn connect(config: DatabaseConfig) -> Result<Self, ResqError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(config.connect_options())
            .await?;
        info!("connected to {config}");
        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Reflect the configured schema from `information_schema`, keeping only
    /// allow-listed tables. Column order follows the table definitions.
    pub async fn reflect_schema(&self) -> Result<Vec<TableInfo>, ResqError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"SELECT TABLE_NAME, COLUMN_NAME, COLUMN_TYPE
               FROM information_schema.columns
               WHERE TABLE_SCHEMA = ?
               ORDER BY TABLE_NAME, ORDINAL_POSITION"#,
        )
        .bind(&self.config.schema)
        .fetch_all(&self.pool)
        .await?;

        let mut tables: Vec<TableInfo> = Vec::new();
        for (table_name, column_name, column_type) in rows {
            let qualified = format!("{}.{}", self.config.schema, table_name);
            if !self.config.table_included(&qualified) {
                continue;
            }
            if tables.last().map(|t| t.name.as_str()) != Some(qualified.as_str()) {
                tables.push(TableInfo {
                    name: qualified.clone(),
                    columns: Vec::new(),
                });
            }
            if let Some(table) = tables.last_mut() {
                table.columns.push(ColumnInfo {
                    name: column_name,
                    sql_type: column_type.to_uppercase(),
                });
            }
        }
        Ok(tables)
    }

    /// Execute one (already guarded) statement and collect the result set.
    pub async fn run_query(&self, sql: &str) -> Result<QueryTable, ResqError> {
        let rows: Vec<MySqlRow> = sqlx::query(sql).fetch_all(&self.pool).await?;

        let Some(first) = rows.first() else {
            return Ok(QueryTable::default());
        };
        let columns = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = rows.iter().map(row_to_values).collect();
        Ok(QueryTable { columns, rows })
    }
}

fn row_to_values(row: &MySqlRow) -> Vec<Value> {
    (0..row.columns().len())
        .map(|index| cell_to_json(row, index))
        .collect()
}

/// Decode one cell by its reported column type. Generated SELECTs can touch
/// any column in the schema, so every MySQL result type needs a JSON
/// rendition; cells that still fail to decode degrade to a placeholder
/// string instead of failing the whole result set.
fn cell_to_json(row: &MySqlRow, index: usize) -> Value {
    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    decode_typed(row, index, &type_name)
        .or_else(|| row.try_get::<String, _>(index).ok().map(Value::String))
        .or_else(|| {
            row.try_get::<Vec<u8>, _>(index)
                .ok()
                .map(|bytes| Value::String(BASE64.encode(bytes)))
        })
        .unwrap_or_else(|| Value::String(format!("<{type_name}>")))
}

fn decode_typed(row: &MySqlRow, index: usize, type_name: &str) -> Option<Value> {
    match type_name {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<i64, _>(index)
            .ok()
            .map(|v| Value::Number(v.into())),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "BIT" => row
            .try_get::<u64, _>(index)
            .ok()
            .map(|v| Value::Number(v.into())),
        "YEAR" => row
            .try_get::<u16, _>(index)
            .ok()
            .map(|v| Value::Number(u64::from(v).into())),
        "FLOAT" => row
            .try_get::<f32, _>(index)
            .ok()
            .map(|v| json_number(f64::from(v))),
        "DOUBLE" => row.try_get::<f64, _>(index).ok().map(json_number),
        "DECIMAL" => row.try_get::<Decimal, _>(index).ok().map(|d| {
            d.to_f64()
                .map(json_number)
                .unwrap_or_else(|| Value::String(d.to_string()))
        }),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "DATETIME" => row
            .try_get::<NaiveDateTime, _>(index)
            .ok()
            .map(|v| Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMP" => row
            .try_get::<DateTime<Utc>, _>(index)
            .ok()
            .map(|v| Value::String(v.to_rfc3339())),
        "JSON" => row.try_get::<Value, _>(index).ok(),
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            row.try_get::<String, _>(index).ok().map(Value::String)
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .ok()
            .map(|bytes| Value::String(BASE64.encode(bytes))),
        _ => None,
    }
}

fn json_number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_reports_zero_rows() {
        let table = QueryTable::default();
        assert_eq!(table.row_count(), 0);
        assert!(table.columns.is_empty());
    }

    #[test]
    fn query_table_serializes_for_the_ui() {
        let table = QueryTable {
            columns: vec!["precio".to_string()],
            rows: vec![vec![Value::Number(250_000.into())]],
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["columns"][0], "precio");
        assert_eq!(json["rows"][0][0], 250_000);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(json_number(f64::NAN), Value::Null);
        assert!(json_number(1.5).is_number());
    }
}
