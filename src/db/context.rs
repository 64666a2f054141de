use serde::Serialize;

/// One reflected column: name plus the SQL column type as reported by
/// `information_schema` (e.g. `INT(11)`, `VARCHAR(255)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
}

/// One reflected table, keyed by its qualified `schema.table` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Render reflected tables into the context block embedded in every prompt.
/// The field labels are part of the few-shot examples' vocabulary; changing
/// them degrades generation quality.
pub fn render_context(tables: &[TableInfo]) -> String {
    let mut ctx = String::new();
    for (index, table) in tables.iter().enumerate() {
        ctx.push_str(&format!("Tabla {index}:\n"));
        ctx.push_str(&format!("nombre:{}\n", table.name));
        ctx.push_str("columnas:");
        for column in &table.columns {
            ctx.push_str(&format!("{} ({})\n", column.name, column.sql_type));
        }
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tables() -> Vec<TableInfo> {
        vec![
            TableInfo {
                name: "home_data_extraction.home_processed_extraction".to_string(),
                columns: vec![
                    ColumnInfo {
                        name: "precio".to_string(),
                        sql_type: "INT(11)".to_string(),
                    },
                    ColumnInfo {
                        name: "ascensor".to_string(),
                        sql_type: "TINYINT(1)".to_string(),
                    },
                ],
            },
            TableInfo {
                name: "home_data_extraction.barrio_provincia".to_string(),
                columns: vec![ColumnInfo {
                    name: "provincia".to_string(),
                    sql_type: "VARCHAR(64)".to_string(),
                }],
            },
        ]
    }

    #[test]
    fn renders_expected_format() {
        let ctx = render_context(&sample_tables());
        assert_eq!(
            ctx,
            "Tabla 0:\n\
             nombre:home_data_extraction.home_processed_extraction\n\
             columnas:precio (INT(11))\n\
             ascensor (TINYINT(1))\n\
             Tabla 1:\n\
             nombre:home_data_extraction.barrio_provincia\n\
             columnas:provincia (VARCHAR(64))\n"
        );
    }

    #[test]
    fn empty_reflection_renders_empty_context() {
        assert_eq!(render_context(&[]), "");
    }
}
