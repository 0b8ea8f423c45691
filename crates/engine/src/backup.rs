//! Backup documents.
//!
//! A [`Snapshot`] holds every business table (users are never included). It
//! is exported either as JSON or as a SQL script of `DELETE FROM` plus
//! multi-row `INSERT` statements. Restoring accepts both forms; SQL scripts
//! are split into statements here and only `DELETE FROM` / `INSERT INTO`
//! statements against the backup tables are allowed through.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::DbBackend;
use serde::{Deserialize, Serialize};

use crate::{
    Customer, EngineError, InboundRecord, Medicine, ResultEngine, SaleRecord, Supplier,
};

/// Tables in insert order. Deletion runs in reverse.
pub(crate) const BACKUP_TABLES: [&str; 5] =
    ["suppliers", "customers", "medicines", "inbounds", "sales"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub inbounds: Vec<InboundRecord>,
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Sql,
}

impl SnapshotFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sql => "sql",
        }
    }
}

impl TryFrom<&str> for SnapshotFormat {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "json" => Ok(Self::Json),
            "sql" => Ok(Self::Sql),
            other => Err(EngineError::Backup(format!("unknown backup format: {other}"))),
        }
    }
}

enum SqlValue<'a> {
    Int(i64),
    Text(&'a str),
    Time(DateTime<Utc>),
    Null,
}

impl<'a> From<Option<&'a String>> for SqlValue<'a> {
    fn from(value: Option<&'a String>) -> Self {
        value.map_or(SqlValue::Null, |s| SqlValue::Text(s))
    }
}

impl From<Option<i64>> for SqlValue<'_> {
    fn from(value: Option<i64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Int)
    }
}

/// Quote a string literal for `backend`.
fn quote(value: &str, backend: DbBackend) -> String {
    let mut escaped = value.replace('\'', "''");
    if backend == DbBackend::MySql {
        escaped = escaped.replace('\\', "\\\\");
    }
    format!("'{escaped}'")
}

/// Timestamps are written exactly as the driver stores them, so restored
/// rows compare correctly with rows written by the engine.
fn timestamp(value: DateTime<Utc>, backend: DbBackend) -> String {
    match backend {
        DbBackend::Sqlite => value.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        _ => value.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
    }
}

fn render_value(value: &SqlValue<'_>, backend: DbBackend) -> String {
    match value {
        SqlValue::Int(v) => v.to_string(),
        SqlValue::Text(v) => quote(v, backend),
        SqlValue::Time(v) => quote(&timestamp(*v, backend), backend),
        SqlValue::Null => "NULL".to_string(),
    }
}

fn insert_block(
    out: &mut String,
    table: &str,
    columns: &[&str],
    rows: Vec<Vec<SqlValue<'_>>>,
    backend: DbBackend,
) {
    let _ = writeln!(out, "-- {table}: {} rows", rows.len());
    if rows.is_empty() {
        out.push('\n');
        return;
    }
    let column_list = columns
        .iter()
        .map(|c| format!("`{c}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "INSERT INTO `{table}` ({column_list}) VALUES");
    let rendered = rows
        .iter()
        .map(|row| {
            let values = row
                .iter()
                .map(|v| render_value(v, backend))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({values})")
        })
        .collect::<Vec<_>>()
        .join(",\n");
    let _ = writeln!(out, "{rendered};\n");
}

impl Snapshot {
    /// Render the snapshot as a SQL script for `backend`.
    #[must_use]
    pub fn to_sql(&self, backend: DbBackend) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "-- Pharmacy database backup");
        let _ = writeln!(
            out,
            "-- Created at: {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        out.push('\n');

        for table in BACKUP_TABLES.iter().rev() {
            let _ = writeln!(out, "DELETE FROM `{table}`;");
        }
        out.push('\n');

        insert_block(
            &mut out,
            "suppliers",
            &["id", "name", "contact", "phone", "created_at"],
            self.suppliers
                .iter()
                .map(|s| {
                    vec![
                        SqlValue::Int(s.id),
                        SqlValue::Text(&s.name),
                        s.contact.as_ref().into(),
                        s.phone.as_ref().into(),
                        SqlValue::Time(s.created_at),
                    ]
                })
                .collect(),
            backend,
        );
        insert_block(
            &mut out,
            "customers",
            &["id", "name", "phone", "created_at"],
            self.customers
                .iter()
                .map(|c| {
                    vec![
                        SqlValue::Int(c.id),
                        SqlValue::Text(&c.name),
                        c.phone.as_ref().into(),
                        SqlValue::Time(c.created_at),
                    ]
                })
                .collect(),
            backend,
        );
        insert_block(
            &mut out,
            "medicines",
            &[
                "id",
                "code",
                "name",
                "type",
                "spec",
                "price_minor",
                "stock",
                "manufacturer",
                "status",
            ],
            self.medicines
                .iter()
                .map(|m| {
                    vec![
                        SqlValue::Int(m.id),
                        SqlValue::Text(&m.code),
                        SqlValue::Text(&m.name),
                        SqlValue::Text(&m.kind),
                        m.spec.as_ref().into(),
                        SqlValue::Int(m.price.cents()),
                        SqlValue::Int(m.stock),
                        m.manufacturer.as_ref().into(),
                        SqlValue::Text(m.status.as_str()),
                    ]
                })
                .collect(),
            backend,
        );
        insert_block(
            &mut out,
            "inbounds",
            &[
                "id",
                "medicine_id",
                "supplier_id",
                "quantity",
                "unit_price_minor",
                "inbound_date",
            ],
            self.inbounds
                .iter()
                .map(|i| {
                    vec![
                        SqlValue::Int(i.id),
                        SqlValue::Int(i.medicine_id),
                        i.supplier_id.into(),
                        SqlValue::Int(i.quantity),
                        SqlValue::Int(i.unit_price.cents()),
                        SqlValue::Time(i.inbound_date),
                    ]
                })
                .collect(),
            backend,
        );
        insert_block(
            &mut out,
            "sales",
            &[
                "id",
                "order_id",
                "medicine_id",
                "customer_id",
                "quantity",
                "total_price_minor",
                "sale_date",
            ],
            self.sales
                .iter()
                .map(|s| {
                    vec![
                        SqlValue::Int(s.id),
                        SqlValue::Text(&s.order_id),
                        SqlValue::Int(s.medicine_id),
                        s.customer_id.into(),
                        SqlValue::Int(s.quantity),
                        SqlValue::Int(s.total_price.cents()),
                        SqlValue::Time(s.sale_date),
                    ]
                })
                .collect(),
            backend,
        );

        out
    }
}

/// Split a SQL script into statements on `;` outside quoted text.
///
/// `--` and `/* */` comments are dropped. Backslash escapes inside string
/// literals are honoured only for MySQL.
pub(crate) fn split_statements(script: &str, backend: DbBackend) -> ResultEngine<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote_char: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote_char {
            current.push(c);
            if c == '\\' && backend == DbBackend::MySql {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            } else if c == q {
                if chars.peek() == Some(&q) {
                    // doubled quote stays inside the literal
                    current.push(q);
                    chars.next();
                } else {
                    quote_char = None;
                }
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote_char = Some(c);
                current.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                current.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        closed = true;
                        break;
                    }
                    prev = skipped;
                }
                if !closed {
                    return Err(EngineError::Backup("unterminated comment".to_string()));
                }
                current.push(' ');
            }
            ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if quote_char.is_some() {
        return Err(EngineError::Backup("unterminated string literal".to_string()));
    }
    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    Ok(statements)
}

/// Accept only `DELETE FROM <table>` / `INSERT INTO <table>` on backup
/// tables.
pub(crate) fn check_statement(statement: &str) -> ResultEngine<()> {
    let mut words = statement.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_uppercase();
    let preposition = words.next().unwrap_or_default().to_ascii_uppercase();
    let allowed = matches!(
        (verb.as_str(), preposition.as_str()),
        ("INSERT", "INTO") | ("DELETE", "FROM")
    );
    if !allowed {
        return Err(EngineError::Backup(format!(
            "statement not allowed in a restore: {}",
            preview(statement)
        )));
    }

    let table = words
        .next()
        .unwrap_or_default()
        .split('(')
        .next()
        .unwrap_or_default()
        .trim_matches(|c| c == '`' || c == '"' || c == ';')
        .to_ascii_lowercase();
    if !BACKUP_TABLES.contains(&table.as_str()) {
        return Err(EngineError::Backup(format!(
            "table not allowed in a restore: {table}"
        )));
    }
    Ok(())
}

fn preview(statement: &str) -> String {
    statement.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{MedicineStatus, MoneyCents};

    fn snapshot() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        Snapshot {
            created_at: at,
            suppliers: vec![Supplier {
                id: 1,
                name: "O'Brien Pharma".to_string(),
                contact: None,
                phone: Some("555-0101".to_string()),
                created_at: at,
            }],
            customers: vec![],
            medicines: vec![Medicine {
                id: 7,
                code: "AMX".to_string(),
                name: "Amoxicillin; 500mg".to_string(),
                kind: "capsule".to_string(),
                spec: None,
                price: MoneyCents::new(1250),
                stock: 30,
                manufacturer: None,
                status: MedicineStatus::Active,
            }],
            inbounds: vec![],
            sales: vec![],
        }
    }

    #[test]
    fn sql_dump_escapes_quotes_and_keeps_semicolons_in_literals() {
        let sql = snapshot().to_sql(DbBackend::Sqlite);
        assert!(sql.contains("'O''Brien Pharma'"));
        assert!(sql.contains("-- Created at: 2026-03-01 10:00:00"));
        assert!(sql.contains("DELETE FROM `sales`;"));

        let statements = split_statements(&sql, DbBackend::Sqlite).unwrap();
        // 5 deletes + suppliers + medicines (empty tables get no INSERT)
        assert_eq!(statements.len(), 7);
        assert!(statements[6].contains("'Amoxicillin; 500mg'"));
        for statement in &statements {
            check_statement(statement).unwrap();
        }
    }

    #[test]
    fn deletes_run_in_dependency_order() {
        let sql = snapshot().to_sql(DbBackend::Sqlite);
        let sales = sql.find("DELETE FROM `sales`").unwrap();
        let medicines = sql.find("DELETE FROM `medicines`").unwrap();
        let suppliers = sql.find("DELETE FROM `suppliers`").unwrap();
        assert!(sales < medicines && medicines < suppliers);
    }

    #[test]
    fn mysql_dump_escapes_backslashes() {
        let mut snap = snapshot();
        snap.suppliers[0].name = r"C:\drugs".to_string();
        let sql = snap.to_sql(DbBackend::MySql);
        assert!(sql.contains(r"'C:\\drugs'"));
        assert!(sql.contains("'2026-03-01 10:00:00.000000'"));
    }

    #[test]
    fn splitter_skips_comments() {
        let script = "-- header; not a statement\n/* block; comment */ DELETE FROM sales;\n\n";
        let statements = split_statements(script, DbBackend::Sqlite).unwrap();
        assert_eq!(statements, vec!["DELETE FROM sales".to_string()]);
    }

    #[test]
    fn splitter_rejects_unterminated_literal() {
        assert!(matches!(
            split_statements("INSERT INTO sales VALUES ('oops);", DbBackend::Sqlite),
            Err(EngineError::Backup(_))
        ));
    }

    #[test]
    fn only_backup_tables_are_writable() {
        assert!(check_statement("DROP TABLE medicines").is_err());
        assert!(check_statement("DELETE FROM users").is_err());
        assert!(check_statement("INSERT INTO `inbounds` (`id`) VALUES (1)").is_ok());
        assert!(check_statement("insert into customers(id) values (1)").is_ok());
    }

    #[test]
    fn format_parses() {
        assert_eq!(SnapshotFormat::try_from("sql").unwrap(), SnapshotFormat::Sql);
        assert!(SnapshotFormat::try_from("xml").is_err());
    }
}
