use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use duckdb::types::{TimeUnit, ValueRef};
use serde::{Serialize, Serializer};
use std::fmt;

/// One materialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Exact numerics wider than 64 bits, kept as text.
    Decimal(String),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Nested and other types, rendered by the engine's debug form.
    Other(String),
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

impl Cell {
    pub fn from_value_ref(val: ValueRef<'_>) -> Self {
        match val {
            ValueRef::Null => Cell::Null,
            ValueRef::Boolean(b) => Cell::Bool(b),
            ValueRef::TinyInt(i) => Cell::Int(i.into()),
            ValueRef::SmallInt(i) => Cell::Int(i.into()),
            ValueRef::Int(i) => Cell::Int(i.into()),
            ValueRef::BigInt(i) => Cell::Int(i),
            ValueRef::UTinyInt(i) => Cell::UInt(i.into()),
            ValueRef::USmallInt(i) => Cell::UInt(i.into()),
            ValueRef::UInt(i) => Cell::UInt(i.into()),
            ValueRef::UBigInt(i) => Cell::UInt(i),
            ValueRef::HugeInt(i) => Cell::Decimal(i.to_string()),
            ValueRef::Decimal(d) => Cell::Decimal(d.to_string()),
            ValueRef::Float(f) => Cell::Float(f.into()),
            ValueRef::Double(f) => Cell::Float(f),
            ValueRef::Text(s) => Cell::Text(String::from_utf8_lossy(s).into_owned()),
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
            ValueRef::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days.into())))
                .map(Cell::Date)
                .unwrap_or_else(|| Cell::Other(format!("date({})", days))),
            ValueRef::Time64(unit, value) => {
                let micros = to_micros(unit, value);
                let secs = micros.div_euclid(1_000_000);
                let nanos = micros.rem_euclid(1_000_000) * 1_000;
                u32::try_from(secs)
                    .ok()
                    .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, nanos as u32))
                    .map(Cell::Time)
                    .unwrap_or_else(|| Cell::Other(format!("time({})", value)))
            }
            ValueRef::Timestamp(unit, value) => {
                DateTime::from_timestamp_micros(to_micros(unit, value))
                    .map(|t| Cell::Timestamp(t.naive_utc()))
                    .unwrap_or_else(|| Cell::Other(format!("timestamp({})", value)))
            }
            other => Cell::Other(format!("{:?}", other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::UInt(i) => write!(f, "{}", i),
            Cell::Decimal(s) | Cell::Text(s) | Cell::Other(s) => f.write_str(s),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Blob(bytes) => {
                f.write_str("\\x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Cell::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::UInt(i) => serializer.serialize_u64(*i),
            Cell::Float(x) => serializer.serialize_f64(*x),
            _ => serializer.collect_str(self),
        }
    }
}

/// A fully materialized result set. Every row holds exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as `column -> value` maps, for record-oriented output.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| serde_json::to_value(cell).unwrap_or_default()))
                    .collect()
            })
            .collect()
    }
}
