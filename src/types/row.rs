use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PgHttpError, Result},
    types::{decode_value, SqlValue},
    Column,
};

/// Column metadata as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "tableID", default)]
    pub table_id: u32,
    #[serde(rename = "columnID", default)]
    pub column_id: i32,
    /// Type OID. A missing tag decodes the column as text.
    #[serde(rename = "dataTypeID", default)]
    pub data_type_id: Option<u32>,
    #[serde(rename = "dataTypeSize", default)]
    pub data_type_size: i32,
    #[serde(rename = "dataTypeModifier", default)]
    pub data_type_modifier: i32,
    #[serde(default)]
    pub format: String,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type_id: u32) -> Self {
        Self {
            name: name.into(),
            table_id: 0,
            column_id: 0,
            data_type_id: Some(data_type_id),
            data_type_size: -1,
            data_type_modifier: -1,
            format: "text".to_string(),
        }
    }
}

/// Tabular result as sent by the service: every cell is text or `NULL`.
///
/// Each row is expected to hold exactly one cell per field, in field order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub command: String,
    #[serde(rename = "rowCount", default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl RawResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A decoded row, keyed by column name or positional depending on array mode.
///
/// Object rows keep their columns in field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Object(IndexMap<String, SqlValue>),
    Array(Vec<SqlValue>),
}

impl Row {
    /// Gets a value by column name. Only available on object rows.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        match self {
            Row::Object(values) => values
                .get(column)
                .ok_or_else(|| PgHttpError::ColumnNotFound(column.to_string())),
            Row::Array(_) => Err(PgHttpError::ColumnNotFound(column.to_string())),
        }
    }

    /// Gets a value for a typed column by its column name.
    pub fn get_column<C: Column + ?Sized>(&self, column: &C) -> Result<&SqlValue> {
        self.get(column.column_name())
            .map_err(|_| PgHttpError::ColumnNotFound(column.qualified_name()))
    }

    /// Gets a value by position. Only available on array rows.
    pub fn get_index(&self, index: usize) -> Result<&SqlValue> {
        match self {
            Row::Array(values) => values
                .get(index)
                .ok_or_else(|| PgHttpError::ColumnNotFound(format!("#{index}"))),
            Row::Object(_) => Err(PgHttpError::ColumnNotFound(format!("#{index}"))),
        }
    }

    /// Returns the number of values in this row.
    pub fn len(&self) -> usize {
        match self {
            Row::Object(values) => values.len(),
            Row::Array(values) => values.len(),
        }
    }

    /// Returns true if this row has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded result of one executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
    command: String,
    count: Option<u64>,
}

impl ResultSet {
    /// Decodes every cell of a raw result by its field's type OID.
    ///
    /// In object mode a repeated column name keeps the value of its last
    /// occurrence.
    pub fn from_raw(raw: RawResult, array_mode: bool) -> Result<Self> {
        let columns: Vec<String> = raw.fields.iter().map(|f| f.name.clone()).collect();
        let type_oids: Vec<u32> = raw
            .fields
            .iter()
            .map(|f| f.data_type_id.unwrap_or(0))
            .collect();

        let rows = raw
            .rows
            .into_iter()
            .map(|cells| {
                let values = cells
                    .iter()
                    .zip(&type_oids)
                    .map(|(cell, oid)| decode_value(cell.as_deref(), *oid));
                if array_mode {
                    values.collect::<Result<Vec<_>>>().map(Row::Array)
                } else {
                    columns
                        .iter()
                        .cloned()
                        .zip(values)
                        .map(|(name, value)| value.map(|v| (name, v)))
                        .collect::<Result<IndexMap<_, _>>>()
                        .map(Row::Object)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            rows,
            command: raw.command,
            count: raw.row_count,
        })
    }

    /// The command tag reported by the service, e.g. `SELECT` or `INSERT`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The row count reported by the service.
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(PgHttpError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns a reference to the rows without consuming the result.
    pub fn rows_ref(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the column names from this result, in field order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
