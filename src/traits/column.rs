use crate::types::Identifier;

/// A typed column, usable wherever an identifier is inlined.
pub trait Column {
    /// Returns the column name as it appears in the database.
    fn column_name(&self) -> &'static str;

    /// Returns the table name this column belongs to.
    fn table_name(&self) -> &'static str;

    /// Returns `table.column`.
    fn qualified_name(&self) -> String {
        format!("{}.{}", self.table_name(), self.column_name())
    }

    /// The qualified name as an identifier, escaped as `"table"."column"`.
    fn identifier(&self) -> Identifier {
        Identifier::new(self.qualified_name())
    }
}
