use crate::types::Identifier;

/// Trait describing a database table, used as a typed source of identifiers.
pub trait Table {
    /// The type containing all column accessors for this table.
    type Columns;

    /// Returns the table name as it appears in the database.
    fn table_name() -> &'static str;

    /// Returns the schema name, if any.
    fn schema() -> Option<&'static str> {
        None
    }

    /// Returns `schema.table`, or just the table name without a schema.
    /// Escaping turns this into `"schema"."table"`.
    fn qualified_name() -> String {
        match Self::schema() {
            Some(schema) => format!("{}.{}", schema, Self::table_name()),
            None => Self::table_name().to_string(),
        }
    }

    /// The qualified name as an identifier.
    fn identifier() -> Identifier {
        Identifier::new(Self::qualified_name())
    }

    /// Returns an instance of the columns accessor for this table.
    fn columns() -> Self::Columns;
}
