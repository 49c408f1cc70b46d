mod decode;
mod identifier;
mod parameterized;
mod row;
mod sql_value;

pub use decode::decode_value;
pub use identifier::{escape_identifier, Identifier};
pub use parameterized::ParameterizedQuery;
pub use row::{Field, RawResult, ResultSet, Row};
pub use sql_value::SqlValue;
