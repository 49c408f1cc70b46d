use std::fmt;

/// Client-wide options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Return rows as positional value lists instead of name-keyed maps.
    pub array_mode: bool,
}

impl Options {
    #[must_use]
    pub fn with_array_mode(mut self, array_mode: bool) -> Self {
        self.array_mode = array_mode;
        self
    }
}

/// Isolation level requested for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "ReadUncommitted",
            IsolationLevel::ReadCommitted => "ReadCommitted",
            IsolationLevel::RepeatableRead => "RepeatableRead",
            IsolationLevel::Serializable => "Serializable",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directives for a batch. Unset fields are not sent at all.
///
/// # Examples
/// ```rust
/// use pghttp::{IsolationLevel, TransactionOptions};
///
/// let options = TransactionOptions::default()
///     .with_isolation_level(IsolationLevel::Serializable)
///     .with_read_only(true);
/// assert_eq!(options.deferrable, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub read_only: Option<bool>,
    pub deferrable: Option<bool>,
}

impl TransactionOptions {
    #[must_use]
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    #[must_use]
    pub fn with_deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = Some(deferrable);
        self
    }
}
