mod column;
mod table;
mod transport;

pub use column::Column;
pub use table::Table;
pub use transport::Transport;
