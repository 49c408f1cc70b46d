mod placeholders;
mod template;

pub(crate) use self::placeholders::shift_placeholders;
pub use self::template::{Arg, Template};
