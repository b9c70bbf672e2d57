pub mod args;
pub mod catalog;
pub mod handlers;
pub mod precedence;

pub use args::{ArgumentIndex, RestoreArgumentIndex, RestoreArgumentStream};
pub use catalog::{MatchMode, RestoreOption};
pub use handlers::{HandlerTable, OptionHandler};
pub use precedence::{resolve, resolve_or, TogglePair};
