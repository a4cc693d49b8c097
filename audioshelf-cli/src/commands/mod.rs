//! CLI command implementations

mod add;
mod edit;
mod list;
mod remove;

pub use add::add;
pub use edit::{rename, reorder};
pub use list::list;
pub use remove::{delete, remove_file};
