mod health;
mod url;

pub use health::health_handler;
pub use self::url::{create_alias_handler, delete_alias_handler, lookup_handler, update_alias_handler};
