mod health;
mod query;
mod sources;

pub use health::health_check;
pub use query::run_query;
pub use sources::register_source;
