//! Database layer
//!
//! Connection pooling, embedded migrations, and the repository traits
//! the services talk through.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use migrations::run_migrations;
pub use pool::create_pool;
