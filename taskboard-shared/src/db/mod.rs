/// Database layer for Taskboard
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded migration runner
///
/// The PostgreSQL-backed store itself is [`crate::store::postgres::PgStore`].

pub mod migrations;
pub mod pool;
