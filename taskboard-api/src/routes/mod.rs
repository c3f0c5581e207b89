/// API route handlers
///
/// - `health`: Health check endpoint
/// - `query`: The single operation endpoint (`POST /v1/query`)

pub mod health;
pub mod query;
