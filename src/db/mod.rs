pub mod models;
pub mod neon;
pub mod schema;
pub mod turso;
