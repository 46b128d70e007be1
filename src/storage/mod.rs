pub mod sqlite;

pub use sqlite::{LeadFilter, SqliteStorage};
