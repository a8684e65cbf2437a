pub mod config;
pub mod database;
pub mod error;
pub mod models;

pub use database::{CardStore, ReviewStore, SessionLog, SqliteStore};
pub use error::{EngineError, StoreError, ValidationError};
pub use models::{Card, Rating, ReviewSession, SchedulingState, SessionLogEntry};
