pub mod sqlx;
pub mod types;
