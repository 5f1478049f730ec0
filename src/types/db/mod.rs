// Database entities - SeaORM models
pub mod login_attempt;
pub mod refresh_token;
pub mod user;
