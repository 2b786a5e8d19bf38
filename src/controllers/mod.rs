pub mod health;
pub mod synthesis;
