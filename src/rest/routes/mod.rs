pub mod dashboard;
pub mod diagnostic;
pub mod health;
pub mod sessions;
