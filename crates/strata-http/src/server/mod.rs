pub mod health;
pub mod lifecycle;
pub mod server;

pub use health::{health_check_handler, HealthStatus};
pub use server::Server;
