pub mod config;
mod responses;
pub mod rest_helper;
mod telemetry;

pub use self::config::AppConfig;
pub use responses::*;
pub use rest_helper::RestHelper;
pub use telemetry::*;
