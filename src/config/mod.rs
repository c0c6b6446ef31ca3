pub mod app_config;
pub mod vantage;

pub use app_config::{AppConfig, load_config};
pub use vantage::{VantageDirectory, VantagePoint};
