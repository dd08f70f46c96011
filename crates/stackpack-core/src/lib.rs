pub mod config;
pub mod descriptor;
pub mod error;
pub mod manifest;

pub use config::{Capacity, Settings};
pub use descriptor::*;
pub use error::{ConfigError, ConfigResult};
pub use manifest::Manifest;
