pub mod config;
pub mod encoding;
pub mod error;
pub mod forms;
pub mod logging;
pub mod model;
pub mod records;
pub mod score;
pub mod server;
