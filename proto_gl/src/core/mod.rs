pub mod assets_management;
pub mod config;
pub mod input;
pub mod logging;
pub mod math;
pub mod platform;
pub mod rendering;
pub mod time;
pub mod utils;
