pub mod board;
pub mod logging;
pub mod settings;
pub mod sketch;
