pub mod cached;
pub mod refresh;
pub mod resolve;
pub mod setup;
pub mod ui;
