pub mod cli;
pub mod core;
pub mod presenter;
pub mod ui;
