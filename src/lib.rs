pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod devices;
pub mod encoder;
pub mod global;
pub mod stream;
