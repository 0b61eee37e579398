//! API route modules.

pub mod devices;
pub mod stream;
