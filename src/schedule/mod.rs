pub mod api;
pub mod buffer;
