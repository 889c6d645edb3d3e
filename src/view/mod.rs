pub mod api;
pub mod detail;
pub mod load;
pub mod matrix;
pub mod model;
pub mod queue;
