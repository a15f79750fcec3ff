pub mod color;
pub mod config;
pub mod convolve;
pub mod error;
pub mod history;
pub mod operations;
pub mod pipeline;
pub mod session;
pub mod spec;
pub mod transforms;
