pub mod byte;
pub mod config;
pub mod profiler;
