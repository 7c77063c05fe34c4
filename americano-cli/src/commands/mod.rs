pub mod config;
pub mod estimate;
pub mod extract;
pub mod serve;
