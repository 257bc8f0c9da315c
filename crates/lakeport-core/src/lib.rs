pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod stages;
pub mod tables;
