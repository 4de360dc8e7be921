pub mod config;
pub mod progress;
pub mod quiz;
pub mod session;
pub mod tree;
