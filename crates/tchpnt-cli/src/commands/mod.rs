pub mod config;
pub mod touchpoint;
pub mod watch;
