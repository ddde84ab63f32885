pub mod config;
pub mod errors;
pub mod table;

pub mod database;
pub mod processing;
pub mod server;
pub mod services;
