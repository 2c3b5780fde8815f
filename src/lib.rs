pub mod cli;
pub mod config;
pub mod data;
pub mod gacha;
pub mod server;
