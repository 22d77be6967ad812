pub mod cli;
pub mod config;
pub mod decode;
pub mod fetch;
pub mod kafka;
pub mod web;
