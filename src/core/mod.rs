//! Core translation engine module

pub mod backend;
pub mod catalog;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod postfilter;
pub mod prompt;
pub mod registry;
