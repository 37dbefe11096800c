//! Web front end and JSON API

pub mod api;
