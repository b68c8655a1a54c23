pub mod aggregate;
pub mod app;
pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod jgi;
pub mod manifest;
pub mod output;
pub mod prompt;
