use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PortalError {
    #[error("invalid taxon oid: {0}")]
    InvalidTaxonOid(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    ConfigValue(String),

    #[error("portal search failed: {0}")]
    SearchHttp(String),

    #[error("portal search returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("archive request failed: {0}")]
    RestoreHttp(String),

    #[error("archive request returned status {status}: {message}")]
    RestoreStatus { status: u16, message: String },

    #[error("missing API token (pass --token or set JGI_TOKEN)")]
    #[diagnostic(help("copy the token from your portal profile page"))]
    MissingToken,

    #[error("failed to read table {path}: {message}")]
    TableRead { path: String, message: String },

    #[error("failed to write table {path}: {message}")]
    TableWrite { path: String, message: String },

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
