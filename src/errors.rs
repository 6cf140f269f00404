//! Error types for the scrape run.
//!
//! Three layers, each a `thiserror` enum:
//! - [`BrowserError`]: a single WebDriver interaction failed
//! - [`OutputError`]: writing the spreadsheet or an image to disk failed
//! - [`ScrapeError`]: what a workflow step reports; every variant carries a
//!   human-readable message that ends up in the task log

use std::error::Error;
use std::time::Duration;
use thiserror::Error;

/// A failed browser interaction.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out after {timeout:?} waiting for {locator} to be visible")]
    Timeout { locator: String, timeout: Duration },

    #[error("option '{0}' not found")]
    OptionNotFound(String),

    #[error("missing attribute '{0}'")]
    MissingAttribute(String),

    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}

/// A failed write of a run artifact.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Everything a scrape run can fail with.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Search phrase '{0}' does not contain any results")]
    NoResults(String),

    #[error("Selected news category '{0}' does not exist. Please specify a valid category.")]
    CategoryNotFound(String),

    #[error("An unexpected website error occurred while trying to fetch more news.")]
    UnexpectedEndOfNavigation {
        #[source]
        source: BrowserError,
    },

    #[error("{message}")]
    Scrape {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    #[error("Please specify the argument {0} through the work item or the command line.")]
    MissingArgument(&'static str),

    #[error("Argument {argument} has an invalid value {value}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },

    #[error("could not read work item {path}: {source}")]
    WorkItem {
        path: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("failed to write run output: {0}")]
    Output(#[from] OutputError),
}

impl ScrapeError {
    /// Generic step failure caused by `source`.
    pub fn scrape(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ScrapeError::Scrape {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Generic step failure with no underlying cause.
    pub fn message(message: impl Into<String>) -> Self {
        ScrapeError::Scrape {
            message: message.into(),
            source: None,
        }
    }

    /// A search without results is a reportable outcome rather than a fault.
    pub fn is_expected(&self) -> bool {
        matches!(self, ScrapeError::NoResults(_))
    }
}
