//! Run inputs: loading the work item and validating it.
//!
//! The three inputs (`search_term`, `search_category`, `number_of_months`)
//! come from a work item JSON file, from the command line, or both, with the
//! command line taking precedence. The work item is either a flat object or
//! wraps the variables in a `payload` object:
//!
//! ```json
//! { "payload": { "search_term": "election", "search_category": "News", "number_of_months": 2 } }
//! ```

use crate::errors::ScrapeError;
use crate::models::SearchQuery;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, instrument};

pub const SEARCH_TERM: &str = "search_term";
pub const SEARCH_CATEGORY: &str = "search_category";
pub const NUMBER_OF_MONTHS: &str = "number_of_months";

/// Inputs as supplied, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawInputs {
    #[serde(default, deserialize_with = "as_text")]
    pub search_term: Option<String>,
    #[serde(default, deserialize_with = "as_text")]
    pub search_category: Option<String>,
    #[serde(default, deserialize_with = "as_text")]
    pub number_of_months: Option<String>,
}

/// Accept strings and numbers alike; `null` means absent.
fn as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl RawInputs {
    /// Read the variables of a work item file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_work_item(path: &Path) -> Result<Self, ScrapeError> {
        let work_item_error =
            |source: Box<dyn std::error::Error + Send + Sync>| ScrapeError::WorkItem {
                path: path.display().to_string(),
                source,
            };

        let text = std::fs::read_to_string(path).map_err(|e| work_item_error(e.into()))?;
        let mut document: Value =
            serde_json::from_str(&text).map_err(|e| work_item_error(e.into()))?;
        let payload = document
            .get_mut("payload")
            .filter(|p| p.is_object())
            .map(Value::take);
        let variables = payload.unwrap_or(document);
        let inputs: RawInputs =
            serde_json::from_value(variables).map_err(|e| work_item_error(e.into()))?;
        info!("Loaded work item");
        Ok(inputs)
    }

    /// Fill the gaps in `self` from `fallback`.
    pub fn or(self, fallback: RawInputs) -> RawInputs {
        RawInputs {
            search_term: self.search_term.or(fallback.search_term),
            search_category: self.search_category.or(fallback.search_category),
            number_of_months: self.number_of_months.or(fallback.number_of_months),
        }
    }

    /// Check that every input is present and the month count is a number.
    pub fn validate(self) -> Result<SearchQuery, ScrapeError> {
        let phrase = required(self.search_term, SEARCH_TERM)?;
        let category = required(self.search_category, SEARCH_CATEGORY)?;
        let months_text = required(self.number_of_months, NUMBER_OF_MONTHS)?;

        let months = months_text.parse::<u32>().map_err(|_| {
            error!(value = %months_text, "Number of months is invalid, please specify a number.");
            ScrapeError::InvalidArgument {
                argument: NUMBER_OF_MONTHS,
                value: months_text.clone(),
            }
        })?;

        Ok(SearchQuery {
            phrase,
            category,
            months,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ScrapeError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            error!(argument = name, "Required input is missing");
            Err(ScrapeError::MissingArgument(name))
        }
    }
}
