//! # News Search Scraper
//!
//! Searches a news site for a phrase through a real browser, walks the
//! results newest first until they fall outside a recency window, saves each
//! article's thumbnail, and writes the collected articles to a spreadsheet.
//!
//! ## Architecture
//!
//! 1. **Inputs**: work item and command line are merged and validated ([`inputs`])
//! 2. **Site steps**: search, filter, sort, extract and paginate ([`scrapers`])
//!    through a [`browser::Browser`]
//! 3. **Run**: the steps are sequenced once, with the session state and the
//!    guaranteed final write ([`workflow`])
//! 4. **Output**: thumbnails and the `.xlsx` workbook ([`outputs`])

pub mod browser;
pub mod cli;
pub mod cutoff;
pub mod errors;
pub mod inputs;
pub mod models;
pub mod outputs;
pub mod scrapers;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;
