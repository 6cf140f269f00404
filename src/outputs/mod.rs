//! Run artifacts written to the output directory.
//!
//! # Submodules
//!
//! - [`images`]: downloads article thumbnails with collision-free names
//! - [`spreadsheet`]: writes the collected articles to an `.xlsx` workbook
//!
//! # Output Structure
//!
//! ```text
//! output/
//! ├── search_results.xlsx
//! ├── search_results_2024-03-05_14-22-10.xlsx   # previous run, renamed
//! ├── FireinBC3dead.jpg
//! ├── FireinBC3dead_1.jpg
//! └── screenshot.png                            # only if the search failed
//! ```

pub mod images;
pub mod spreadsheet;
