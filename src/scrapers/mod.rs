//! Site-specific search steps.
//!
//! A news site is scraped through the [`NewsSite`] step contract. The
//! sequencing of the steps lives once in [`crate::workflow::ScrapeWorkflow`];
//! each module here knows the page structure of one site.
//!
//! # Supported Sources
//!
//! | Source | Module | Search | Pagination |
//! |--------|--------|--------|------------|
//! | CBC News | [`cbc`] | Header search box, category and sort selects | "Load more" button |

use crate::errors::ScrapeError;
use crate::workflow::SessionState;

pub mod cbc;

/// The steps of a search run on one site.
///
/// Steps run strictly in order, each awaited before the next. Extraction
/// steps record their progress in the [`SessionState`] they are handed.
// Steps are awaited in place by the workflow and never spawned.
#[allow(async_fn_in_trait)]
pub trait NewsSite {
    /// Navigate to the site's front page.
    async fn open_site(&mut self) -> Result<(), ScrapeError>;

    /// Submit the search phrase.
    async fn enter_search_phrase(&mut self) -> Result<(), ScrapeError>;

    /// Fail with [`ScrapeError::NoResults`] when the search found nothing.
    ///
    /// Sites without a reliable empty-results marker keep the default.
    async fn verify_search_results(&mut self) -> Result<(), ScrapeError> {
        Ok(())
    }

    /// Narrow the results to the configured category.
    ///
    /// Sites without a category filter keep the default.
    async fn select_category_if_exists(&mut self) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn sort_results_by_latest(&mut self) -> Result<(), ScrapeError>;

    /// Extract the not yet visited results currently on the page.
    ///
    /// Clears [`SessionState::can_navigate_to_next_page`] once an article
    /// falls outside the recency window.
    async fn extract_current_page(
        &mut self,
        session: &mut SessionState,
    ) -> Result<(), ScrapeError>;

    /// Load the next batch of results.
    async fn navigate_to_next_page(&mut self) -> Result<(), ScrapeError>;
}
