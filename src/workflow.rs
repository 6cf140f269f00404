//! The search run, sequenced once over any [`NewsSite`].
//!
//! ```text
//! Start → SearchEntered → ResultsVerified → CategorySelected → Sorted
//!       → Extracting ⇄ Paginating → Done
//! ```
//!
//! Any step may end the run in `Failed`. Whatever was collected up to that
//! point is still written to the spreadsheet before the error is returned.

use crate::errors::ScrapeError;
use crate::models::Article;
use crate::outputs::spreadsheet;
use crate::scrapers::NewsSite;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Where the run has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    SearchEntered,
    ResultsVerified,
    CategorySelected,
    Sorted,
    Extracting,
    Paginating,
    Done,
    Failed,
}

/// Progress of one run.
#[derive(Debug)]
pub struct SessionState {
    /// Number of result cards already visited, across all page loads.
    pub last_extracted_index: usize,
    /// Cleared once an article falls outside the recency window.
    pub can_navigate_to_next_page: bool,
    /// Kept articles in extraction order.
    pub articles: Vec<Article>,
    pub stage: Stage,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            last_extracted_index: 0,
            can_navigate_to_next_page: true,
            articles: Vec::new(),
            stage: Stage::Start,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Spreadsheet destination: `<dir>/<base_name>.xlsx`.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub base_name: String,
}

/// One search run against one site.
pub struct ScrapeWorkflow<S> {
    site: S,
    search_phrase: String,
    output: OutputTarget,
    session: SessionState,
}

impl<S: NewsSite> ScrapeWorkflow<S> {
    pub fn new(site: S, search_phrase: impl Into<String>, output: OutputTarget) -> Self {
        Self {
            site,
            search_phrase: search_phrase.into(),
            output,
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run every step, then persist what was collected.
    ///
    /// The spreadsheet is written whenever at least one article was kept,
    /// including when a step failed. A step failure takes precedence over a
    /// failure to write the spreadsheet.
    #[instrument(level = "info", skip_all, fields(phrase = %self.search_phrase))]
    pub async fn run(&mut self) -> Result<(), ScrapeError> {
        let t0 = Instant::now();
        let outcome = self.run_steps().await;
        let saved = self.save_results().await;

        match outcome {
            Ok(()) => {
                saved?;
                info!(
                    articles = self.session.articles.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Scrape completed"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(write_err) = saved {
                    error!(error = %write_err, "Failed to write partial results");
                }
                let reached = self.session.stage;
                if e.is_expected() {
                    warn!(?reached, error = %e, "Scrape stopped");
                } else {
                    error!(
                        ?reached,
                        error = %e,
                        articles = self.session.articles.len(),
                        "Scrape failed"
                    );
                }
                self.session.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    async fn run_steps(&mut self) -> Result<(), ScrapeError> {
        self.site.open_site().await?;
        self.site.enter_search_phrase().await?;
        self.advance(Stage::SearchEntered);
        self.site.verify_search_results().await?;
        self.advance(Stage::ResultsVerified);
        self.site.select_category_if_exists().await?;
        self.advance(Stage::CategorySelected);
        self.site.sort_results_by_latest().await?;
        self.advance(Stage::Sorted);

        self.advance(Stage::Extracting);
        self.site.extract_current_page(&mut self.session).await?;
        while self.session.can_navigate_to_next_page {
            self.advance(Stage::Paginating);
            self.site.navigate_to_next_page().await?;
            self.advance(Stage::Extracting);
            self.site.extract_current_page(&mut self.session).await?;
        }

        self.advance(Stage::Done);
        Ok(())
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.session.stage, to = ?stage, "Stage change");
        self.session.stage = stage;
    }

    /// Write the spreadsheet if anything was collected.
    async fn save_results(&self) -> Result<Option<PathBuf>, ScrapeError> {
        if self.session.articles.is_empty() {
            info!("No news collected; nothing to write");
            return Ok(None);
        }
        info!(count = self.session.articles.len(), "Writing scraped news to spreadsheet");
        let path = spreadsheet::write_search_results(
            &self.output.dir,
            &self.output.base_name,
            &self.session.articles,
            &self.search_phrase,
        )
        .await?;
        Ok(Some(path))
    }
}
