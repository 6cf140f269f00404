//! CBC News search scraper.
//!
//! Drives the search page of [CBC News](https://www.cbc.ca/): the header
//! search box, the category and sort `<select>`s above the results, and the
//! "Load more" button that appends further cards to the same list.
//!
//! # Page Structure
//!
//! Result cards are the `<a>` children of `.contentListCards`. The list only
//! grows when more results are loaded, so extraction resumes at the first
//! card not yet visited instead of starting over.

use super::NewsSite;
use crate::browser::{Browser, Locator};
use crate::cutoff;
use crate::errors::{BrowserError, ScrapeError};
use crate::models::{Article, SearchQuery};
use crate::outputs::images::ImageFetcher;
use crate::utils::{parse_published_at, truncate_for_log};
use crate::workflow::SessionState;
use chrono::{Local, NaiveDate};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const COOKIE_ACCEPT: Locator = Locator::Id("didomi-notice-agree-button");
const SEARCH_BUTTON: Locator = Locator::Id("searchButton");
const SEARCH_INPUT: Locator = Locator::Id("gn-compact-search");
const RESULTS: Locator = Locator::Class("contentListWrapper");
const CATEGORY_SELECT: Locator = Locator::Id("searchFilterSelect");
const SORT_SELECT: Locator = Locator::Id("sortOrderSelect");
const CARD_LIST: Locator = Locator::Class("contentListCards");
const CARD: Locator = Locator::Tag("a");
const CARD_TIMESTAMP: Locator = Locator::Class("timeStamp");
const CARD_HEADLINE: Locator = Locator::Class("headline");
const CARD_DESCRIPTION: Locator = Locator::Class("description");
const CARD_IMAGE_MEDIA: Locator = Locator::Class("imageMedia");
const CARD_IMAGE: Locator = Locator::Tag("img");
const LOAD_MORE: Locator = Locator::Class("loadMore");

const SORT_LATEST_LABEL: &str = "Most recent";
const SCREENSHOT_FILE: &str = "screenshot.png";

type ItemError = Box<dyn Error + Send + Sync>;

/// Waits used while driving the page.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// How long a search may take to show its results container.
    pub results_timeout: Duration,
    /// How long the card list may take to render.
    pub list_timeout: Duration,
    /// How long a button may take to become clickable.
    pub click_timeout: Duration,
    /// Pause after a filter or sort change while the list re-renders.
    pub settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            results_timeout: Duration::from_secs(15),
            list_timeout: Duration::from_secs(5),
            click_timeout: Duration::from_secs(5),
            settle: Duration::from_secs(3),
        }
    }
}

impl Timings {
    /// No waiting at all, for pages that are already rendered.
    pub fn immediate() -> Self {
        Self {
            results_timeout: Duration::ZERO,
            list_timeout: Duration::ZERO,
            click_timeout: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// What a single result card turned out to be.
enum Card {
    Kept(Article),
    TooOld(NaiveDate),
}

/// Advances the extraction index when an item's processing ends, however it ends.
struct AdvanceOnDrop<'a>(&'a mut usize);

impl Drop for AdvanceOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 += 1;
    }
}

/// CBC News implementation of [`NewsSite`].
pub struct CbcNews<B> {
    browser: B,
    query: SearchQuery,
    site_url: Url,
    output_dir: PathBuf,
    images: ImageFetcher,
    today: NaiveDate,
    timings: Timings,
}

impl<B: Browser> CbcNews<B> {
    /// Scraper for `query` on the site at `site_url`.
    ///
    /// Thumbnails and the failure screenshot go to `output_dir`. The recency
    /// window is measured from today's local date.
    pub fn new(
        browser: B,
        query: SearchQuery,
        site_url: Url,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        Self {
            browser,
            query,
            site_url,
            images: ImageFetcher::new(output_dir.clone()),
            output_dir,
            today: Local::now().date_naive(),
            timings: Timings::default(),
        }
    }

    /// Measure the recency window from `today` instead of the current date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Dismiss the cookie consent banner. Failure is logged and ignored.
    async fn accept_cookies_if_present(&self) {
        match self
            .browser
            .click_when_visible(COOKIE_ACCEPT, self.timings.click_timeout)
            .await
        {
            Ok(()) => {
                debug!("Accepted cookies");
                sleep(self.timings.settle).await;
            }
            Err(e) => warn!(error = %e, "Failed to accept cookies"),
        }
    }

    async fn submit_search(&self) -> Result<(), BrowserError> {
        self.browser
            .click_when_visible(SEARCH_BUTTON, self.timings.click_timeout)
            .await?;
        let input = self.browser.find(SEARCH_INPUT).await?;
        self.browser.input_text(&input, &self.query.phrase).await?;
        self.browser.press_enter(&input).await
    }

    async fn save_screenshot(&self) {
        let path = self.output_dir.join(SCREENSHOT_FILE);
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!(error = %e, "Could not create output directory for screenshot");
            return;
        }
        match self.browser.screenshot(&path).await {
            Ok(()) => info!(path = %path.display(), "Saved page screenshot"),
            Err(e) => warn!(error = %e, "Failed to save page screenshot"),
        }
    }

    /// Read the card at `index` of `list`, downloading its image if it is kept.
    async fn read_card(&self, list: &B::Element, index: usize) -> Result<Card, ItemError> {
        let cards = self.browser.find_all_in(list, CARD).await?;
        let card = cards
            .get(index)
            .ok_or_else(|| format!("result card {} is no longer on the page", index + 1))?;
        self.browser.scroll_into_view(card).await?;

        let stamp = self.browser.find_in(card, CARD_TIMESTAMP).await?;
        let timestamp = self
            .browser
            .attribute(&stamp, "datetime")
            .await?
            .ok_or_else(|| BrowserError::MissingAttribute("datetime".to_string()))?;
        let date = parse_published_at(&timestamp)
            .ok_or_else(|| format!("unrecognized publication timestamp '{timestamp}'"))?;

        if !cutoff::is_within_window(self.today, date, self.query.months) {
            return Ok(Card::TooOld(date));
        }

        let headline = self.browser.find_in(card, CARD_HEADLINE).await?;
        let title = self.browser.text(&headline).await?.trim().to_string();
        let summary = self.browser.find_in(card, CARD_DESCRIPTION).await?;
        let description = self.browser.text(&summary).await?.trim().to_string();

        let media = self.browser.find_in(card, CARD_IMAGE_MEDIA).await?;
        let image = self.browser.find_in(&media, CARD_IMAGE).await?;
        let src = self
            .browser
            .attribute(&image, "src")
            .await?
            .ok_or_else(|| BrowserError::MissingAttribute("src".to_string()))?;
        let image_url = self.site_url.join(&src)?;
        let image_name = self.images.download(image_url.as_str(), &title).await?;

        Ok(Card::Kept(Article {
            title,
            description,
            date,
            image_name,
        }))
    }
}

impl<B: Browser> NewsSite for CbcNews<B> {
    #[instrument(level = "info", skip_all, fields(url = %self.site_url))]
    async fn open_site(&mut self) -> Result<(), ScrapeError> {
        self.browser
            .goto(self.site_url.as_str())
            .await
            .map_err(|e| ScrapeError::scrape(format!("Failed to open {}", self.site_url), e))?;
        info!("Opened news site");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(phrase = %self.query.phrase))]
    async fn enter_search_phrase(&mut self) -> Result<(), ScrapeError> {
        self.accept_cookies_if_present().await;

        if let Err(e) = self.submit_search().await {
            error!(error = %e, "Search could not be submitted");
            self.save_screenshot().await;
            return Err(ScrapeError::scrape(
                format!("Failed to search phrase {}", self.query.phrase),
                e,
            ));
        }
        info!("Submitted search");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(phrase = %self.query.phrase))]
    async fn verify_search_results(&mut self) -> Result<(), ScrapeError> {
        match self
            .browser
            .wait_until_visible(RESULTS, self.timings.results_timeout)
            .await
        {
            Ok(_) => {
                info!("Search returned results");
                Ok(())
            }
            Err(e @ BrowserError::Timeout { .. }) => {
                debug!(error = %e, "Results container never appeared");
                Err(ScrapeError::NoResults(self.query.phrase.clone()))
            }
            Err(e) => Err(ScrapeError::scrape("Failed to check search results.", e)),
        }
    }

    #[instrument(level = "info", skip_all, fields(category = %self.query.category))]
    async fn select_category_if_exists(&mut self) -> Result<(), ScrapeError> {
        info!("Looking for news category");
        let select = match self.browser.find(CATEGORY_SELECT).await {
            Ok(select) => select,
            Err(BrowserError::NotFound(_)) => {
                return Err(ScrapeError::CategoryNotFound(self.query.category.clone()));
            }
            Err(e) => return Err(ScrapeError::scrape("Failed to select news category.", e)),
        };

        match self.browser.select_by_label(&select, &self.query.category).await {
            Ok(()) => {}
            Err(BrowserError::OptionNotFound(_)) => {
                return Err(ScrapeError::CategoryNotFound(self.query.category.clone()));
            }
            Err(e) => return Err(ScrapeError::scrape("Failed to select news category.", e)),
        }

        sleep(self.timings.settle).await;
        info!("Selected news category");
        Ok(())
    }

    #[instrument(level = "info", skip_all)]
    async fn sort_results_by_latest(&mut self) -> Result<(), ScrapeError> {
        let sort = self
            .browser
            .find(SORT_SELECT)
            .await
            .map_err(|e| ScrapeError::scrape("Failed to sort news by latest.", e))?;
        self.browser
            .select_by_label(&sort, SORT_LATEST_LABEL)
            .await
            .map_err(|e| ScrapeError::scrape("Failed to sort news by latest.", e))?;

        // The list re-renders in place after the sort change.
        sleep(self.timings.settle).await;
        info!("Sorted results by latest");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(start = session.last_extracted_index))]
    async fn extract_current_page(
        &mut self,
        session: &mut SessionState,
    ) -> Result<(), ScrapeError> {
        let list = self
            .browser
            .wait_until_visible(CARD_LIST, self.timings.list_timeout)
            .await
            .map_err(|e| ScrapeError::scrape("Search results list did not render.", e))?;
        let count = self
            .browser
            .find_all_in(&list, CARD)
            .await
            .map_err(|e| ScrapeError::scrape("Failed to list news items.", e))?
            .len();
        let start = session.last_extracted_index;
        debug!(start, count, "Extracting news items");

        for index in start..count {
            let _advance = AdvanceOnDrop(&mut session.last_extracted_index);
            info!(item = index + 1, "Processing news item");

            let card = self.read_card(&list, index).await.map_err(|source| {
                error!(item = index + 1, error = %source, "News item extraction failed");
                ScrapeError::Scrape {
                    message: "Error extracting a news item.".to_string(),
                    source: Some(source),
                }
            })?;

            match card {
                Card::TooOld(date) => {
                    info!(
                        %date,
                        months = self.query.months,
                        "Stopping processing. Reached the allowed number of months to scrape."
                    );
                    session.can_navigate_to_next_page = false;
                    break;
                }
                Card::Kept(article) => {
                    info!(
                        title = %truncate_for_log(&article.title, 80),
                        date = %article.date,
                        "News item extracted"
                    );
                    session.articles.push(article);
                }
            }
        }

        info!(total = session.articles.len(), "Finished extracting page");
        Ok(())
    }

    #[instrument(level = "info", skip_all)]
    async fn navigate_to_next_page(&mut self) -> Result<(), ScrapeError> {
        let load_more = self
            .browser
            .find(LOAD_MORE)
            .await
            .map_err(|source| ScrapeError::UnexpectedEndOfNavigation { source })?;
        self.browser
            .scroll_into_view(&load_more)
            .await
            .map_err(|source| ScrapeError::UnexpectedEndOfNavigation { source })?;
        self.browser
            .click_when_visible(LOAD_MORE, self.timings.click_timeout)
            .await
            .map_err(|source| ScrapeError::UnexpectedEndOfNavigation { source })?;
        info!("Loading more news");
        Ok(())
    }
}
