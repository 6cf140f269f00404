//! Browser automation seam.
//!
//! Site scrapers talk to the page through the [`Browser`] trait rather than to
//! a WebDriver session directly. [`WebDriverBrowser`] drives a real Chrome
//! through `thirtyfour`; tests substitute an in-memory page.
//!
//! Elements are addressed with [`Locator`], which renders like the usual
//! Selenium locator strings (`id:searchButton`, `class:loadMore`, `tag:a`).

use crate::errors::BrowserError;
use rand::{Rng, rng};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use tracing::{debug, info, instrument};

/// How often a visibility wait polls the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Element lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(&'static str),
    Class(&'static str),
    Tag(&'static str),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id:{v}"),
            Locator::Class(v) => write!(f, "class:{v}"),
            Locator::Tag(v) => write!(f, "tag:{v}"),
        }
    }
}

impl From<Locator> for By {
    fn from(locator: Locator) -> Self {
        match locator {
            Locator::Id(v) => By::Id(v),
            Locator::Class(v) => By::ClassName(v),
            Locator::Tag(v) => By::Tag(v),
        }
    }
}

/// The page operations a site scraper needs.
///
/// All calls block the run until they complete; none of them retry.
///
/// Only [`BrowserError::NotFound`] and [`BrowserError::Timeout`] mean the page
/// lacks an element. Driver and session failures surface as
/// [`BrowserError::WebDriver`].
// Futures are awaited on the calling task and never sent across threads.
#[allow(async_fn_in_trait)]
pub trait Browser {
    /// Handle to an element on the current page.
    type Element: Clone;

    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn find(&self, locator: Locator) -> Result<Self::Element, BrowserError>;

    async fn find_in(
        &self,
        parent: &Self::Element,
        locator: Locator,
    ) -> Result<Self::Element, BrowserError>;

    async fn find_all_in(
        &self,
        parent: &Self::Element,
        locator: Locator,
    ) -> Result<Vec<Self::Element>, BrowserError>;

    /// Wait until an element matching `locator` is displayed.
    async fn wait_until_visible(
        &self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<Self::Element, BrowserError>;

    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn input_text(&self, element: &Self::Element, text: &str) -> Result<(), BrowserError>;

    async fn press_enter(&self, element: &Self::Element) -> Result<(), BrowserError>;

    /// Pick the option whose visible label is `label` in a `<select>`.
    async fn select_by_label(
        &self,
        element: &Self::Element,
        label: &str,
    ) -> Result<(), BrowserError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    /// End the browser session.
    async fn close(&self) -> Result<(), BrowserError>;

    async fn click_when_visible(
        &self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let element = self.wait_until_visible(locator, timeout).await?;
        self.click(&element).await
    }
}

/// Turn a missing element into `absent`, keeping every other driver error.
fn absent_or(err: WebDriverError, absent: impl FnOnce() -> BrowserError) -> BrowserError {
    match err {
        WebDriverError::NoSuchElement(_) => absent(),
        other => BrowserError::WebDriver(other),
    }
}

/// Desktop Chrome user agent with a randomized build number.
pub fn random_user_agent() -> String {
    let mut rng = rng();
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.{}.124 Safari/537.36",
        rng.random_range(90..=110),
        rng.random_range(1000..=9999)
    )
}

/// A Chrome session behind a WebDriver server such as `chromedriver`.
#[derive(Clone)]
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl fmt::Debug for WebDriverBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverBrowser").finish_non_exhaustive()
    }
}

impl WebDriverBrowser {
    /// Start a Chrome session on the WebDriver server at `server_url`.
    ///
    /// The news site blocks obvious automation, so the session presents a
    /// randomized desktop user agent.
    #[instrument(level = "info")]
    pub async fn launch(server_url: &str, headless: bool) -> Result<Self, BrowserError> {
        let user_agent = random_user_agent();
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg(&format!("--user-agent={user_agent}"))?;
        caps.add_arg("--window-size=1920,1080")?;
        if headless {
            caps.add_arg("--headless=new")?;
        }

        let driver = WebDriver::new(server_url, caps).await?;
        driver.maximize_window().await?;
        info!(%user_agent, headless, "Browser session started");
        Ok(Self { driver })
    }
}

impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn find(&self, locator: Locator) -> Result<WebElement, BrowserError> {
        self.driver
            .find(By::from(locator))
            .await
            .map_err(|e| absent_or(e, || BrowserError::NotFound(locator.to_string())))
    }

    async fn find_in(
        &self,
        parent: &WebElement,
        locator: Locator,
    ) -> Result<WebElement, BrowserError> {
        parent
            .find(By::from(locator))
            .await
            .map_err(|e| absent_or(e, || BrowserError::NotFound(locator.to_string())))
    }

    async fn find_all_in(
        &self,
        parent: &WebElement,
        locator: Locator,
    ) -> Result<Vec<WebElement>, BrowserError> {
        Ok(parent.find_all(By::from(locator)).await?)
    }

    async fn wait_until_visible(
        &self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<WebElement, BrowserError> {
        debug!(%locator, ?timeout, "Waiting for element");
        self.driver
            .query(By::from(locator))
            .wait(timeout, POLL_INTERVAL)
            .and_displayed()
            .first()
            .await
            .map_err(|e| {
                absent_or(e, || BrowserError::Timeout {
                    locator: locator.to_string(),
                    timeout,
                })
            })
    }

    async fn click(&self, element: &WebElement) -> Result<(), BrowserError> {
        element.click().await?;
        Ok(())
    }

    async fn input_text(&self, element: &WebElement, text: &str) -> Result<(), BrowserError> {
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn press_enter(&self, element: &WebElement) -> Result<(), BrowserError> {
        element.send_keys(Key::Enter).await?;
        Ok(())
    }

    async fn select_by_label(&self, element: &WebElement, label: &str) -> Result<(), BrowserError> {
        let select = SelectElement::new(element).await?;
        select
            .select_by_visible_text(label)
            .await
            .map_err(|e| absent_or(e, || BrowserError::OptionNotFound(label.to_string())))
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<(), BrowserError> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn text(&self, element: &WebElement) -> Result<String, BrowserError> {
        Ok(element.text().await?)
    }

    async fn attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(element.attr(name.to_string()).await?)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.driver.screenshot(path).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.driver.clone().quit().await?;
        info!("Browser session closed");
        Ok(())
    }
}
