//! Test doubles: an in-memory results page behind [`Browser`] and a tiny HTTP
//! server for thumbnail downloads.

use crate::browser::{Browser, Locator};
use crate::errors::BrowserError;
use thirtyfour::error::WebDriverError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One result card on the fake page.
#[derive(Debug, Clone)]
pub struct FakeCard {
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub image_src: String,
    /// Reading the headline of this card fails.
    pub broken: bool,
}

impl FakeCard {
    pub fn new(title: &str, timestamp: &str, image_src: &str) -> Self {
        Self {
            title: title.to_string(),
            description: format!("About {title}"),
            timestamp: timestamp.to_string(),
            image_src: image_src.to_string(),
            broken: false,
        }
    }
}

/// State of the fake results page.
#[derive(Debug, Default)]
pub struct FakePage {
    pub url: Option<String>,
    pub has_results: bool,
    pub has_cookie_banner: bool,
    pub has_category_filter: bool,
    pub categories: Vec<String>,
    pub selected_category: Option<String>,
    pub selected_sort: Option<String>,
    pub typed: String,
    pub submitted: Option<String>,
    /// Cards currently rendered, in list order.
    pub cards: Vec<FakeCard>,
    /// Batches appended by successive clicks on "load more".
    pub more_pages: Vec<Vec<FakeCard>>,
    /// Card indices whose timestamp was read, in order.
    pub visited: Vec<usize>,
    /// Hides the search input so submitting a search fails.
    pub search_broken: bool,
    pub screenshots: Vec<PathBuf>,
    /// Every lookup fails as if the WebDriver session had died.
    pub session_lost: bool,
}

/// Element handles on the fake page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeElement {
    CookieButton,
    SearchButton,
    SearchInput,
    ResultsWrapper,
    CategorySelect,
    SortSelect,
    CardList,
    LoadMore,
    Card(usize),
    Timestamp(usize),
    Headline(usize),
    Description(usize),
    ImageMedia(usize),
    Image(usize),
}

/// A [`Browser`] over a shared [`FakePage`]; clones observe the same page.
#[derive(Debug, Clone, Default)]
pub struct FakeBrowser {
    pub page: Arc<Mutex<FakePage>>,
}

impl FakeBrowser {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
        }
    }

    /// A page with results, a category filter offering `categories`, and `cards`.
    pub fn with_cards(categories: &[&str], cards: Vec<FakeCard>) -> Self {
        Self::new(FakePage {
            has_results: true,
            has_cookie_banner: true,
            has_category_filter: true,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            cards,
            ..FakePage::default()
        })
    }

    fn lookup(&self, locator: Locator) -> Result<FakeElement, BrowserError> {
        let page = self.page.lock().unwrap();
        if page.session_lost {
            return Err(BrowserError::WebDriver(WebDriverError::RequestFailed(
                "invalid session id".to_string(),
            )));
        }
        let element = match locator {
            Locator::Id("didomi-notice-agree-button") if page.has_cookie_banner => {
                FakeElement::CookieButton
            }
            Locator::Id("searchButton") => FakeElement::SearchButton,
            Locator::Id("gn-compact-search") if !page.search_broken => FakeElement::SearchInput,
            Locator::Class("contentListWrapper") if page.has_results => FakeElement::ResultsWrapper,
            Locator::Class("contentListCards") if page.has_results => FakeElement::CardList,
            Locator::Id("searchFilterSelect") if page.has_category_filter => {
                FakeElement::CategorySelect
            }
            Locator::Id("sortOrderSelect") if page.has_results => FakeElement::SortSelect,
            Locator::Class("loadMore") if !page.more_pages.is_empty() => FakeElement::LoadMore,
            _ => return Err(BrowserError::NotFound(locator.to_string())),
        };
        Ok(element)
    }
}

impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page.lock().unwrap().url = Some(url.to_string());
        Ok(())
    }

    async fn find(&self, locator: Locator) -> Result<FakeElement, BrowserError> {
        self.lookup(locator)
    }

    async fn find_in(
        &self,
        parent: &FakeElement,
        locator: Locator,
    ) -> Result<FakeElement, BrowserError> {
        let page = self.page.lock().unwrap();
        match (*parent, locator) {
            (FakeElement::Card(i), Locator::Class("timeStamp")) => Ok(FakeElement::Timestamp(i)),
            (FakeElement::Card(i), Locator::Class("headline")) if !page.cards[i].broken => {
                Ok(FakeElement::Headline(i))
            }
            (FakeElement::Card(i), Locator::Class("description")) => {
                Ok(FakeElement::Description(i))
            }
            (FakeElement::Card(i), Locator::Class("imageMedia")) => Ok(FakeElement::ImageMedia(i)),
            (FakeElement::ImageMedia(i), Locator::Tag("img")) => Ok(FakeElement::Image(i)),
            _ => Err(BrowserError::NotFound(locator.to_string())),
        }
    }

    async fn find_all_in(
        &self,
        parent: &FakeElement,
        locator: Locator,
    ) -> Result<Vec<FakeElement>, BrowserError> {
        let page = self.page.lock().unwrap();
        match (*parent, locator) {
            (FakeElement::CardList, Locator::Tag("a")) => {
                Ok((0..page.cards.len()).map(FakeElement::Card).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn wait_until_visible(
        &self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<FakeElement, BrowserError> {
        self.lookup(locator).map_err(|e| match e {
            BrowserError::NotFound(_) => BrowserError::Timeout {
                locator: locator.to_string(),
                timeout,
            },
            other => other,
        })
    }

    async fn click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        let mut page = self.page.lock().unwrap();
        match element {
            FakeElement::CookieButton => page.has_cookie_banner = false,
            FakeElement::LoadMore => {
                let next = page.more_pages.remove(0);
                page.cards.extend(next);
            }
            _ => {}
        }
        Ok(())
    }

    async fn input_text(&self, _element: &FakeElement, text: &str) -> Result<(), BrowserError> {
        self.page.lock().unwrap().typed = text.to_string();
        Ok(())
    }

    async fn press_enter(&self, _element: &FakeElement) -> Result<(), BrowserError> {
        let mut page = self.page.lock().unwrap();
        page.submitted = Some(page.typed.clone());
        Ok(())
    }

    async fn select_by_label(
        &self,
        element: &FakeElement,
        label: &str,
    ) -> Result<(), BrowserError> {
        let mut page = self.page.lock().unwrap();
        match element {
            FakeElement::CategorySelect if page.categories.iter().any(|c| c == label) => {
                page.selected_category = Some(label.to_string());
                Ok(())
            }
            FakeElement::SortSelect if label == "Most recent" => {
                page.selected_sort = Some(label.to_string());
                Ok(())
            }
            _ => Err(BrowserError::OptionNotFound(label.to_string())),
        }
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, BrowserError> {
        let page = self.page.lock().unwrap();
        match *element {
            FakeElement::Headline(i) => Ok(page.cards[i].title.clone()),
            FakeElement::Description(i) => Ok(page.cards[i].description.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let mut page = self.page.lock().unwrap();
        match (*element, name) {
            (FakeElement::Timestamp(i), "datetime") => {
                page.visited.push(i);
                Ok(Some(page.cards[i].timestamp.clone()))
            }
            (FakeElement::Image(i), "src") => Ok(Some(page.cards[i].image_src.clone())),
            _ => Ok(None),
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.page.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Requests seen by [`serve_images`], one entry per request head.
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Answer every HTTP request with `status` and `body`; returns the base URL.
pub async fn serve_images(status: u16, body: &'static [u8]) -> (String, SeenRequests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            log.lock().unwrap().push(String::from_utf8_lossy(&head).into_owned());

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), seen)
}
