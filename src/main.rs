//! Task entrypoint: validate the inputs, start the browser, run the search.
//!
//! ```sh
//! news_search_scraper --work-item ./work-item.json
//! ```
//!
//! Exits non-zero when any step fails; articles collected before the failure
//! are still in `output/search_results.xlsx`.

use clap::Parser;
use news_search_scraper::browser::{Browser, WebDriverBrowser};
use news_search_scraper::cli::Cli;
use news_search_scraper::inputs::RawInputs;
use news_search_scraper::scrapers::cbc::CbcNews;
use news_search_scraper::utils::ensure_writable_dir;
use news_search_scraper::workflow::{OutputTarget, ScrapeWorkflow};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Base name of the results workbook inside the output directory.
const RESULTS_BASE_NAME: &str = "search_results";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("search_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Inputs ----
    let mut raw = args.inputs();
    if let Some(path) = &args.work_item {
        raw = raw.or(RawInputs::from_work_item(path)?);
    }
    let query = match raw.validate() {
        Ok(query) => query,
        Err(e) => {
            error!(error = %e, "Invalid task input");
            return Err(e.into());
        }
    };
    info!(
        phrase = %query.phrase,
        category = %query.category,
        months = query.months,
        "Validated task input"
    );

    // Early check: the spreadsheet must be writable even if the run fails
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Browser ----
    info!(url = %args.site_url, webdriver = %args.webdriver_url, "Opening browser");
    let browser = WebDriverBrowser::launch(&args.webdriver_url, !args.headed).await?;

    // ---- Scrape ----
    let phrase = query.phrase.clone();
    let site = CbcNews::new(browser.clone(), query, args.site_url.clone(), &args.output_dir);
    let mut workflow = ScrapeWorkflow::new(
        site,
        phrase,
        OutputTarget {
            dir: args.output_dir.clone(),
            base_name: RESULTS_BASE_NAME.to_string(),
        },
    );
    let outcome = workflow.run().await;

    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close browser session");
    }
    outcome?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = workflow.session().articles.len(),
        "Execution complete"
    );
    Ok(())
}
