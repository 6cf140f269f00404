//! Command-line interface definitions.
//!
//! Every option can also be set through an environment variable, which is how
//! the task is usually configured when it runs unattended.

use crate::inputs::RawInputs;
use clap::Parser;
use std::path::PathBuf;
use url::Url;

/// Search a news site and save recent matching articles to a spreadsheet.
///
/// # Examples
///
/// ```sh
/// # Inputs from a work item file
/// news_search_scraper --work-item ./work-item.json
///
/// # Inputs on the command line, against a remote chromedriver
/// news_search_scraper --search-term election --search-category News \
///     --number-of-months 2 --webdriver-url http://chrome:4444
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Work item JSON file with search_term, search_category and number_of_months
    #[arg(short, long, env = "WORK_ITEM_PATH")]
    pub work_item: Option<PathBuf>,

    /// Phrase to search for
    #[arg(long, env = "SEARCH_TERM")]
    pub search_term: Option<String>,

    /// Category label to filter the results by
    #[arg(long, env = "SEARCH_CATEGORY")]
    pub search_category: Option<String>,

    /// How many calendar months back to collect articles (0 and 1 both mean the current month)
    #[arg(long, env = "NUMBER_OF_MONTHS")]
    pub number_of_months: Option<String>,

    /// Root URL of the news site
    #[arg(long, env = "NEWS_SITE_URL", default_value = "https://www.cbc.ca/")]
    pub site_url: Url,

    /// Directory for the spreadsheet, images and failure screenshot
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// WebDriver server to start the browser session on
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

impl Cli {
    /// Inputs given directly on the command line or through the environment.
    pub fn inputs(&self) -> RawInputs {
        RawInputs {
            search_term: self.search_term.clone(),
            search_category: self.search_category.clone(),
            number_of_months: self.number_of_months.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_search_scraper", "--work-item", "./item.json"]);

        assert_eq!(cli.work_item, Some(PathBuf::from("./item.json")));
        assert_eq!(cli.site_url.as_str(), "https://www.cbc.ca/");
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert!(!cli.headed);
    }

    #[test]
    fn test_cli_inputs() {
        let cli = Cli::parse_from([
            "news_search_scraper",
            "--search-term",
            "election",
            "--search-category",
            "News",
            "--number-of-months",
            "2",
            "-o",
            "/tmp/out",
            "--headed",
        ]);

        let inputs = cli.inputs();
        assert_eq!(inputs.search_term.as_deref(), Some("election"));
        assert_eq!(inputs.search_category.as_deref(), Some("News"));
        assert_eq!(inputs.number_of_months.as_deref(), Some("2"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
        assert!(cli.headed);
    }

    #[test]
    fn test_cli_rejects_bad_site_url() {
        let result = Cli::try_parse_from(["news_search_scraper", "--site-url", "not a url"]);
        assert!(result.is_err());
    }
}
