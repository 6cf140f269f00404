//! Thumbnail downloads.
//!
//! Each kept article gets its thumbnail saved as `<stem>.jpg` in the output
//! directory, where the stem is the sanitized title. Titles that sanitize to
//! the same stem get `_1`, `_2`, … appended; an existing file is never
//! overwritten.
//!
//! A failed download does not stop the run: the article row carries
//! [`DOWNLOAD_FAILED_PLACEHOLDER`] instead of a file name.

use crate::errors::OutputError;
use crate::utils::sanitize_file_stem;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};

/// Written in place of the image file name when the download fails.
pub const DOWNLOAD_FAILED_PLACEHOLDER: &str =
    "An error occurred while downloading the image. Please retry.";

/// Image hosts reject the default reqwest agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

/// Stem used when nothing of the title survives sanitizing.
const FALLBACK_STEM: &str = "image";

/// Downloads thumbnails into one folder.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    folder: PathBuf,
}

impl ImageFetcher {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            folder: folder.into(),
        }
    }

    /// Download `url` and store it under a name derived from `title`.
    ///
    /// # Returns
    ///
    /// The stem of the written file (without folder or `.jpg`), or
    /// [`DOWNLOAD_FAILED_PLACEHOLDER`] if the server did not answer `200 OK`
    /// or could not be reached.
    ///
    /// # Errors
    ///
    /// Fails only if the folder or the file cannot be written.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn download(&self, url: &str, title: &str) -> Result<String, OutputError> {
        fs::create_dir_all(&self.folder).await?;

        let response = match self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(%url, error = %e, "An error occurred when downloading image");
                return Ok(DOWNLOAD_FAILED_PLACEHOLDER.to_string());
            }
        };

        if response.status() != StatusCode::OK {
            error!(%url, status = %response.status(), "An error occurred when downloading image");
            return Ok(DOWNLOAD_FAILED_PLACEHOLDER.to_string());
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%url, error = %e, "Image body could not be read");
                return Ok(DOWNLOAD_FAILED_PLACEHOLDER.to_string());
            }
        };

        let stem = write_unique(&self.folder, &base_stem(title), &bytes).await?;
        info!(%stem, bytes = bytes.len(), "Saved image");
        Ok(stem)
    }
}

fn base_stem(title: &str) -> String {
    let stem = sanitize_file_stem(title);
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Write `bytes` to the first free `<base>[_<n>].jpg` in `folder`.
async fn write_unique(folder: &Path, base: &str, bytes: &[u8]) -> Result<String, OutputError> {
    let mut counter = 0usize;
    loop {
        let stem = if counter == 0 {
            base.to_string()
        } else {
            format!("{base}_{counter}")
        };
        let path = folder.join(format!("{stem}.jpg"));

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(stem);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Image name taken");
                counter += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
