//! Spreadsheet output.
//!
//! Writes the collected articles to `<output_dir>/<base_name>.xlsx`, one row
//! per article in extraction order below a fixed header. A workbook left by a
//! previous run is renamed with its creation time rather than overwritten.

use crate::errors::OutputError;
use crate::models::Article;
use chrono::{DateTime, Local};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Column titles, in sheet order.
pub const HEADER: [&str; 6] = [
    "title",
    "date",
    "description",
    "picture filename",
    "count of search phrase",
    "news contains money",
];

/// Write `articles` to `<output_dir>/<base_name>.xlsx`.
///
/// The phrase count and money flag are computed from each [`Article`] here,
/// at write time. The workbook is built in memory and written in one go.
///
/// # Returns
///
/// The path of the written workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(output_dir = %output_dir.display(), count = articles.len())
)]
pub async fn write_search_results(
    output_dir: &Path,
    base_name: &str,
    articles: &[Article],
    search_phrase: &str,
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(format!("{base_name}.xlsx"));
    if fs::try_exists(&path).await? {
        let archived = archive_existing(output_dir, base_name, &path).await?;
        info!(from = %path.display(), to = %archived.display(), "Kept previous results");
    }

    fs::create_dir_all(output_dir).await?;

    let bytes = render_workbook(articles, search_phrase)?;
    fs::write(&path, bytes).await?;
    info!(path = %path.display(), rows = articles.len() + 1, "Wrote search results");
    Ok(path)
}

fn render_workbook(articles: &[Article], search_phrase: &str) -> Result<Vec<u8>, OutputError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }

    for (i, article) in articles.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &article.title)?;
        sheet.write_string(row, 1, article.date.to_string())?;
        sheet.write_string(row, 2, &article.description)?;
        sheet.write_string(row, 3, &article.image_name)?;
        sheet.write_number(row, 4, article.phrase_count(search_phrase) as f64)?;
        sheet.write_boolean(row, 5, article.mentions_money())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Move an existing workbook aside as `<base_name>_<created>.xlsx`.
async fn archive_existing(
    output_dir: &Path,
    base_name: &str,
    path: &Path,
) -> Result<PathBuf, OutputError> {
    let metadata = fs::metadata(path).await?;
    let created = metadata.created().or_else(|e| {
        warn!(error = %e, "Creation time unavailable; using modification time");
        metadata.modified()
    })?;
    let stamp = DateTime::<Local>::from(created).format("%Y-%m-%d_%H-%M-%S");

    let mut target = output_dir.join(format!("{base_name}_{stamp}.xlsx"));
    let mut counter = 1;
    while fs::try_exists(&target).await? {
        target = output_dir.join(format!("{base_name}_{stamp}_{counter}.xlsx"));
        counter += 1;
    }

    fs::rename(path, &target).await?;
    Ok(target)
}
