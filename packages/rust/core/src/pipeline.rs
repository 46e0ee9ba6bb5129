//! Incremental enrichment pipeline over a spreadsheet of URLs.
//!
//! Reads the configured range, computes the work set (URLs without an
//! existing summary), drives fetch → summarize → categorize per URL, and
//! merges the accumulated results over the original rows for a single
//! full-range write-back. Per-URL failures are logged and isolated; the
//! affected row is written back exactly as it was read.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use sheetsum_shared::{Result, Row, SummaryMap, UrlSummary};

use crate::categorize::categorize;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Retrieves the visible text content of a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its visible text. Errors with
    /// [`sheetsum_shared::SheetsumError::Fetch`] on network failure or a
    /// non-success status.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Reduces raw page text to a short abstractive summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`. Errors with
    /// [`sheetsum_shared::SheetsumError::Summarize`] on inference failure;
    /// never partially succeeds.
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Row-oriented spreadsheet transport.
///
/// `write_rows` is a full overwrite of the given range, not a patch — the
/// caller must supply the complete intended contents, which is why the
/// pipeline reconstructs the whole row set before writing.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read the rows of `range`, ragged rows allowed.
    async fn read_rows(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Row>>;

    /// Overwrite `range` with `rows`.
    async fn write_rows(&self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Run config & report
// ---------------------------------------------------------------------------

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Spreadsheet identifier.
    pub spreadsheet_id: String,
    /// A1-notation range to read.
    pub read_range: String,
    /// A1-notation range to write.
    pub write_range: String,
}

/// Outcome counts for a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// URLs found in the sheet (header excluded, duplicates kept).
    pub urls_found: usize,
    /// URLs skipped because a summary already existed.
    pub skipped_existing: usize,
    /// URLs summarized and categorized this run.
    pub processed: usize,
    /// URLs that failed to fetch or summarize (rows left untouched).
    pub failed: usize,
    /// Rows written back (header included).
    pub rows_written: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Work-set helpers (pure)
// ---------------------------------------------------------------------------

/// Collect the URLs of every non-empty body row, in sheet order.
///
/// Row 0 is the header and is excluded. Duplicates are kept as given.
pub(crate) fn collect_urls(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .skip(1)
        .filter_map(|row| row.url())
        .map(str::to_string)
        .collect()
}

/// Index url → summary for body rows that already carry a non-empty
/// summary cell. Used only for skip-if-present membership; never mutated
/// during a run.
pub(crate) fn existing_summaries(rows: &[Row]) -> HashMap<String, String> {
    rows.iter()
        .skip(1)
        .filter(|row| row.has_summary())
        .filter_map(|row| {
            let url = row.url()?;
            let summary = row.summary()?;
            Some((url.to_string(), summary.to_string()))
        })
        .collect()
}

/// Overlay accumulated results onto the original rows.
///
/// Every row whose URL has a result is replaced by the full
/// `[url, summary, category]` row; every other row (header, already
/// summarized, failed this run) passes through exactly as read.
pub(crate) fn merge_rows(rows: &[Row], results: &SummaryMap) -> Vec<Row> {
    rows.iter()
        .map(|row| match row.url().and_then(|url| results.get(url)) {
            Some(result) => result.to_row(),
            None => row.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run one full enrichment pass over the configured sheet.
///
/// 1. Read all rows
/// 2. Compute the work set (URLs lacking a summary)
/// 3. Fetch → summarize → categorize each work-set URL, sequentially
/// 4. Merge results over the original rows
/// 5. Write the complete merged range back in one call
///
/// Fetch/summarize failures are confined to their URL; transport errors
/// from the store propagate and abort the run.
#[instrument(skip_all, fields(spreadsheet = %config.spreadsheet_id, range = %config.read_range))]
pub async fn run_pipeline(
    config: &RunConfig,
    store: &dyn SheetStore,
    fetcher: &dyn PageFetcher,
    summarizer: &dyn Summarizer,
) -> Result<RunReport> {
    let start = Instant::now();

    let rows = store
        .read_rows(&config.spreadsheet_id, &config.read_range)
        .await?;

    let urls = collect_urls(&rows);
    let existing = existing_summaries(&rows);
    info!(count = urls.len(), "URLs found");

    let mut results: SummaryMap = HashMap::new();
    let mut skipped_existing = 0usize;
    let mut failed = 0usize;

    for url in &urls {
        if existing.contains_key(url) {
            info!(%url, "skipping URL, already has summary");
            skipped_existing += 1;
            continue;
        }

        info!(%url, "processing URL");

        let content = match fetcher.fetch(url).await {
            Ok(content) if !content.is_empty() => content,
            Ok(_) => {
                warn!(%url, "no content fetched for URL");
                failed += 1;
                continue;
            }
            Err(e) => {
                warn!(%url, error = %e, "no content fetched for URL");
                failed += 1;
                continue;
            }
        };
        info!(%url, length = content.len(), "fetched content");

        let summary = match summarizer.summarize(&content).await {
            Ok(summary) if !summary.is_empty() => summary,
            Ok(_) => {
                warn!(%url, "no summary generated for URL");
                failed += 1;
                continue;
            }
            Err(e) => {
                warn!(%url, error = %e, "no summary generated for URL");
                failed += 1;
                continue;
            }
        };

        let category = categorize(&summary);
        info!(%url, %category, "summary generated for URL");

        results.insert(
            url.clone(),
            UrlSummary {
                url: url.clone(),
                summary,
                category,
            },
        );
    }

    info!(count = results.len(), "accumulated summaries");

    let merged = merge_rows(&rows, &results);
    store
        .write_rows(&config.spreadsheet_id, &config.write_range, &merged)
        .await?;

    let report = RunReport {
        urls_found: urls.len(),
        skipped_existing,
        processed: results.len(),
        failed,
        rows_written: merged.len(),
        elapsed: start.elapsed(),
    };

    info!(
        urls_found = report.urls_found,
        skipped_existing = report.skipped_existing,
        processed = report.processed,
        failed = report.failed,
        rows_written = report.rows_written,
        elapsed_ms = report.elapsed.as_millis(),
        "run complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sheetsum_shared::SheetsumError;

    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Row> {
        raw.iter().map(|cells| Row::new(cells.iter().copied())).collect()
    }

    fn result_for(url: &str, summary: &str) -> UrlSummary {
        UrlSummary {
            url: url.into(),
            summary: summary.into(),
            category: categorize(summary),
        }
    }

    // -- pure helper tests --------------------------------------------------

    #[test]
    fn collect_urls_skips_header_and_empty_rows() {
        let rows = rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test"],
            &[],
            &["http://b.test", "sum"],
            &["http://a.test"],
        ]);
        assert_eq!(
            collect_urls(&rows),
            vec!["http://a.test", "http://b.test", "http://a.test"]
        );
    }

    #[test]
    fn existing_summaries_requires_non_empty_second_cell() {
        let rows = rows(&[
            &["URL", "Summary", "Category"],
            &["url1", "sum1", "Cat"],
            &["url2", "", ""],
            &["url3"],
        ]);
        let index = existing_summaries(&rows);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("url1").map(String::as_str), Some("sum1"));
        // url2 and url3 belong to the work set.
        assert!(!index.contains_key("url2"));
        assert!(!index.contains_key("url3"));
    }

    #[test]
    fn existing_summaries_never_indexes_the_header() {
        let rows = rows(&[&["URL", "Summary", "Category"], &["url1", "", ""]]);
        assert!(!existing_summaries(&rows).contains_key("URL"));
    }

    #[test]
    fn merge_replaces_only_rows_with_results() {
        let original = rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
            &["http://b.test"],
            &["http://c.test", "old summary", "Space"],
        ]);
        let mut results = SummaryMap::new();
        results.insert(
            "http://a.test".into(),
            result_for("http://a.test", "quantum breakthroughs"),
        );

        let merged = merge_rows(&original, &results);

        assert_eq!(merged.len(), original.len());
        assert_eq!(merged[0], original[0]);
        assert_eq!(
            merged[1],
            Row::new(["http://a.test", "quantum breakthroughs", "Quantum Physics"])
        );
        // Untouched rows come through exactly as read, short cells included.
        assert_eq!(merged[2], original[2]);
        assert_eq!(merged[3], original[3]);
    }

    #[test]
    fn merge_preserves_row_count_and_order() {
        let original = rows(&[
            &["URL", "Summary", "Category"],
            &["http://b.test", "", ""],
            &["http://a.test", "", ""],
        ]);
        let mut results = SummaryMap::new();
        results.insert("http://a.test".into(), result_for("http://a.test", "s"));
        results.insert("http://b.test".into(), result_for("http://b.test", "s"));

        let merged = merge_rows(&original, &results);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].url(), Some("http://b.test"));
        assert_eq!(merged[2].url(), Some("http://a.test"));
    }

    // -- collaborator fakes -------------------------------------------------

    /// In-memory sheet: serves fixed rows, records the last write.
    struct FakeStore {
        rows: Mutex<Vec<Row>>,
        written: Mutex<Option<Vec<Row>>>,
    }

    impl FakeStore {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows: Mutex::new(rows),
                written: Mutex::new(None),
            }
        }

        fn written(&self) -> Vec<Row> {
            self.written.lock().unwrap().clone().expect("nothing written")
        }
    }

    #[async_trait]
    impl SheetStore for FakeStore {
        async fn read_rows(&self, _id: &str, _range: &str) -> Result<Vec<Row>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn write_rows(&self, _id: &str, _range: &str, rows: &[Row]) -> Result<()> {
            *self.written.lock().unwrap() = Some(rows.to_vec());
            Ok(())
        }
    }

    /// Serves canned page text; unknown URLs fail with a fetch error.
    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, c)| (u.to_string(), c.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| SheetsumError::Fetch(format!("{url}: connection refused")))
        }
    }

    /// Returns the input text unchanged as its "summary".
    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    /// Always fails, for summarize-isolation tests.
    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Err(SheetsumError::Summarize("model unavailable".into()))
        }
    }

    fn run_config() -> RunConfig {
        RunConfig {
            spreadsheet_id: "sheet-1".into(),
            read_range: "Sheet1!A:C".into(),
            write_range: "Sheet1!A:C".into(),
        }
    }

    // -- pipeline tests -----------------------------------------------------

    #[tokio::test]
    async fn end_to_end_writes_summary_and_category() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
        ]));
        let fetcher = FakeFetcher::new(&[(
            "http://a.test",
            "quantum entangled particles in a black hole",
        )]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("run");

        assert_eq!(report.urls_found, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(
            store.written(),
            rows(&[
                &["URL", "Summary", "Category"],
                &[
                    "http://a.test",
                    "quantum entangled particles in a black hole",
                    "Quantum Physics, Space"
                ],
            ])
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_isolated_to_its_row() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
            &["http://b.test", "", ""],
            &["http://c.test", "", ""],
        ]));
        // B is unreachable; A and C succeed.
        let fetcher = FakeFetcher::new(&[
            ("http://a.test", "galaxy survey results"),
            ("http://c.test", "inflation and market trends"),
        ]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("run");

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);

        let written = store.written();
        assert_eq!(written.len(), 4);
        assert_eq!(
            written[1],
            Row::new(["http://a.test", "galaxy survey results", "Space"])
        );
        // B's row is byte-identical to what was read.
        assert_eq!(written[2], Row::new(["http://b.test", "", ""]));
        assert_eq!(
            written[3],
            Row::new(["http://c.test", "inflation and market trends", "Economics"])
        );
    }

    #[tokio::test]
    async fn summarize_failure_leaves_row_untouched() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
        ]));
        let fetcher = FakeFetcher::new(&[("http://a.test", "some page text")]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &FailingSummarizer)
            .await
            .expect("run");

        assert_eq!(report.processed, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(store.written()[1], Row::new(["http://a.test", "", ""]));
    }

    #[tokio::test]
    async fn already_summarized_urls_are_skipped() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["url1", "sum1", "Cat"],
            &["url2", "", ""],
        ]));
        // Only url2 belongs to the work set; url1 must not be fetched.
        let fetcher = FakeFetcher::new(&[("url2", "robotics factory tour")]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("run");

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);

        let written = store.written();
        assert_eq!(written[1], Row::new(["url1", "sum1", "Cat"]));
        assert_eq!(
            written[2],
            Row::new(["url2", "robotics factory tour", "Engineering"])
        );
    }

    #[tokio::test]
    async fn second_run_is_a_pass_through() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
        ]));
        let fetcher = FakeFetcher::new(&[("http://a.test", "clinical trials update")]);

        run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("first run");
        let first_written = store.written();

        // Feed the first run's output back in; the work set is now empty.
        let store2 = FakeStore::new(first_written.clone());
        let report = run_pipeline(&run_config(), &store2, &fetcher, &EchoSummarizer)
            .await
            .expect("second run");

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.processed, 0);
        assert_eq!(store2.written(), first_written);
    }

    #[tokio::test]
    async fn empty_fetched_content_counts_as_failure() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
        ]));
        let fetcher = FakeFetcher::new(&[("http://a.test", "")]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("run");

        assert_eq!(report.processed, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(store.written()[1], Row::new(["http://a.test", "", ""]));
    }

    #[tokio::test]
    async fn transport_error_aborts_the_run() {
        struct BrokenStore;

        #[async_trait]
        impl SheetStore for BrokenStore {
            async fn read_rows(&self, _id: &str, _range: &str) -> Result<Vec<Row>> {
                Err(SheetsumError::Transport("read failed: HTTP 500".into()))
            }

            async fn write_rows(&self, _id: &str, _range: &str, _rows: &[Row]) -> Result<()> {
                unreachable!("read already failed")
            }
        }

        let fetcher = FakeFetcher::new(&[]);
        let err = run_pipeline(&run_config(), &BrokenStore, &fetcher, &EchoSummarizer)
            .await
            .expect_err("transport errors propagate");
        assert!(matches!(err, SheetsumError::Transport(_)));
    }

    #[tokio::test]
    async fn duplicate_urls_resolve_to_one_result() {
        let store = FakeStore::new(rows(&[
            &["URL", "Summary", "Category"],
            &["http://a.test", "", ""],
            &["http://a.test", "", ""],
        ]));
        let fetcher = FakeFetcher::new(&[("http://a.test", "gravity waves detected")]);

        let report = run_pipeline(&run_config(), &store, &fetcher, &EchoSummarizer)
            .await
            .expect("run");

        // Both occurrences are walked, both rows get the same result.
        assert_eq!(report.urls_found, 2);
        assert_eq!(report.processed, 1);
        let written = store.written();
        assert_eq!(written[1], written[2]);
    }
}
