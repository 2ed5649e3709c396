//! The bulk data-reconciliation importer: reads a delimited source of
//! heterogeneous records, dispatches each row by its type tag, normalizes
//! fields, resolves entities by natural key (creating stubs on demand),
//! links junctions, and aggregates per-record outcomes into a single
//! report. Only the resolver and linker touch persistent state.

pub mod dispatch;
pub mod entities;
pub mod linker;
pub mod links;
pub mod normalize;
pub mod reader;
pub mod report;
pub mod resolver;

use crate::error::Result;
use crate::importer::dispatch::RecordKind;
use crate::importer::reader::{RawRecord, SourceReader};
use crate::importer::report::{ImportReport, Outcome};
use crate::storage::DataStore;
use metrics::{counter, histogram};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub struct Importer {
    store: Arc<dyn DataStore>,
    op_timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl Importer {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            op_timeout: Duration::from_secs(30),
            cancel: None,
        }
    }

    /// Bound the persistence work for a single record.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Cooperative cancellation, checked between records. Records already
    /// committed stay committed.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run a full import of one source file.
    ///
    /// Never returns an error: a source-level failure yields the
    /// distinguished all-failed report, and per-record failures are counted
    /// and diagnosed without interrupting the batch.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn import_file(&self, path: &Path) -> ImportReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, "starting import run");
        counter!("cinetrack_import_runs_total").increment(1);

        let source = match SourceReader::open(path) {
            Ok(source) => source,
            Err(e) => {
                error!(%run_id, "{e}");
                return ImportReport::fatal(e.to_string());
            }
        };

        let mut report = ImportReport::default();
        let mut row_number = 0usize;
        for record in source.records() {
            if self.is_cancelled() {
                warn!(%run_id, row_number, "import cancelled by caller");
                break;
            }
            row_number += 1;

            // A record that cannot be decoded means the source itself is
            // bad; abandon the batch with the all-failed result
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    error!(%run_id, row_number, "{e}");
                    return ImportReport::fatal(e.to_string());
                }
            };

            let Some(kind) = RecordKind::of_record(&record) else {
                debug!(row_number, "unknown or empty record type");
                report.record_skipped();
                continue;
            };

            match tokio::time::timeout(self.op_timeout, self.apply_record(kind, &record)).await {
                Ok(Ok(Outcome::Inserted)) => {
                    counter!("cinetrack_records_total", "outcome" => "inserted").increment(1);
                    report.record_inserted();
                }
                Ok(Ok(Outcome::Skipped)) => {
                    counter!("cinetrack_records_total", "outcome" => "skipped").increment(1);
                    report.record_skipped();
                }
                Ok(Err(e)) => {
                    counter!("cinetrack_records_total", "outcome" => "failed").increment(1);
                    warn!(row_number, tag = kind.tag(), "record failed: {e}");
                    report.record_failed(row_number, kind.tag(), e.to_string());
                }
                Err(_) => {
                    counter!("cinetrack_records_total", "outcome" => "failed").increment(1);
                    warn!(row_number, tag = kind.tag(), "record timed out");
                    report.record_failed(
                        row_number,
                        kind.tag(),
                        format!("persistence timed out after {:?}", self.op_timeout),
                    );
                }
            }
        }

        histogram!("cinetrack_import_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            %run_id,
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            "import run finished"
        );
        report
    }

    async fn apply_record(&self, kind: RecordKind, record: &RawRecord) -> Result<Outcome> {
        let store = self.store.as_ref();
        match kind {
            RecordKind::User => entities::user_row(store, record).await,
            RecordKind::Title => entities::title_row(store, record).await,
            RecordKind::Genre => entities::genre_row(store, record).await,
            RecordKind::CastMember => entities::cast_row(store, record).await,
            RecordKind::Studio => entities::studio_row(store, record).await,
            RecordKind::Platform => entities::platform_row(store, record).await,
            RecordKind::Episode => entities::episode_row(store, record).await,
            RecordKind::Review => entities::review_row(store, record).await,
            RecordKind::Donation => entities::donation_row(store, record).await,
            RecordKind::TitleGenre => links::title_genre_row(store, record).await,
            RecordKind::TitleCast => links::title_cast_row(store, record).await,
            RecordKind::TitleStudio => links::title_studio_row(store, record).await,
            RecordKind::TitlePlatform => links::title_platform_row(store, record).await,
            RecordKind::Distribution => links::distribution_row(store, record).await,
            RecordKind::Follow => links::follow_row(store, record).await,
            RecordKind::ContainsEpisode => links::contains_episode_row(store, record).await,
        }
    }
}
