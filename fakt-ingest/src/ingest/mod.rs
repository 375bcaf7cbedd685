//! Ingest orchestrator
//!
//! One cycle:
//! 1. Crawl every source in its own task
//! 2. Within a source, enrich and reconcile its events one at a time, in
//!    the order the source returned them
//! 3. Wait for every source task (success or failure)
//! 4. Soft-delete past events
//!
//! [`Ingest::run`] repeats the cycle every `update_frequency` until
//! cancelled. Failures are contained at the smallest scope they affect: a
//! source error ends that source's unit, an event error skips that event,
//! a cleanup error is retried next cycle.

pub mod report;

pub use report::{CycleReport, SourceReport};

use crate::db::{
    event_must_exist, mark_past_events_deleted, performer_must_exist, retry_on_lock,
    venue_must_exist,
};
use crate::error::{IngestError, IngestResult};
use crate::source::Source;
use crate::visitor::VisitorChain;
use chrono_tz::Tz;
use fakt_common::db::Event;
use futures::FutureExt;
use sqlx::{SqliteConnection, SqlitePool};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Pause between the end of one cycle and the start of the next
    pub update_frequency: Duration,
    /// Zone defining "today" for cleanup
    pub timezone: Tz,
    /// How long one event's transaction may keep retrying on lock errors
    pub max_lock_wait: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            update_frequency: Duration::from_secs(3600),
            timezone: chrono_tz::Europe::Berlin,
            max_lock_wait: Duration::from_secs(5),
        }
    }
}

/// Long-lived ingest worker
#[derive(Clone)]
pub struct Ingest {
    pool: SqlitePool,
    settings: IngestSettings,
    sources: Arc<[Arc<dyn Source>]>,
    visitors: VisitorChain,
}

impl Ingest {
    pub fn new(
        pool: SqlitePool,
        settings: IngestSettings,
        sources: Vec<Arc<dyn Source>>,
        visitors: VisitorChain,
    ) -> Self {
        Self {
            pool,
            settings,
            sources: sources.into(),
            visitors,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Run cycles until `cancel` fires.
    ///
    /// Cancellation is observed between cycles and during the sleep; a cycle
    /// in progress always finishes.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            sources = self.sources.len(),
            visitors = ?self.visitors.names(),
            every_secs = self.settings.update_frequency.as_secs(),
            "Ingest started"
        );

        while !cancel.is_cancelled() {
            let report = self.run_cycle().await;
            info!(
                ingested = report.ingested(),
                failed_events = report.failed_events(),
                failed_sources = report.failed_sources(),
                cleaned = ?report.cleaned,
                "Ingest cycle complete"
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.update_frequency) => {}
            }
        }

        info!("Ingest stopped");
    }

    /// One full cycle: parallel crawl, join barrier, cleanup
    pub async fn run_cycle(&self) -> CycleReport {
        let mut tasks = JoinSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let this = self.clone();
            let source = Arc::clone(source);
            let name = source.name().to_string();
            let span = info_span!("crawl", source = %name);

            tasks.spawn(
                async move {
                    let unit = AssertUnwindSafe(this.crawl_source(source.as_ref())).catch_unwind();
                    let report = match unit.await {
                        Ok(report) => report,
                        Err(_) => {
                            error!("Crawl task panicked");
                            SourceReport::crawl_failed(name, "crawl task panicked")
                        }
                    };
                    (index, report)
                }
                .instrument(span),
            );
        }

        let mut reports: Vec<(usize, SourceReport)> = Vec::with_capacity(self.sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(e) => error!(error = %e, "Crawl task did not complete"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);

        let cleaned = match self.cleanup().await {
            Ok(affected) => Some(affected),
            Err(e) => {
                error!(error = %e, "Cleanup failed");
                None
            }
        };

        CycleReport {
            sources: reports.into_iter().map(|(_, report)| report).collect(),
            cleaned,
        }
    }

    /// Crawl one source and ingest its events sequentially
    pub async fn crawl_source(&self, source: &dyn Source) -> SourceReport {
        let name = source.name().to_string();

        info!("Crawling...");
        let events = match source.crawl().await {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "Failed crawling");
                return SourceReport::crawl_failed(name, e.to_string());
            }
        };
        info!("Discovered {} events", events.len());

        let mut report = SourceReport::new(name.clone());
        report.discovered = events.len();

        for mut event in events {
            event.source = name.clone();
            match self.ingest(&mut event).await {
                Ok(()) => report.ingested += 1,
                Err(e) => {
                    error!(
                        event = %event.title,
                        venue = %event.venue.name,
                        error = %e,
                        "Failed to ingest event"
                    );
                    report.errors.push(format!("{}: {}", event.title, e));
                }
            }
        }

        report
    }

    /// Enrich one event, then reconcile it and its dependencies atomically.
    ///
    /// On error nothing about this event has been written.
    pub async fn ingest(&self, event: &mut Event) -> IngestResult<()> {
        self.visitors.visit(event).await;

        let snapshot: &Event = event;
        let reconciled = retry_on_lock("reconcile event", self.settings.max_lock_wait, || {
            let mut attempt = snapshot.clone();
            async move {
                self.reconcile(&mut attempt).await?;
                Ok(attempt)
            }
        })
        .await?;

        *event = reconciled;
        debug!(event = %event.title, id = event.id, "Ingested event");
        Ok(())
    }

    async fn reconcile(&self, event: &mut Event) -> IngestResult<()> {
        let mut tx = self.pool.begin().await?;

        match reconcile_in(&mut *tx, event).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => match tx.rollback().await {
                Ok(()) => Err(e),
                Err(rollback) => Err(IngestError::Rollback {
                    source: Box::new(e),
                    rollback,
                }),
            },
        }
    }

    /// Soft-delete events dated before today in the configured zone
    pub async fn cleanup(&self) -> IngestResult<u64> {
        let cutoff = fakt_common::time::start_of_today(&self.settings.timezone);
        let affected = mark_past_events_deleted(&self.pool, cutoff).await?;

        if affected > 0 {
            info!("Cleaned up {} rows", affected);
        } else {
            debug!("Cleaned up 0 rows");
        }
        Ok(affected)
    }
}

/// Venue, then performers, then the event, on one connection
async fn reconcile_in(conn: &mut SqliteConnection, event: &mut Event) -> IngestResult<()> {
    venue_must_exist(conn, &mut event.venue).await?;

    for performer in event.performers.iter_mut() {
        performer_must_exist(conn, performer).await?;
    }

    event_must_exist(conn, event).await
}
