//! Known-performer substitution
//!
//! Replaces incoming performers with the version already in the store, so
//! data found in an earlier cycle is kept and not fetched again.

use super::EventVisitor;
use crate::db::performers::{find_performers, PerformerFilter};
use async_trait::async_trait;
use fakt_common::db::Event;
use sqlx::SqlitePool;
use tracing::{debug, error};

pub struct KnownPerformerVisitor {
    pool: SqlitePool,
}

impl KnownPerformerVisitor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventVisitor for KnownPerformerVisitor {
    fn name(&self) -> &'static str {
        "known-performer"
    }

    async fn visit(&self, event: &mut Event) {
        for performer in event.performers.iter_mut() {
            let filter = PerformerFilter::by_key(&performer.name, &performer.genre);
            let existing = match find_performers(&self.pool, &filter).await {
                Ok(existing) => existing,
                Err(e) => {
                    // Stop here; remaining performers stay as the source sent them
                    error!(
                        event = %event.title,
                        error = %e,
                        "Failed to find performer visiting event"
                    );
                    return;
                }
            };

            if let Some(known) = existing.into_iter().next() {
                debug!(performer = %known.name, id = known.id, "Substituting known performer");
                *performer = known;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::performer_must_exist;
    use chrono::DateTime;
    use fakt_common::db::{init_memory_database, Performer, Venue};

    fn event_with(performers: Vec<Performer>) -> Event {
        let date = DateTime::parse_from_rfc3339("2030-01-01T20:00:00+01:00").unwrap();
        let mut event = Event::new("Night", date, Venue::named("Fest Hall"));
        event.performers = performers;
        event
    }

    #[tokio::test]
    async fn test_known_performer_replaced_wholesale() {
        let pool = init_memory_database().await.unwrap();
        let mut stored = Performer::new("DJ Null", "techno");
        stored.listen_url = "https://djnull.example/".to_string();
        stored.tags = vec!["minimal".to_string()];
        {
            let mut conn = pool.acquire().await.unwrap();
            performer_must_exist(&mut conn, &mut stored).await.unwrap();
        }

        let mut incoming = Performer::new("DJ Null", "techno");
        incoming.home = "Somewhere".to_string();
        let mut event = event_with(vec![incoming, Performer::new("Newcomer", "techno")]);

        KnownPerformerVisitor::new(pool).visit(&mut event).await;

        assert_eq!(event.performers[0], stored);
        assert_eq!(event.performers[0].home, "");
        assert_eq!(event.performers[1].id, 0, "unknown performer left untouched");
    }

    #[tokio::test]
    async fn test_lookup_failure_leaves_performers_untouched() {
        let pool = init_memory_database().await.unwrap();
        let visitor = KnownPerformerVisitor::new(pool.clone());
        pool.close().await;

        let mut event = event_with(vec![Performer::new("DJ Null", "techno")]);
        let before = event.clone();

        visitor.visit(&mut event).await;

        assert_eq!(event, before);
    }
}
