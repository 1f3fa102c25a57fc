//! Background store jobs to keep the UI thread responsive.
//!
//! Handlers queue a [`StoreJob`]; the main loop hands each one to
//! [`dispatch`], which runs it on a short-lived thread and reports back over
//! the update channel.  Results carry the generation they were started with so
//! the receiver can drop stale ones.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::{
    ad::{Ad, AdId, AdStats, AdUpdate, NewAd},
    store::{AdStore, StoreError},
};

/// Work requested by the input handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreJob {
    LoadFeed { generation: u64 },
    /// Fire-and-forget click registration.
    RegisterInteraction(AdId),
    LoadDashboard { generation: u64 },
    Create(NewAd),
    Update(AdId, AdUpdate),
    Delete(AdId),
    Reset,
}

pub enum StoreUpdate {
    FeedLoaded {
        generation: u64,
        result: Result<Vec<Ad>, StoreError>,
    },
    DashboardLoaded {
        generation: u64,
        result: Result<(Vec<Ad>, AdStats), StoreError>,
    },
    /// An admin mutation finished; `Ok` carries the status line text.
    Mutated {
        result: Result<String, StoreError>,
    },
}

pub fn dispatch(job: StoreJob, tx: &mpsc::UnboundedSender<StoreUpdate>, store: &Arc<dyn AdStore>) {
    match job {
        StoreJob::LoadFeed { generation } => spawn_feed_load(tx.clone(), Arc::clone(store), generation),
        StoreJob::RegisterInteraction(id) => spawn_register_interaction(Arc::clone(store), id),
        StoreJob::LoadDashboard { generation } => {
            spawn_dashboard_load(tx.clone(), Arc::clone(store), generation)
        }
        StoreJob::Create(ad) => spawn_mutation(tx.clone(), Arc::clone(store), move |s| {
            s.create(ad).map(|ad| format!("Created \"{}\"", ad.title))
        }),
        StoreJob::Update(id, update) => spawn_mutation(tx.clone(), Arc::clone(store), move |s| {
            s.update(id, update).map(|ad| format!("Saved \"{}\"", ad.title))
        }),
        StoreJob::Delete(id) => spawn_mutation(tx.clone(), Arc::clone(store), move |s| {
            s.delete(id).map(|()| format!("Deleted ad #{id}"))
        }),
        StoreJob::Reset => spawn_mutation(tx.clone(), Arc::clone(store), |s| {
            s.reset().map(|()| "Store reset".to_string())
        }),
    }
}

pub fn spawn_feed_load(
    tx: mpsc::UnboundedSender<StoreUpdate>,
    store: Arc<dyn AdStore>,
    generation: u64,
) {
    std::thread::spawn(move || {
        let result = store.list_all();
        let _ = tx.send(StoreUpdate::FeedLoaded { generation, result });
    });
}

/// Never awaited, never retried.
pub fn spawn_register_interaction(store: Arc<dyn AdStore>, id: AdId) {
    std::thread::spawn(move || {
        if let Err(e) = store.register_interaction(id) {
            tracing::warn!(id, error = %e, "failed to register interaction");
        }
    });
}

pub fn spawn_dashboard_load(
    tx: mpsc::UnboundedSender<StoreUpdate>,
    store: Arc<dyn AdStore>,
    generation: u64,
) {
    std::thread::spawn(move || {
        let result = store
            .list_all()
            .and_then(|ads| store.stats().map(|stats| (ads, stats)));
        let _ = tx.send(StoreUpdate::DashboardLoaded { generation, result });
    });
}

fn spawn_mutation<F>(tx: mpsc::UnboundedSender<StoreUpdate>, store: Arc<dyn AdStore>, op: F)
where
    F: FnOnce(&dyn AdStore) -> Result<String, StoreError> + Send + 'static,
{
    std::thread::spawn(move || {
        let result = op(store.as_ref());
        let _ = tx.send(StoreUpdate::Mutated { result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[tokio::test]
    async fn feed_load_reports_generation() {
        let store: Arc<dyn AdStore> = Arc::new(MemoryStore::seeded());
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(StoreJob::LoadFeed { generation: 7 }, &tx, &store);
        match rx.recv().await {
            Some(StoreUpdate::FeedLoaded { generation, result }) => {
                assert_eq!(generation, 7);
                assert_eq!(result.map(|ads| ads.len()).ok(), Some(8));
            }
            _ => panic!("expected a feed load"),
        }
    }

    #[tokio::test]
    async fn failed_mutation_surfaces_the_error() {
        let store: Arc<dyn AdStore> = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let update = AdUpdate {
            title: Some("Gone".into()),
            ..AdUpdate::default()
        };
        dispatch(StoreJob::Update(42, update), &tx, &store);
        match rx.recv().await {
            Some(StoreUpdate::Mutated { result }) => {
                assert!(matches!(result, Err(StoreError::NotFound(42))));
            }
            _ => panic!("expected a mutation result"),
        }
    }

    #[tokio::test]
    async fn dashboard_load_carries_stats() {
        let store: Arc<dyn AdStore> = Arc::new(MemoryStore::seeded());
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(StoreJob::LoadDashboard { generation: 1 }, &tx, &store);
        match rx.recv().await {
            Some(StoreUpdate::DashboardLoaded { result: Ok((ads, stats)), .. }) => {
                assert_eq!(stats.total_ads, ads.len());
            }
            _ => panic!("expected dashboard data"),
        }
    }
}
