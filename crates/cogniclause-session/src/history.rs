//! Loading the history view from the record store.

use std::time::Duration;

use cogniclause_core::{HistoryRecord, HistoryView};
use tracing::info;

use crate::collab::{IdentityProvider, RecordStore, best_effort_user_id};
use crate::error::StoreError;

/// Fetch the current user's records, newest first.
///
/// Identity is attached best-effort, as for submissions.
pub async fn fetch_records(
    store: &dyn RecordStore,
    identity: &dyn IdentityProvider,
    identity_timeout: Duration,
) -> Result<Vec<HistoryRecord>, StoreError> {
    let user_id = best_effort_user_id(identity, identity_timeout).await;
    let records = store.list_records(user_id.as_deref()).await?;
    info!(count = records.len(), user = ?user_id, "fetched history records");
    Ok(records)
}

/// Fetch records and open a fresh view over them.
pub async fn load_history(
    store: &dyn RecordStore,
    identity: &dyn IdentityProvider,
    identity_timeout: Duration,
    page_size: usize,
) -> Result<HistoryView, StoreError> {
    let records = fetch_records(store, identity, identity_timeout).await?;
    Ok(HistoryView::new(records, page_size))
}

/// Re-fetch and replace the view's records wholesale.
pub async fn refresh_history(
    view: &mut HistoryView,
    store: &dyn RecordStore,
    identity: &dyn IdentityProvider,
    identity_timeout: Duration,
) -> Result<(), StoreError> {
    let records = fetch_records(store, identity, identity_timeout).await?;
    view.replace_records(records);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{AnonymousIdentity, StaticIdentity};
    use async_trait::async_trait;
    use cogniclause_core::{LevelFilter, RiskLevel};
    use std::sync::Mutex;

    struct InMemoryStore {
        records: Mutex<Vec<HistoryRecord>>,
        asked_for: Mutex<Vec<Option<String>>>,
    }

    impl InMemoryStore {
        fn with(records: Vec<HistoryRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                asked_for: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecordStore for InMemoryStore {
        async fn list_records(
            &self,
            user_id: Option<&str>,
        ) -> Result<Vec<HistoryRecord>, StoreError> {
            self.asked_for
                .lock()
                .unwrap()
                .push(user_id.map(str::to_string));
            Ok(self.records.lock().unwrap().clone())
        }
    }

    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn list_records(
            &self,
            _user_id: Option<&str>,
        ) -> Result<Vec<HistoryRecord>, StoreError> {
            Err(StoreError::Server {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    fn record(id: usize, name: &str, level: RiskLevel) -> HistoryRecord {
        HistoryRecord {
            id: id.to_string(),
            name: name.into(),
            text: None,
            level,
            created_at: None,
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn load_passes_user_and_builds_view() {
        let store = InMemoryStore::with(vec![
            record(1, "NDA", RiskLevel::Low),
            record(2, "MSA", RiskLevel::High),
        ]);
        let mut view = load_history(&store, &StaticIdentity::new("u-1"), TIMEOUT, 5)
            .await
            .unwrap();

        assert_eq!(
            store.asked_for.lock().unwrap().as_slice(),
            &[Some("u-1".to_string())]
        );
        assert_eq!(view.records().len(), 2);
        view.set_level_filter(LevelFilter::Level(RiskLevel::High));
        assert_eq!(view.current_page().items[0].name, "MSA");
    }

    #[tokio::test]
    async fn empty_store_is_an_empty_view() {
        let store = InMemoryStore::with(Vec::new());
        let view = load_history(&store, &AnonymousIdentity, TIMEOUT, 5)
            .await
            .unwrap();
        let page = view.current_page();
        assert!(page.items.is_empty());
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let err = load_history(&DownStore, &AnonymousIdentity, TIMEOUT, 5)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "record store returned 503: unavailable");
    }

    #[tokio::test]
    async fn refresh_replaces_records_and_reclamps() {
        let many: Vec<_> = (1..=12)
            .map(|i| record(i, &format!("c{i}"), RiskLevel::Low))
            .collect();
        let store = InMemoryStore::with(many);
        let mut view = load_history(&store, &AnonymousIdentity, TIMEOUT, 5)
            .await
            .unwrap();
        view.set_page(3);

        *store.records.lock().unwrap() = vec![record(1, "c1", RiskLevel::Low)];
        refresh_history(&mut view, &store, &AnonymousIdentity, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(view.records().len(), 1);
        assert_eq!(view.page(), 1);
    }
}
