//! Service wiring: document store, typed adapter and sync core.

use std::{convert::Infallible, sync::Arc, time::Duration};

use anyhow::Context;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use pantry_store::{DocumentStore, FirestoreDocumentStore, InMemoryDocumentStore, InventoryStore};
use pantry_sync::InventorySync;

use crate::config::StoreBackend;

/// Store handle shared by every request, whatever the backend.
pub type SharedStore = Arc<dyn DocumentStore>;

pub type SharedSync = InventorySync<SharedStore>;

#[derive(Clone)]
pub struct AppServices {
    sync: Arc<SharedSync>,
    backend: &'static str,
}

impl AppServices {
    pub fn new(store: SharedStore, backend: &'static str) -> Self {
        Self {
            sync: Arc::new(InventorySync::new(InventoryStore::new(store))),
            backend,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDocumentStore::new()), "memory")
    }

    pub fn from_backend(backend: &StoreBackend) -> anyhow::Result<Self> {
        match backend {
            StoreBackend::Memory => Ok(Self::in_memory()),
            StoreBackend::Firestore(cfg) => {
                let store = FirestoreDocumentStore::new(cfg.clone())
                    .context("failed to build Firestore client")?;
                tracing::info!(
                    project = %cfg.project_id,
                    collection = %cfg.collection,
                    base_url = %cfg.base_url,
                    "using Firestore store"
                );
                Ok(Self::new(Arc::new(store), "firestore"))
            }
        }
    }

    pub fn sync(&self) -> &SharedSync {
        &self.sync
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

/// SSE stream of refresh notices. Lagged receivers skip ahead silently; the
/// next notice still tells the client to re-read.
pub fn refresh_sse_stream(
    services: AppServices,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.sync().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(notice) => {
            let data = serde_json::to_string(&notice).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event("refresh").data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
