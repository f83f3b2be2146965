//! Lookup session: catalog, search, selection and change notifications.
//!
//! # Responsibility
//! - Own the current catalog snapshot and the selected asset.
//! - Run searches (direct or debounced) and publish their results.
//! - Rebuild the catalog after imports and actions.
//!
//! # Invariants
//! - Reload always rebuilds wholesale.
//! - The selection survives a reload only if the asset still exists.
//! - Every search publishes exactly one `SearchUpdated` event.

use crate::catalog::{AssetView, Catalog, JoinOptions};
use crate::events::{ChangeKind, EventBus, InventoryEvent, ListenerId};
use crate::model::asset::{AssetKey, AssetKind};
use crate::model::tables::RawTables;
use crate::search::debounce::Debouncer;
use crate::search::filter::{filter_views, SearchQuery};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Error for selection requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    UnknownAsset(AssetKey),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAsset(key) => write!(f, "asset not in catalog: {key}"),
        }
    }
}

impl Error for LookupError {}

/// Interactive lookup state for one front end.
#[derive(Debug)]
pub struct LookupService {
    catalog: Catalog,
    selected: Option<AssetKey>,
    events: EventBus,
    debouncer: Debouncer<SearchQuery>,
    default_limit: Option<usize>,
}

impl LookupService {
    pub fn new(options: JoinOptions) -> Self {
        Self {
            catalog: Catalog::build(&RawTables::default(), options),
            selected: None,
            events: EventBus::new(),
            debouncer: Debouncer::default(),
            default_limit: None,
        }
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    /// Limit applied to queries that carry none of their own.
    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&InventoryEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Rebuilds the catalog from `tables`.
    pub fn reload(&mut self, tables: &RawTables) {
        self.catalog.rebuild(tables);
        self.events.emit(&InventoryEvent::CatalogReloaded {
            molds: self.catalog.count(AssetKind::Mold),
            cutters: self.catalog.count(AssetKind::Cutter),
        });

        let stale = self
            .selected
            .as_ref()
            .is_some_and(|key| !self.catalog.contains(key));
        if stale {
            debug!("event=selection_dropped module=service reason=asset_missing");
            self.selected = None;
            self.events
                .emit(&InventoryEvent::SelectionChanged { selected: None });
        }
    }

    /// Rebuilds after a state change to `key` and publishes the change.
    pub fn apply_change(&mut self, tables: &RawTables, key: AssetKey, change: ChangeKind) {
        self.reload(tables);
        self.events
            .emit(&InventoryEvent::AssetChanged { key, change });
    }

    /// Runs `query` immediately and publishes the result keys.
    pub fn search(&mut self, query: &SearchQuery) -> Vec<&AssetView> {
        let effective;
        let query = if query.limit.is_none() && self.default_limit.is_some() {
            effective = query.clone().with_limit(self.default_limit);
            &effective
        } else {
            query
        };

        let results = filter_views(self.catalog.views(), query);
        self.events.emit(&InventoryEvent::SearchUpdated {
            query: query.text.clone(),
            results: results.iter().map(|view| view.key.clone()).collect(),
        });
        results
    }

    /// Queues `query`; a later [`poll_search`](Self::poll_search) runs it.
    pub fn submit_search(&mut self, query: SearchQuery, now: Instant) {
        self.debouncer.submit(query, now);
    }

    /// Runs the pending query once its delay has passed and returns the keys.
    pub fn poll_search(&mut self, now: Instant) -> Option<Vec<AssetKey>> {
        let query = self.debouncer.poll(now)?;
        let keys = self
            .search(&query)
            .into_iter()
            .map(|view| view.key.clone())
            .collect();
        Some(keys)
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Selects `key`, or clears the selection with `None`.
    pub fn select(&mut self, key: Option<AssetKey>) -> Result<(), LookupError> {
        if let Some(key) = key.as_ref() {
            if !self.catalog.contains(key) {
                return Err(LookupError::UnknownAsset(key.clone()));
            }
        }
        if self.selected == key {
            return Ok(());
        }
        self.selected = key;
        self.events.emit(&InventoryEvent::SelectionChanged {
            selected: self.selected.clone(),
        });
        Ok(())
    }

    pub fn selected(&self) -> Option<&AssetView> {
        self.selected.as_ref().and_then(|key| self.catalog.get(key))
    }

    pub fn selected_key(&self) -> Option<&AssetKey> {
        self.selected.as_ref()
    }
}
