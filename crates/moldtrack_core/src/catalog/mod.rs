//! Denormalized inventory catalog.
//!
//! # Responsibility
//! - Join raw mold/cutter rows against design, rack, rack-layer, company,
//!   link and status-log tables.
//! - Own the resulting view list and a key index for point lookups.
//!
//! # Invariants
//! - The catalog is rebuilt wholesale on every load, never patched.
//! - Unresolved foreign keys produce placeholder display strings.

mod join;
mod view;

pub use join::{denormalize, JoinOptions, JoinOutput};
pub use view::{AssetRecord, AssetView, ResolvedRefs, PLACEHOLDER, STATUS_PLACEHOLDER};

use crate::model::asset::{AssetKey, AssetKind};
use crate::model::tables::RawTables;
use log::info;
use std::collections::HashMap;
use std::time::Instant;

/// Enriched, searchable snapshot of all assets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    options: JoinOptions,
    views: Vec<AssetView>,
    index: HashMap<AssetKey, usize>,
}

impl Catalog {
    /// Builds a catalog from raw tables.
    pub fn build(tables: &RawTables, options: JoinOptions) -> Self {
        let mut catalog = Self {
            options,
            views: Vec::new(),
            index: HashMap::new(),
        };
        catalog.rebuild(tables);
        catalog
    }

    /// Replaces every view with a fresh join of `tables`.
    pub fn rebuild(&mut self, tables: &RawTables) {
        let started_at = Instant::now();
        let output = denormalize(tables, &self.options);

        let mut index = HashMap::with_capacity(output.views.len());
        for (position, view) in output.views.iter().enumerate() {
            index.entry(view.key.clone()).or_insert(position);
        }

        self.views = output.views;
        self.index = index;

        info!(
            "event=catalog_build module=catalog status=ok molds={} cutters={} skipped_rows={} duration_ms={}",
            self.count(AssetKind::Mold),
            self.count(AssetKind::Cutter),
            output.skipped_rows,
            started_at.elapsed().as_millis()
        );
    }

    pub fn options(&self) -> &JoinOptions {
        &self.options
    }

    /// All views in catalog order (molds first, then cutters).
    pub fn views(&self) -> &[AssetView] {
        &self.views
    }

    /// Returns the first view for `key`.
    pub fn get(&self, key: &AssetKey) -> Option<&AssetView> {
        self.index.get(key).map(|position| &self.views[*position])
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        self.views.iter().filter(|view| view.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
