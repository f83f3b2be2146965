//! Enriched view-records produced by the join step.

use crate::model::activity::StatusLog;
use crate::model::asset::{AssetKey, AssetKind, Cutter, Mold};
use crate::model::reference::{Company, MoldDesign, Rack, RackLayer};
use serde::Serialize;

/// Placeholder for unresolved location, company, dimensions, design and name.
pub const PLACEHOLDER: &str = "-";
/// Placeholder for assets without any status log entry.
pub const STATUS_PLACEHOLDER: &str = "N/A";

/// Raw source row of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum AssetRecord {
    Mold(Mold),
    Cutter(Cutter),
}

impl AssetRecord {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Mold(_) => AssetKind::Mold,
            Self::Cutter(_) => AssetKind::Cutter,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Self::Mold(mold) => mold.notes.as_deref(),
            Self::Cutter(cutter) => cutter.notes.as_deref(),
        }
    }
}

/// Sub-records resolved through the asset's foreign keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedRefs {
    pub design: Option<MoldDesign>,
    pub rack_layer: Option<RackLayer>,
    /// Resolved transitively through `rack_layer.rack_id`.
    pub rack: Option<Rack>,
    pub storage_company: Option<Company>,
    pub latest_status: Option<StatusLog>,
}

/// Denormalized mold/cutter record with derived display strings.
///
/// Display fields are never empty: unresolved references yield
/// [`PLACEHOLDER`] or [`STATUS_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetView {
    pub key: AssetKey,
    pub record: AssetRecord,
    pub refs: ResolvedRefs,
    pub code: String,
    pub name: String,
    pub dimensions: String,
    pub location: String,
    pub company: String,
    pub status: String,
    pub teflon: String,
    pub design: String,
    /// Keys of linked assets (cutters for a mold, molds for a cutter).
    pub related: Vec<AssetKey>,
    /// Stored at a company other than the configured home company.
    pub is_external: bool,
}

impl AssetView {
    pub fn kind(&self) -> AssetKind {
        self.key.kind
    }

    pub fn notes(&self) -> &str {
        self.record.notes().map(str::trim).unwrap_or("")
    }

    pub fn drawing_number(&self) -> &str {
        self.refs
            .design
            .as_ref()
            .and_then(|design| design.drawing_number.as_deref())
            .map(str::trim)
            .unwrap_or("")
    }

    /// Rack label used by the `rack` filter, or [`PLACEHOLDER`].
    pub fn rack_label(&self) -> &str {
        if let Some(rack) = &self.refs.rack {
            if let Some(symbol) = crate::model::normalize_opt_key(rack.symbol.as_deref()) {
                return symbol;
            }
            return rack.rack_id.trim();
        }
        self.refs
            .rack_layer
            .as_ref()
            .and_then(|layer| crate::model::normalize_opt_key(layer.rack_id.as_deref()))
            .unwrap_or(PLACEHOLDER)
    }
}
