//! Mold and cutter asset records.
//!
//! # Responsibility
//! - Define the raw mold/cutter rows as they appear in the source tables.
//! - Provide the `AssetKey` identity shared by views, logs and events.
//!
//! # Invariants
//! - `mold_id` / `cutter_id` are the primary keys and must be non-blank.
//! - Foreign keys (`design_id`, `rack_layer_id`, `storage_company_id`) are
//!   optional and never validated against other tables here.

use super::{require_non_blank, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Asset category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Mold,
    Cutter,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mold => "mold",
            Self::Cutter => "cutter",
        }
    }

    /// Parses `mold` / `cutter` case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mold" | "molds" => Some(Self::Mold),
            "cutter" | "cutters" => Some(Self::Cutter),
            _ => None,
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of one asset across tables, logs and events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub id: String,
}

impl AssetKey {
    /// Builds a key with a trimmed id.
    pub fn new(kind: AssetKind, id: impl AsRef<str>) -> Self {
        Self {
            kind,
            id: id.as_ref().trim().to_string(),
        }
    }

    pub fn mold(id: impl AsRef<str>) -> Self {
        Self::new(AssetKind::Mold, id)
    }

    pub fn cutter(id: impl AsRef<str>) -> Self {
        Self::new(AssetKind::Cutter, id)
    }

    /// Parses `kind:id`, e.g. `mold:M-001`.
    pub fn parse(value: &str) -> Option<Self> {
        let (kind, id) = value.split_once(':')?;
        let kind = AssetKind::parse(kind)?;
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        Some(Self::new(kind, id))
    }
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Teflon coating lifecycle for molds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeflonStatus {
    /// No coating requested.
    NotCoated,
    /// Coating requested but not yet sent out.
    Pending,
    /// Sent to the coating vendor.
    Sent,
    /// Coating applied and mold returned.
    Coated,
}

impl TeflonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotCoated => "not_coated",
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Coated => "coated",
        }
    }

    /// Parses canonical names plus the spellings found in legacy sheets.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "not_coated" | "none" | "no" => Some(Self::NotCoated),
            "pending" | "requested" => Some(Self::Pending),
            "sent" | "sending" | "out_for_coating" => Some(Self::Sent),
            "coated" | "done" | "completed" => Some(Self::Coated),
            _ => None,
        }
    }
}

impl Display for TeflonStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw mold row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mold {
    #[serde(rename = "MoldID")]
    pub mold_id: String,
    #[serde(rename = "MoldCode", default)]
    pub mold_code: Option<String>,
    #[serde(rename = "MoldName", default)]
    pub mold_name: Option<String>,
    #[serde(rename = "MoldDesignID", default)]
    pub design_id: Option<String>,
    #[serde(rename = "RackLayerID", default)]
    pub rack_layer_id: Option<String>,
    #[serde(rename = "storage_company", default)]
    pub storage_company_id: Option<String>,
    /// Raw Teflon status text; see [`TeflonStatus::parse`].
    #[serde(rename = "TeflonCoating", default)]
    pub teflon_status: Option<String>,
    #[serde(rename = "MoldNotes", default)]
    pub notes: Option<String>,
}

impl Mold {
    pub fn new(mold_id: impl Into<String>) -> Self {
        Self {
            mold_id: mold_id.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::mold(&self.mold_id)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.mold_id, "MoldID")
    }
}

/// Raw cutter row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cutter {
    #[serde(rename = "CutterID")]
    pub cutter_id: String,
    #[serde(rename = "CutterNo", default)]
    pub cutter_no: Option<String>,
    #[serde(rename = "CutterName", default)]
    pub cutter_name: Option<String>,
    #[serde(rename = "CutlineLength", default)]
    pub cutline_length: Option<f64>,
    #[serde(rename = "CutlineWidth", default)]
    pub cutline_width: Option<f64>,
    #[serde(rename = "RackLayerID", default)]
    pub rack_layer_id: Option<String>,
    #[serde(rename = "storage_company", default)]
    pub storage_company_id: Option<String>,
    #[serde(rename = "CutterNote", default)]
    pub notes: Option<String>,
}

impl Cutter {
    pub fn new(cutter_id: impl Into<String>) -> Self {
        Self {
            cutter_id: cutter_id.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::cutter(&self.cutter_id)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.cutter_id, "CutterID")
    }
}

/// Many-to-many link between molds and the cutters used with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoldCutterLink {
    #[serde(rename = "MoldID")]
    pub mold_id: String,
    #[serde(rename = "CutterID")]
    pub cutter_id: String,
}

impl MoldCutterLink {
    pub fn new(mold_id: impl Into<String>, cutter_id: impl Into<String>) -> Self {
        Self {
            mold_id: mold_id.into(),
            cutter_id: cutter_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.mold_id, "MoldID")?;
        require_non_blank(&self.cutter_id, "CutterID")
    }
}
