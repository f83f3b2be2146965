//! Activity records: status changes, moves, shipments, comments and
//! Teflon coating updates.
//!
//! # Responsibility
//! - Define the append-only log rows written by state-change actions.
//! - Provide a merged `ActivityRecord` view for per-asset history.
//!
//! # Invariants
//! - `occurred_at` is Unix epoch milliseconds.
//! - Log rows are never updated after insert.

use super::asset::{AssetKey, AssetKind, TeflonStatus};
use super::{require_non_blank, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum comment length in characters after trimming.
pub const COMMENT_MAX_CHARS: usize = 500;

/// Asset in/out lifecycle recorded in the status log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    CheckIn,
    CheckOut,
    Shipped,
    Returned,
    Disposed,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::Shipped => "shipped",
            Self::Returned => "returned",
            Self::Disposed => "disposed",
        }
    }

    /// Parses canonical names plus the short codes used in legacy sheets.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "check_in" | "checkin" | "in" => Some(Self::CheckIn),
            "check_out" | "checkout" | "out" => Some(Self::CheckOut),
            "shipped" | "ship" | "shipping" => Some(Self::Shipped),
            "returned" | "return" => Some(Self::Returned),
            "disposed" | "dispose" | "scrapped" => Some(Self::Disposed),
            _ => None,
        }
    }

    /// Display label for a raw status cell.
    ///
    /// Known codes map to their canonical name; unknown non-blank text is kept
    /// as-is; blank text yields `None`.
    pub fn label_for(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(
            Self::parse(trimmed)
                .map(|status| status.as_str().to_string())
                .unwrap_or_else(|| trimmed.to_string()),
        )
    }
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status log row. Exactly one of `mold_id` / `cutter_id` is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLog {
    #[serde(rename = "StatusLogID")]
    pub log_id: String,
    #[serde(rename = "MoldID", default)]
    pub mold_id: Option<String>,
    #[serde(rename = "CutterID", default)]
    pub cutter_id: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: String,
    /// Unix epoch milliseconds.
    #[serde(rename = "Timestamp", default)]
    pub occurred_at: i64,
    #[serde(rename = "EmployeeID", default)]
    pub employee_id: Option<String>,
    #[serde(rename = "Notes", default)]
    pub note: Option<String>,
}

impl StatusLog {
    /// Creates a new log row for `asset` with a generated id.
    pub fn new(asset: &AssetKey, status: AssetStatus, occurred_at: i64) -> Self {
        let (mold_id, cutter_id) = match asset.kind {
            AssetKind::Mold => (Some(asset.id.clone()), None),
            AssetKind::Cutter => (None, Some(asset.id.clone())),
        };
        Self {
            log_id: Uuid::new_v4().to_string(),
            mold_id,
            cutter_id,
            status: status.as_str().to_string(),
            occurred_at,
            employee_id: None,
            note: None,
        }
    }

    /// Resolves the asset this row refers to. Molds win when both are set.
    pub fn asset_key(&self) -> Option<AssetKey> {
        if let Some(id) = super::normalize_opt_key(self.mold_id.as_deref()) {
            return Some(AssetKey::mold(id));
        }
        super::normalize_opt_key(self.cutter_id.as_deref()).map(AssetKey::cutter)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.log_id, "StatusLogID")?;
        require_non_blank(&self.status, "Status")?;
        if self.asset_key().is_none() {
            return Err(ModelValidationError::BlankField("MoldID/CutterID"));
        }
        Ok(())
    }
}

/// Rack-layer move of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationLog {
    pub log_id: Uuid,
    pub asset: AssetKey,
    pub from_layer_id: Option<String>,
    pub to_layer_id: String,
    pub employee_id: String,
    pub note: Option<String>,
    pub occurred_at: i64,
}

/// Transfer of one asset between companies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipLog {
    pub log_id: Uuid,
    pub asset: AssetKey,
    pub from_company_id: Option<String>,
    pub to_company_id: String,
    pub employee_id: String,
    pub note: Option<String>,
    pub occurred_at: i64,
}

/// Free-text user comment on one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: Uuid,
    pub asset: AssetKey,
    pub employee_id: String,
    pub body: String,
    pub occurred_at: i64,
}

impl Comment {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.body, "comment body")?;
        if self.body.trim().chars().count() > COMMENT_MAX_CHARS {
            return Err(ModelValidationError::TooLong {
                field: "comment body",
                max_chars: COMMENT_MAX_CHARS,
            });
        }
        Ok(())
    }
}

/// Teflon coating status change of one mold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeflonLog {
    pub log_id: Uuid,
    pub mold_id: String,
    pub status: TeflonStatus,
    pub employee_id: String,
    pub note: Option<String>,
    pub occurred_at: i64,
}

/// One entry of a merged per-asset activity timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityRecord {
    Status(StatusLog),
    Location(LocationLog),
    Ship(ShipLog),
    Comment(Comment),
    Teflon(TeflonLog),
}

impl ActivityRecord {
    pub fn occurred_at(&self) -> i64 {
        match self {
            Self::Status(log) => log.occurred_at,
            Self::Location(log) => log.occurred_at,
            Self::Ship(log) => log.occurred_at,
            Self::Comment(comment) => comment.occurred_at,
            Self::Teflon(log) => log.occurred_at,
        }
    }

    /// One-line human summary used by text renderers.
    pub fn summary(&self) -> String {
        match self {
            Self::Status(log) => format!(
                "status {}",
                AssetStatus::label_for(&log.status).unwrap_or_else(|| "-".to_string())
            ),
            Self::Location(log) => format!(
                "moved {} -> {}",
                log.from_layer_id.as_deref().unwrap_or("-"),
                log.to_layer_id
            ),
            Self::Ship(log) => format!(
                "shipped {} -> {}",
                log.from_company_id.as_deref().unwrap_or("-"),
                log.to_company_id
            ),
            Self::Comment(comment) => format!("comment: {}", comment.body),
            Self::Teflon(log) => format!("teflon {}", log.status),
        }
    }
}
