//! State-change use cases: move, check in/out, ship, comment, Teflon.
//!
//! # Responsibility
//! - Validate action requests against stored reference data.
//! - Build log records and hand them to the activity repository.
//! - Read merged per-asset history.
//!
//! # Invariants
//! - The asset must exist and the employee id must be non-blank and known.
//! - Validation happens before any write; a rejected request changes nothing.
//! - Teflon updates apply to molds only.
//! - `occurred_at` defaults to the current time in epoch milliseconds.

use crate::catalog::AssetRecord;
use crate::events::ChangeKind;
use crate::model::activity::{
    ActivityRecord, AssetStatus, Comment, LocationLog, ShipLog, StatusLog, TeflonLog,
    COMMENT_MAX_CHARS,
};
use crate::model::asset::{AssetKey, AssetKind, TeflonStatus};
use crate::model::{normalize_key, normalize_opt_key};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::table_repo::TableRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Service error for state-change actions.
#[derive(Debug)]
pub enum ActionError {
    AssetNotFound(AssetKey),
    RackLayerNotFound(String),
    CompanyNotFound(String),
    EmployeeNotFound(String),
    BlankEmployee,
    /// Required text input is blank.
    BlankField(&'static str),
    CommentTooLong { max_chars: usize },
    /// Teflon status was requested for a non-mold asset.
    TeflonNotApplicable(AssetKey),
    Repo(RepoError),
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetNotFound(key) => write!(f, "asset not found: {key}"),
            Self::RackLayerNotFound(id) => write!(f, "rack layer not found: {id}"),
            Self::CompanyNotFound(id) => write!(f, "company not found: {id}"),
            Self::EmployeeNotFound(id) => write!(f, "employee not found: {id}"),
            Self::BlankEmployee => write!(f, "employee id is required"),
            Self::BlankField(field) => write!(f, "{field} is required"),
            Self::CommentTooLong { max_chars } => {
                write!(f, "comment exceeds {max_chars} characters")
            }
            Self::TeflonNotApplicable(key) => {
                write!(f, "teflon status applies to molds only, got {key}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ActionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(key) => Self::AssetNotFound(key),
            other => Self::Repo(other),
        }
    }
}

impl ActionError {
    /// Short machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AssetNotFound(_) => "asset_not_found",
            Self::RackLayerNotFound(_) => "rack_layer_not_found",
            Self::CompanyNotFound(_) => "company_not_found",
            Self::EmployeeNotFound(_) => "employee_not_found",
            Self::BlankEmployee => "blank_employee",
            Self::BlankField(_) => "blank_field",
            Self::CommentTooLong { .. } => "comment_too_long",
            Self::TeflonNotApplicable(_) => "teflon_not_applicable",
            Self::Repo(_) => "repo_error",
        }
    }
}

/// Who performed an action, when, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub employee_id: String,
    pub note: Option<String>,
    /// Epoch milliseconds; `None` means now.
    pub occurred_at: Option<i64>,
}

impl Actor {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            note: None,
            occurred_at: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn at(mut self, occurred_at: i64) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    fn note(&self) -> Option<String> {
        normalize_opt_key(self.note.as_deref()).map(str::to_string)
    }

    fn timestamp(&self) -> i64 {
        self.occurred_at.unwrap_or_else(now_epoch_ms)
    }
}

/// Outcome of one accepted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReceipt {
    pub key: AssetKey,
    pub change: ChangeKind,
    pub log_id: String,
    pub occurred_at: i64,
}

/// Action facade over table and activity repositories.
pub struct ActionService<T: TableRepository, A: ActivityRepository> {
    tables: T,
    activity: A,
    home_company_id: Option<String>,
}

impl<T: TableRepository, A: ActivityRepository> ActionService<T, A> {
    pub fn new(tables: T, activity: A) -> Self {
        Self {
            tables,
            activity,
            home_company_id: None,
        }
    }

    /// Shipments to this company are recorded as `returned`.
    pub fn with_home_company(mut self, home_company_id: Option<String>) -> Self {
        self.home_company_id = home_company_id
            .as_deref()
            .and_then(normalize_key)
            .map(str::to_string);
        self
    }

    /// Moves an asset to another rack layer.
    pub fn update_location(
        &self,
        asset: &AssetKey,
        to_layer_id: &str,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.run("update_location", asset, || {
            let record = self.require_asset(asset)?;
            let employee_id = self.require_employee(&actor.employee_id)?;
            let to_layer_id =
                normalize_key(to_layer_id).ok_or(ActionError::BlankField("rack layer id"))?;
            let layer = self
                .tables
                .get_rack_layer(to_layer_id)?
                .ok_or_else(|| ActionError::RackLayerNotFound(to_layer_id.to_string()))?;

            let log = LocationLog {
                log_id: Uuid::new_v4(),
                asset: asset.clone(),
                from_layer_id: normalize_opt_key(record_layer(&record)).map(str::to_string),
                to_layer_id: layer.rack_layer_id,
                employee_id,
                note: actor.note(),
                occurred_at: actor.timestamp(),
            };
            self.activity.record_move(&log)?;
            Ok(receipt(asset, ChangeKind::Location, log.log_id, log.occurred_at))
        })
    }

    pub fn check_in(&self, asset: &AssetKey, actor: &Actor) -> Result<ActionReceipt, ActionError> {
        self.run("check_in", asset, || {
            self.record_status(asset, AssetStatus::CheckIn, actor)
        })
    }

    pub fn check_out(
        &self,
        asset: &AssetKey,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.run("check_out", asset, || {
            self.record_status(asset, AssetStatus::CheckOut, actor)
        })
    }

    /// Ships an asset to another company and records the matching status.
    pub fn ship(
        &self,
        asset: &AssetKey,
        to_company_id: &str,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.run("ship", asset, || {
            let record = self.require_asset(asset)?;
            let employee_id = self.require_employee(&actor.employee_id)?;
            let to_company_id =
                normalize_key(to_company_id).ok_or(ActionError::BlankField("company id"))?;
            let company = self
                .tables
                .get_company(to_company_id)?
                .ok_or_else(|| ActionError::CompanyNotFound(to_company_id.to_string()))?;

            let occurred_at = actor.timestamp();
            let status = if self.home_company_id.as_deref() == Some(company.company_id.as_str()) {
                AssetStatus::Returned
            } else {
                AssetStatus::Shipped
            };

            let log = ShipLog {
                log_id: Uuid::new_v4(),
                asset: asset.clone(),
                from_company_id: normalize_opt_key(record_company(&record)).map(str::to_string),
                to_company_id: company.company_id,
                employee_id: employee_id.clone(),
                note: actor.note(),
                occurred_at,
            };
            let mut status_log = StatusLog::new(asset, status, occurred_at);
            status_log.employee_id = Some(employee_id);
            status_log.note = actor.note();

            self.activity.record_shipment(&log, &status_log)?;
            Ok(receipt(asset, ChangeKind::Shipment, log.log_id, occurred_at))
        })
    }

    pub fn add_comment(
        &self,
        asset: &AssetKey,
        body: &str,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.run("add_comment", asset, || {
            self.require_asset(asset)?;
            let employee_id = self.require_employee(&actor.employee_id)?;
            let body = body.trim();
            if body.is_empty() {
                return Err(ActionError::BlankField("comment"));
            }
            if body.chars().count() > COMMENT_MAX_CHARS {
                return Err(ActionError::CommentTooLong {
                    max_chars: COMMENT_MAX_CHARS,
                });
            }

            let comment = Comment {
                comment_id: Uuid::new_v4(),
                asset: asset.clone(),
                employee_id,
                body: body.to_string(),
                occurred_at: actor.timestamp(),
            };
            self.activity.add_comment(&comment)?;
            Ok(receipt(
                asset,
                ChangeKind::Comment,
                comment.comment_id,
                comment.occurred_at,
            ))
        })
    }

    pub fn set_teflon(
        &self,
        asset: &AssetKey,
        status: TeflonStatus,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.run("set_teflon", asset, || {
            if asset.kind != AssetKind::Mold {
                return Err(ActionError::TeflonNotApplicable(asset.clone()));
            }
            self.require_asset(asset)?;
            let employee_id = self.require_employee(&actor.employee_id)?;

            let log = TeflonLog {
                log_id: Uuid::new_v4(),
                mold_id: asset.id.clone(),
                status,
                employee_id,
                note: actor.note(),
                occurred_at: actor.timestamp(),
            };
            self.activity.record_teflon(&log)?;
            Ok(receipt(asset, ChangeKind::Teflon, log.log_id, log.occurred_at))
        })
    }

    /// Merged activity of one asset, newest first.
    pub fn history(&self, asset: &AssetKey) -> Result<Vec<ActivityRecord>, ActionError> {
        self.require_asset(asset)?;
        Ok(self.activity.list_activity(asset)?)
    }

    fn record_status(
        &self,
        asset: &AssetKey,
        status: AssetStatus,
        actor: &Actor,
    ) -> Result<ActionReceipt, ActionError> {
        self.require_asset(asset)?;
        let employee_id = self.require_employee(&actor.employee_id)?;

        let mut log = StatusLog::new(asset, status, actor.timestamp());
        log.employee_id = Some(employee_id);
        log.note = actor.note();
        self.activity.record_status(&log)?;

        Ok(ActionReceipt {
            key: asset.clone(),
            change: ChangeKind::Status,
            log_id: log.log_id,
            occurred_at: log.occurred_at,
        })
    }

    fn require_asset(&self, asset: &AssetKey) -> Result<AssetRecord, ActionError> {
        let found = match asset.kind {
            AssetKind::Mold => self.tables.get_mold(&asset.id)?.map(AssetRecord::Mold),
            AssetKind::Cutter => self.tables.get_cutter(&asset.id)?.map(AssetRecord::Cutter),
        };
        found.ok_or_else(|| ActionError::AssetNotFound(asset.clone()))
    }

    fn require_employee(&self, employee_id: &str) -> Result<String, ActionError> {
        let employee_id = normalize_key(employee_id).ok_or(ActionError::BlankEmployee)?;
        self.tables
            .get_employee(employee_id)?
            .map(|employee| employee.employee_id)
            .ok_or_else(|| ActionError::EmployeeNotFound(employee_id.to_string()))
    }

    fn run(
        &self,
        action: &'static str,
        asset: &AssetKey,
        body: impl FnOnce() -> Result<ActionReceipt, ActionError>,
    ) -> Result<ActionReceipt, ActionError> {
        match body() {
            Ok(receipt) => {
                info!(
                    "event=action module=service status=ok action={} asset={} log_id={}",
                    action, asset, receipt.log_id
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(
                    "event=action module=service status=rejected action={} asset={} error_code={} error={}",
                    action,
                    asset,
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn record_layer(record: &AssetRecord) -> Option<&str> {
    match record {
        AssetRecord::Mold(mold) => mold.rack_layer_id.as_deref(),
        AssetRecord::Cutter(cutter) => cutter.rack_layer_id.as_deref(),
    }
}

fn record_company(record: &AssetRecord) -> Option<&str> {
    match record {
        AssetRecord::Mold(mold) => mold.storage_company_id.as_deref(),
        AssetRecord::Cutter(cutter) => cutter.storage_company_id.as_deref(),
    }
}

fn receipt(asset: &AssetKey, change: ChangeKind, log_id: Uuid, occurred_at: i64) -> ActionReceipt {
    ActionReceipt {
        key: asset.clone(),
        change,
        log_id: log_id.to_string(),
        occurred_at,
    }
}

/// Current time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{ActionError, Actor};
    use crate::model::asset::AssetKey;
    use crate::repo::RepoError;

    #[test]
    fn actor_note_is_trimmed_and_blank_dropped() {
        let actor = Actor::new("E1").with_note(Some("  ".to_string()));
        assert_eq!(actor.note(), None);
        let actor = Actor::new("E1").with_note(Some(" ok ".to_string())).at(42);
        assert_eq!(actor.note().as_deref(), Some("ok"));
        assert_eq!(actor.timestamp(), 42);
    }

    #[test]
    fn repo_not_found_maps_to_asset_not_found() {
        let err = ActionError::from(RepoError::NotFound(AssetKey::mold("M1")));
        assert!(matches!(err, ActionError::AssetNotFound(ref key) if key.id == "M1"));
        assert_eq!(err.code(), "asset_not_found");
    }
}
