//! Reference tables joined against assets: racks, layers, companies,
//! designs and employees.

use super::{require_non_blank, ModelValidationError};
use serde::{Deserialize, Serialize};

/// Storage rack (shelf unit).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    #[serde(rename = "RackID")]
    pub rack_id: String,
    /// Short painted label, e.g. `A3`.
    #[serde(rename = "RackSymbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "RackName", default)]
    pub name: Option<String>,
    /// Free-text physical position, e.g. `2F warehouse`.
    #[serde(rename = "RackLocation", default)]
    pub location: Option<String>,
}

impl Rack {
    pub fn new(rack_id: impl Into<String>) -> Self {
        Self {
            rack_id: rack_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.rack_id, "RackID")
    }
}

/// One tier of a rack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackLayer {
    #[serde(rename = "RackLayerID")]
    pub rack_layer_id: String,
    #[serde(rename = "RackID", default)]
    pub rack_id: Option<String>,
    #[serde(rename = "RackLayerNumber", default)]
    pub layer_number: Option<String>,
    #[serde(rename = "RackLayerNotes", default)]
    pub notes: Option<String>,
}

impl RackLayer {
    pub fn new(rack_layer_id: impl Into<String>, rack_id: impl Into<String>) -> Self {
        Self {
            rack_layer_id: rack_layer_id.into(),
            rack_id: Some(rack_id.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.rack_layer_id, "RackLayerID")
    }
}

/// Company that stores or receives assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "CompanyID")]
    pub company_id: String,
    #[serde(rename = "CompanyShortName", default)]
    pub short_name: Option<String>,
    #[serde(rename = "CompanyName", default)]
    pub name: Option<String>,
}

impl Company {
    pub fn new(company_id: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            short_name: Some(short_name.into()),
            name: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.company_id, "CompanyID")
    }
}

/// Mold design sheet (dimensions and drawing reference).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoldDesign {
    #[serde(rename = "MoldDesignID")]
    pub design_id: String,
    #[serde(rename = "MoldDesignCode", default)]
    pub design_code: Option<String>,
    #[serde(rename = "MoldDesignLength", default)]
    pub length: Option<f64>,
    #[serde(rename = "MoldDesignWidth", default)]
    pub width: Option<f64>,
    #[serde(rename = "MoldDesignHeight", default)]
    pub height: Option<f64>,
    #[serde(rename = "PieceCount", default)]
    pub piece_count: Option<i64>,
    #[serde(rename = "DrawingNumber", default)]
    pub drawing_number: Option<String>,
    #[serde(rename = "TrayInfoForMoldDesign", default)]
    pub tray_info: Option<String>,
}

impl MoldDesign {
    pub fn new(design_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.design_id, "MoldDesignID")
    }
}

/// Employee allowed to record state changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "EmployeeName", default)]
    pub name: Option<String>,
}

impl Employee {
    pub fn new(employee_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: Some(name.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(&self.employee_id, "EmployeeID")
    }
}
