//! Substring search plus optional field=value filter over catalog views.
//!
//! # Responsibility
//! - Reduce the enriched view list to rows matching a free-text query.
//! - Intersect with zero-or-one field filter and an optional asset kind.
//!
//! # Invariants
//! - Text matching is case-insensitive substring over [`SEARCH_FIELDS`].
//! - A blank query matches every row.
//! - Unknown filter fields or blank filter values mean "no filter"; search
//!   never fails.
//! - Results keep catalog order.

use crate::catalog::AssetView;
use crate::model::asset::AssetKind;
use once_cell::sync::Lazy;
use regex::Regex;

static FILTER_EXPR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]+)\s*[=:]\s*(.*?)\s*$").expect("valid filter expression regex")
});

/// Display field covered by free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Code,
    Name,
    Dimensions,
    Location,
    Company,
    Status,
    Design,
    Teflon,
    Notes,
    DrawingNumber,
}

/// Fields scanned by the text query, in scan order.
pub const SEARCH_FIELDS: [SearchField; 10] = [
    SearchField::Code,
    SearchField::Name,
    SearchField::Dimensions,
    SearchField::Location,
    SearchField::Company,
    SearchField::Status,
    SearchField::Design,
    SearchField::Teflon,
    SearchField::Notes,
    SearchField::DrawingNumber,
];

impl SearchField {
    pub fn value(self, view: &AssetView) -> &str {
        match self {
            Self::Code => &view.code,
            Self::Name => &view.name,
            Self::Dimensions => &view.dimensions,
            Self::Location => &view.location,
            Self::Company => &view.company,
            Self::Status => &view.status,
            Self::Design => &view.design,
            Self::Teflon => &view.teflon,
            Self::Notes => view.notes(),
            Self::DrawingNumber => view.drawing_number(),
        }
    }
}

/// Field usable in an equality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Kind,
    Rack,
    Company,
    Status,
    Teflon,
    Design,
}

impl FilterField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Rack => "rack",
            Self::Company => "company",
            Self::Status => "status",
            Self::Teflon => "teflon",
            Self::Design => "design",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kind" | "type" => Some(Self::Kind),
            "rack" => Some(Self::Rack),
            "company" | "storage_company" => Some(Self::Company),
            "status" => Some(Self::Status),
            "teflon" => Some(Self::Teflon),
            "design" => Some(Self::Design),
            _ => None,
        }
    }

    pub fn value(self, view: &AssetView) -> &str {
        match self {
            Self::Kind => view.kind().as_str(),
            Self::Rack => view.rack_label(),
            Self::Company => &view.company,
            Self::Status => &view.status,
            Self::Teflon => &view.teflon,
            Self::Design => &view.design,
        }
    }
}

/// Equality filter on one display field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    field: FilterField,
    value: String,
}

impl FieldFilter {
    /// Returns `None` for a blank value.
    pub fn new(field: FilterField, value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            field,
            value: value.to_lowercase(),
        })
    }

    /// Parses a field name and value; unknown names yield `None`.
    pub fn parse(field: &str, value: &str) -> Option<Self> {
        Self::new(FilterField::parse(field)?, value)
    }

    /// Parses `field=value` or `field:value`.
    pub fn parse_expr(expr: &str) -> Option<Self> {
        let captures = FILTER_EXPR_RE.captures(expr)?;
        Self::parse(captures.get(1)?.as_str(), captures.get(2)?.as_str())
    }

    pub fn field(&self) -> FilterField {
        self.field
    }

    /// Normalized (trimmed, lowercased) filter value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, view: &AssetView) -> bool {
        self.field.value(view).trim().to_lowercase() == self.value
    }
}

/// Search request over catalog views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text substring; blank matches all.
    pub text: String,
    pub filter: Option<FieldFilter>,
    /// Restricts results to one asset kind.
    pub kind: Option<AssetKind>,
    /// Maximum number of results; `None` is unbounded.
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Option<FieldFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_kind(mut self, kind: Option<AssetKind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Lowercased trimmed needle, or `None` when the query is blank.
    fn needle(&self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

/// Returns `true` when `needle` (already lowercased) occurs in any search field.
pub fn matches_text(view: &AssetView, needle: &str) -> bool {
    SEARCH_FIELDS
        .iter()
        .any(|field| field.value(view).to_lowercase().contains(needle))
}

/// Filters `views` by `query`, preserving input order.
pub fn filter_views<'a>(views: &'a [AssetView], query: &SearchQuery) -> Vec<&'a AssetView> {
    if query.limit == Some(0) {
        return Vec::new();
    }

    let needle = query.needle();
    let matching = views.iter().filter(|view| {
        query.kind.map_or(true, |kind| view.kind() == kind)
            && query
                .filter
                .as_ref()
                .map_or(true, |filter| filter.matches(view))
            && needle
                .as_deref()
                .map_or(true, |needle| matches_text(view, needle))
    });

    match query.limit {
        Some(limit) => matching.take(limit).collect(),
        None => matching.collect(),
    }
}
