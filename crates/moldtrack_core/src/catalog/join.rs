//! One-pass denormalization of mold/cutter rows against reference tables.
//!
//! # Invariants
//! - Keys match by exact equality after trimming both sides.
//! - The first row wins when a reference table repeats a primary key.
//! - The latest status is the greatest `occurred_at`; ties go to the row
//!   that appears later in the input.
//! - Output order is input order: molds first, then cutters. Rows with a
//!   blank primary key are skipped.

use super::view::{AssetRecord, AssetView, ResolvedRefs, PLACEHOLDER, STATUS_PLACEHOLDER};
use crate::model::activity::{AssetStatus, StatusLog};
use crate::model::asset::{AssetKey, Cutter, Mold, TeflonStatus};
use crate::model::reference::{Company, MoldDesign, Rack, RackLayer};
use crate::model::tables::RawTables;
use crate::model::{normalize_key, normalize_opt_key};
use std::collections::HashMap;

/// Options that influence derived fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOptions {
    /// Company id of the warehouse owner; other storage marks `is_external`.
    pub home_company_id: Option<String>,
}

/// Result of one join pass.
#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub views: Vec<AssetView>,
    /// Asset rows dropped because their primary key was blank.
    pub skipped_rows: usize,
}

struct JoinIndex<'a> {
    designs: HashMap<&'a str, &'a MoldDesign>,
    racks: HashMap<&'a str, &'a Rack>,
    layers: HashMap<&'a str, &'a RackLayer>,
    companies: HashMap<&'a str, &'a Company>,
    latest_status: HashMap<AssetKey, &'a StatusLog>,
    cutters_by_mold: HashMap<&'a str, Vec<&'a str>>,
    molds_by_cutter: HashMap<&'a str, Vec<&'a str>>,
    home_company_id: Option<&'a str>,
}

impl<'a> JoinIndex<'a> {
    fn build(tables: &'a RawTables, options: &'a JoinOptions) -> Self {
        let mut latest_status: HashMap<AssetKey, &'a StatusLog> = HashMap::new();
        for log in &tables.status_logs {
            // blank status rows never shadow an earlier status
            if log.status.trim().is_empty() {
                continue;
            }
            let Some(key) = log.asset_key() else {
                continue;
            };
            match latest_status.get(&key) {
                Some(current) if current.occurred_at > log.occurred_at => {}
                _ => {
                    latest_status.insert(key, log);
                }
            }
        }

        let mut cutters_by_mold: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut molds_by_cutter: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        for link in &tables.mold_cutters {
            let (Some(mold_id), Some(cutter_id)) =
                (normalize_key(&link.mold_id), normalize_key(&link.cutter_id))
            else {
                continue;
            };
            push_unique(cutters_by_mold.entry(mold_id).or_default(), cutter_id);
            push_unique(molds_by_cutter.entry(cutter_id).or_default(), mold_id);
        }

        Self {
            designs: index_by(&tables.designs, |design| &design.design_id),
            racks: index_by(&tables.racks, |rack| &rack.rack_id),
            layers: index_by(&tables.rack_layers, |layer| &layer.rack_layer_id),
            companies: index_by(&tables.companies, |company| &company.company_id),
            latest_status,
            cutters_by_mold,
            molds_by_cutter,
            home_company_id: normalize_opt_key(options.home_company_id.as_deref()),
        }
    }

    fn resolve_location(
        &self,
        rack_layer_id: Option<&str>,
    ) -> (Option<&'a RackLayer>, Option<&'a Rack>) {
        let layer = normalize_opt_key(rack_layer_id).and_then(|id| self.layers.get(id).copied());
        let rack = layer
            .and_then(|layer| normalize_opt_key(layer.rack_id.as_deref()))
            .and_then(|id| self.racks.get(id).copied());
        (layer, rack)
    }

    fn resolve_company(&self, company_id: Option<&str>) -> Option<&'a Company> {
        normalize_opt_key(company_id).and_then(|id| self.companies.get(id).copied())
    }

    fn is_external(&self, company: Option<&Company>) -> bool {
        match (self.home_company_id, company) {
            (Some(home), Some(company)) => company.company_id.trim() != home,
            _ => false,
        }
    }
}

/// Denormalizes every mold and cutter row of `tables`.
pub fn denormalize(tables: &RawTables, options: &JoinOptions) -> JoinOutput {
    let index = JoinIndex::build(tables, options);
    let mut output = JoinOutput {
        views: Vec::with_capacity(tables.molds.len() + tables.cutters.len()),
        skipped_rows: 0,
    };

    for mold in &tables.molds {
        match join_mold(&index, mold) {
            Some(view) => output.views.push(view),
            None => output.skipped_rows += 1,
        }
    }
    for cutter in &tables.cutters {
        match join_cutter(&index, cutter) {
            Some(view) => output.views.push(view),
            None => output.skipped_rows += 1,
        }
    }

    output
}

fn join_mold(index: &JoinIndex<'_>, mold: &Mold) -> Option<AssetView> {
    let id = normalize_key(&mold.mold_id)?;
    let key = AssetKey::mold(id);

    let design = normalize_opt_key(mold.design_id.as_deref())
        .and_then(|design_id| index.designs.get(design_id).copied());
    let (layer, rack) = index.resolve_location(mold.rack_layer_id.as_deref());
    let company = index.resolve_company(mold.storage_company_id.as_deref());
    let latest_status = index.latest_status.get(&key).copied();

    let related = index
        .cutters_by_mold
        .get(id)
        .map(|ids| ids.iter().map(|cutter_id| AssetKey::cutter(cutter_id)).collect())
        .unwrap_or_default();

    Some(AssetView {
        code: normalize_opt_key(mold.mold_code.as_deref())
            .unwrap_or(id)
            .to_string(),
        name: text_or_placeholder(mold.mold_name.as_deref()),
        dimensions: design
            .map(|design| format_dimensions(&[design.length, design.width, design.height]))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        location: format_location(layer, rack),
        company: format_company(company),
        status: format_status(latest_status),
        teflon: format_teflon(mold.teflon_status.as_deref()),
        design: design
            .map(|design| {
                normalize_opt_key(design.design_code.as_deref())
                    .unwrap_or(design.design_id.trim())
                    .to_string()
            })
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        related,
        is_external: index.is_external(company),
        refs: ResolvedRefs {
            design: design.cloned(),
            rack_layer: layer.cloned(),
            rack: rack.cloned(),
            storage_company: company.cloned(),
            latest_status: latest_status.cloned(),
        },
        record: AssetRecord::Mold(mold.clone()),
        key,
    })
}

fn join_cutter(index: &JoinIndex<'_>, cutter: &Cutter) -> Option<AssetView> {
    let id = normalize_key(&cutter.cutter_id)?;
    let key = AssetKey::cutter(id);

    let (layer, rack) = index.resolve_location(cutter.rack_layer_id.as_deref());
    let company = index.resolve_company(cutter.storage_company_id.as_deref());
    let latest_status = index.latest_status.get(&key).copied();

    let related = index
        .molds_by_cutter
        .get(id)
        .map(|ids| ids.iter().map(|mold_id| AssetKey::mold(mold_id)).collect())
        .unwrap_or_default();

    Some(AssetView {
        code: normalize_opt_key(cutter.cutter_no.as_deref())
            .unwrap_or(id)
            .to_string(),
        name: text_or_placeholder(cutter.cutter_name.as_deref()),
        dimensions: format_dimensions(&[cutter.cutline_length, cutter.cutline_width]),
        location: format_location(layer, rack),
        company: format_company(company),
        status: format_status(latest_status),
        teflon: PLACEHOLDER.to_string(),
        design: PLACEHOLDER.to_string(),
        related,
        is_external: index.is_external(company),
        refs: ResolvedRefs {
            design: None,
            rack_layer: layer.cloned(),
            rack: rack.cloned(),
            storage_company: company.cloned(),
            latest_status: latest_status.cloned(),
        },
        record: AssetRecord::Cutter(cutter.clone()),
        key,
    })
}

fn index_by<'a, T>(rows: &'a [T], key: impl Fn(&'a T) -> &'a String) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        if let Some(id) = normalize_key(key(row)) {
            map.entry(id).or_insert(row);
        }
    }
    map
}

fn push_unique<'a>(ids: &mut Vec<&'a str>, id: &'a str) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn text_or_placeholder(value: Option<&str>) -> String {
    normalize_opt_key(value).unwrap_or(PLACEHOLDER).to_string()
}

/// Joins the present parts with ` x `; all-absent yields the placeholder.
pub(crate) fn format_dimensions(parts: &[Option<f64>]) -> String {
    let present = parts
        .iter()
        .flatten()
        .filter(|value| value.is_finite())
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    if present.is_empty() {
        return PLACEHOLDER.to_string();
    }
    present.join(" x ")
}

fn format_location(layer: Option<&RackLayer>, rack: Option<&Rack>) -> String {
    let Some(layer) = layer else {
        return PLACEHOLDER.to_string();
    };

    let rack_label = rack
        .map(|rack| {
            normalize_opt_key(rack.symbol.as_deref()).unwrap_or(rack.rack_id.trim())
        })
        .or_else(|| normalize_opt_key(layer.rack_id.as_deref()));
    let layer_label =
        normalize_opt_key(layer.layer_number.as_deref()).unwrap_or(layer.rack_layer_id.trim());

    let mut location = match rack_label {
        Some(rack_label) => format!("{rack_label}-{layer_label}"),
        None => layer_label.to_string(),
    };
    if let Some(place) = rack.and_then(|rack| normalize_opt_key(rack.location.as_deref())) {
        location.push_str(&format!(" ({place})"));
    }
    location
}

fn format_company(company: Option<&Company>) -> String {
    company
        .map(|company| {
            normalize_opt_key(company.short_name.as_deref())
                .or_else(|| normalize_opt_key(company.name.as_deref()))
                .unwrap_or(company.company_id.trim())
                .to_string()
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn format_status(latest: Option<&StatusLog>) -> String {
    latest
        .and_then(|log| AssetStatus::label_for(&log.status))
        .unwrap_or_else(|| STATUS_PLACEHOLDER.to_string())
}

fn format_teflon(raw: Option<&str>) -> String {
    let Some(raw) = normalize_opt_key(raw) else {
        return PLACEHOLDER.to_string();
    };
    TeflonStatus::parse(raw)
        .map(|status| status.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::{format_dimensions, format_location};
    use crate::model::reference::{Rack, RackLayer};

    #[test]
    fn dimensions_skip_missing_parts() {
        assert_eq!(format_dimensions(&[Some(120.0), None, Some(30.5)]), "120 x 30.5");
        assert_eq!(format_dimensions(&[None, None]), "-");
        assert_eq!(format_dimensions(&[Some(f64::NAN)]), "-");
    }

    #[test]
    fn location_falls_back_to_layer_rack_id() {
        let mut layer = RackLayer::new("L1", " 7 ");
        layer.layer_number = Some("3".to_string());
        assert_eq!(format_location(Some(&layer), None), "7-3");

        let mut rack = Rack::new("7");
        rack.symbol = Some("A7".to_string());
        rack.location = Some("2F".to_string());
        assert_eq!(format_location(Some(&layer), Some(&rack)), "A7-3 (2F)");

        assert_eq!(format_location(None, Some(&rack)), "-");
    }
}
