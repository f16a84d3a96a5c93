//! Wire shapes exchanged with the spreadsheet backend
//!
//! Field names follow the sheet headers (`Proyecto`, `Torres`, `Piso`, ...).
//! Writes always use the canonical configuration shape. Reads also accept
//! the older shapes still found in some sheets, logging a deprecation
//! warning for each.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sitetrack_core::{Checkpoint, FloorPlan, ProgressEntry, ProgressRecord, ProjectConfig};

use crate::GatewayError;

// ============================================================================
// Coercion
// ============================================================================

/// Number or numeric string as a float
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Percentage, rounded to the nearest integer and required to be in 0..=100
pub fn coerce_percent(value: &Value) -> Option<u8> {
    let n = as_number(value)?.round();
    (0.0..=100.0).contains(&n).then_some(n as u8)
}

/// Whole non-negative count (floor number or floor count)
pub fn coerce_count(value: &Value) -> Option<u32> {
    let n = as_number(value)?;
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

/// Tower name typed as text or as a number (`1`, `2.0` -> `"2"`)
pub fn coerce_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TowersWire {
    List(Vec<Value>),
    /// Deprecated: "A, B, C"
    Joined(String),
    /// One tower whose name the sheet stored as a number
    Single(serde_json::Number),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FloorsWire {
    /// Aligned with `Torres`
    Positional(Vec<Value>),
    /// Deprecated: tower -> count
    ByTower(BTreeMap<String, Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScheduleWire {
    /// tower -> activity -> floor -> percent
    Nested(BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>),
    /// Deprecated: activity -> percent, for every tower and floor
    Flat(BTreeMap<String, Value>),
}

#[derive(Debug, Deserialize)]
struct CheckpointWire {
    #[serde(default)]
    date: String,
    #[serde(default)]
    progress: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigWire {
    #[serde(rename = "Proyecto", default)]
    proyecto: Option<String>,
    #[serde(rename = "Torres", default)]
    torres: Option<TowersWire>,
    #[serde(rename = "PisosPorTorre", default)]
    pisos_por_torre: Option<FloorsWire>,
    #[serde(rename = "Actividades", default)]
    actividades: Option<Vec<String>>,
    #[serde(rename = "ScheduledProgress", default)]
    scheduled_progress: Option<ScheduleWire>,
    #[serde(rename = "ScheduledTimeline", default)]
    scheduled_timeline: Option<BTreeMap<String, BTreeMap<String, Vec<CheckpointWire>>>>,
}

/// Decode the `data` payload of a `getConfig` response
pub fn decode_config(data: Value) -> Result<ProjectConfig, GatewayError> {
    if data.is_null() {
        return Ok(ProjectConfig::default());
    }

    let wire: ConfigWire = serde_json::from_value(data).map_err(|e| {
        tracing::error!(error = %e, "configuration payload has an unexpected shape");
        GatewayError::MalformedResponse
    })?;

    let towers: Vec<String> = match wire.torres {
        Some(TowersWire::List(list)) => {
            let total = list.len();
            let names: Vec<String> = list.iter().filter_map(coerce_name).collect();
            if names.len() < total {
                tracing::warn!(dropped = total - names.len(), "ignored Torres entries that are not names");
            }
            names
        }
        Some(TowersWire::Joined(joined)) => {
            tracing::warn!("deprecated configuration shape: comma-joined Torres");
            joined
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        }
        Some(TowersWire::Single(number)) => {
            coerce_name(&Value::Number(number)).into_iter().collect()
        }
        None => Vec::new(),
    };

    let floors = match wire.pisos_por_torre {
        Some(FloorsWire::Positional(counts)) => towers
            .iter()
            .enumerate()
            .map(|(i, tower)| (tower.clone(), floor_count(counts.get(i))))
            .collect(),
        Some(FloorsWire::ByTower(by_tower)) => {
            tracing::warn!("deprecated configuration shape: PisosPorTorre keyed by tower");
            towers
                .iter()
                .map(|tower| (tower.clone(), floor_count(by_tower.get(tower))))
                .collect()
        }
        None => towers.iter().map(|t| (t.clone(), 1)).collect(),
    };

    let activities = wire.actividades.unwrap_or_default();
    let mut config = ProjectConfig {
        name: wire.proyecto.unwrap_or_default(),
        towers,
        floors,
        activities,
        ..ProjectConfig::default()
    };

    match wire.scheduled_progress {
        Some(ScheduleWire::Nested(nested)) => {
            for (tower, by_activity) in nested {
                for (activity, by_floor) in by_activity {
                    let plan: FloorPlan = by_floor
                        .iter()
                        .filter_map(|(floor, pct)| {
                            Some((floor.trim().parse().ok()?, coerce_percent(pct)?))
                        })
                        .collect();
                    config
                        .scheduled_progress
                        .entry(tower.clone())
                        .or_default()
                        .insert(activity, plan);
                }
            }
        }
        Some(ScheduleWire::Flat(flat)) => {
            tracing::warn!("deprecated configuration shape: flat ScheduledProgress");
            for (activity, pct) in &flat {
                let Some(pct) = coerce_percent(pct) else {
                    continue;
                };
                for tower in &config.towers {
                    let plan: FloorPlan = (1..=config.floor_count(tower)).map(|f| (f, pct)).collect();
                    config
                        .scheduled_progress
                        .entry(tower.clone())
                        .or_default()
                        .insert(activity.clone(), plan);
                }
            }
        }
        None => {}
    }

    for (tower, by_activity) in wire.scheduled_timeline.unwrap_or_default() {
        for (activity, checkpoints) in by_activity {
            let timeline: Vec<Checkpoint> = checkpoints
                .into_iter()
                .filter_map(|c| Some(Checkpoint::new(c.date, coerce_percent(&c.progress)?)))
                .collect();
            config
                .scheduled_timeline
                .entry(tower.clone())
                .or_default()
                .insert(activity, timeline);
        }
    }

    Ok(config)
}

/// Missing or zero counts mean a single floor
fn floor_count(value: Option<&Value>) -> u32 {
    value.and_then(coerce_count).filter(|&n| n > 0).unwrap_or(1)
}

/// Canonical `saveConfig` request body
pub fn encode_config(config: &ProjectConfig) -> Value {
    let floors: Vec<u32> = config.towers.iter().map(|t| config.floor_count(t)).collect();
    let timeline: BTreeMap<&str, BTreeMap<&str, Vec<Value>>> = config
        .scheduled_timeline
        .iter()
        .map(|(tower, by_activity)| {
            let by_activity = by_activity
                .iter()
                .map(|(activity, checkpoints)| {
                    let points = checkpoints
                        .iter()
                        .map(|c| json!({ "date": c.date, "progress": c.progress }))
                        .collect();
                    (activity.as_str(), points)
                })
                .collect();
            (tower.as_str(), by_activity)
        })
        .collect();

    json!({
        "action": "saveConfig",
        "config": {
            "Proyecto": config.name,
            "Torres": config.towers,
            "PisosPorTorre": floors,
            "Actividades": config.activities,
            "ScheduledProgress": config.scheduled_progress,
            "ScheduledTimeline": timeline,
        }
    })
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Deserialize)]
struct RecordWire {
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
    #[serde(rename = "Fecha", default)]
    fecha: Option<String>,
    #[serde(rename = "Usuario", default)]
    usuario: String,
    #[serde(rename = "Torre")]
    torre: Value,
    #[serde(rename = "Piso")]
    piso: Value,
    #[serde(rename = "Actividad")]
    actividad: String,
    #[serde(rename = "Avance")]
    avance: Value,
    #[serde(rename = "Nota", default)]
    nota: Option<String>,
}

/// Decode the `data` payload of a `fetchProgress` response.
///
/// Rows that are not records, or whose floor or percentage cannot be
/// coerced, are dropped with a warning.
pub fn decode_records(data: Value) -> Vec<ProgressRecord> {
    let rows = match data {
        Value::Array(rows) => rows,
        Value::Null => return Vec::new(),
        other => {
            tracing::warn!(kind = %json_kind(&other), "progress payload is not a list");
            return Vec::new();
        }
    };

    let total = rows.len();
    let records: Vec<ProgressRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| decode_record(i, row))
        .collect();

    if records.len() < total {
        tracing::warn!(dropped = total - records.len(), total, "dropped unreadable progress rows");
    }
    records
}

fn decode_record(index: usize, row: Value) -> Option<ProgressRecord> {
    let wire: RecordWire = match serde_json::from_value(row) {
        Ok(wire) => wire,
        Err(e) => {
            tracing::warn!(row = index, error = %e, "progress row is missing fields");
            return None;
        }
    };

    let Some(tower) = coerce_name(&wire.torre) else {
        tracing::warn!(row = index, torre = %wire.torre, "progress row has an invalid tower");
        return None;
    };
    let Some(floor) = coerce_count(&wire.piso) else {
        tracing::warn!(row = index, piso = %wire.piso, "progress row has an invalid floor");
        return None;
    };
    let Some(percent) = coerce_percent(&wire.avance) else {
        tracing::warn!(row = index, avance = %wire.avance, "progress row has an invalid percentage");
        return None;
    };

    Some(ProgressRecord {
        timestamp: wire.timestamp.or(wire.fecha).unwrap_or_default(),
        user: wire.usuario,
        tower,
        floor,
        activity: wire.actividad,
        percent,
        note: wire.nota.filter(|n| !n.trim().is_empty()),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Serialize)]
struct EntryWire<'a> {
    #[serde(rename = "Usuario")]
    usuario: &'a str,
    #[serde(rename = "Torre")]
    torre: &'a str,
    #[serde(rename = "Piso")]
    piso: u32,
    #[serde(rename = "Actividad")]
    actividad: &'a str,
    #[serde(rename = "Avance")]
    avance: u8,
    #[serde(rename = "Nota", skip_serializing_if = "Option::is_none")]
    nota: Option<&'a str>,
}

/// `saveProgress` request body carrying the whole batch
pub fn encode_entries(entries: &[ProgressEntry]) -> Value {
    let rows: Vec<EntryWire<'_>> = entries
        .iter()
        .map(|e| EntryWire {
            usuario: &e.user,
            torre: &e.tower,
            piso: e.floor,
            actividad: &e.activity,
            avance: e.percent,
            nota: e.note.as_deref(),
        })
        .collect();

    json!({ "action": "saveProgress", "rows": rows })
}

/// Number of rows the backend reports as saved, if it says so
pub fn decode_saved_count(data: &Value) -> Option<usize> {
    data.get("saved")
        .or(Some(data))
        .and_then(coerce_count)
        .map(|n| n as usize)
}
