//! Mission document persistence: JSON load with validation and warnings,
//! atomic save.
//!
//! Loading is all-or-nothing: a malformed document or a missing required
//! field fails the whole load and nothing partial escapes. Missing optional
//! sections are tolerated: they come back as empty containers and a
//! [`LoadWarning`], so a host can show them without aborting. Id counters
//! are always rebuilt from the ids actually present; the document is never
//! trusted for derived state.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::model::Mission;

/// Errors from [`load`] and [`save`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("non-numeric {section} id: {key:?}")]
    InvalidId { section: &'static str, key: String },
}

/// Non-fatal findings surfaced to the user after a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// An optional section is absent; its container was left empty.
    MissingSection(&'static str),
    /// An agent entry carries no safety-zone polygon.
    NoSafetyZone(String),
    /// The map rectangle was degenerate. `recovered` tells whether it could
    /// be rebuilt from waypoint extents.
    DegenerateMapBounds { recovered: bool },
    /// The map image was not found under the expanded home directory.
    MapImageMissing(String),
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection(section) => write!(f, "no {section} in mission file"),
            Self::NoSafetyZone(agent) => write!(f, "no safety zone for agent {agent}"),
            Self::DegenerateMapBounds { recovered: true } => {
                write!(f, "map size not consistent; rebuilt from waypoint extents")
            }
            Self::DegenerateMapBounds { recovered: false } => {
                write!(f, "map size not consistent and no waypoints to rebuild it from")
            }
            Self::MapImageMissing(path) => {
                write!(f, "unable to read map image {path}; try a different home directory")
            }
        }
    }
}

/// A successfully loaded mission plus everything worth telling the user.
#[derive(Debug)]
pub struct LoadOutcome {
    pub mission: Mission,
    pub warnings: Vec<LoadWarning>,
}

const SECTIONS: &[(&str, &str)] = &[
    ("/targets", "targets"),
    ("/agents", "agents"),
    ("/models", "models"),
    ("/wp_groups", "wp_groups"),
    ("/mission_goal/observation_points", "observation points"),
    ("/mission_goal/communication_goals", "communication goals"),
];

const REQUIRED: &[(&str, &str)] = &[
    ("/map_data/image_file", "map_data.image_file"),
    ("/map_data/region_file", "map_data.region_file"),
    ("/map_data/dtm_file", "map_data.dtm_file"),
    ("/map_data/blender_file", "map_data.blender_file"),
    ("/map_data/map_size/x_min", "map_data.map_size.x_min"),
    ("/map_data/map_size/x_max", "map_data.map_size.x_max"),
    ("/map_data/map_size/y_min", "map_data.map_size.y_min"),
    ("/map_data/map_size/y_max", "map_data.map_size.y_max"),
];

/// Load a mission document.
///
/// # Errors
///
/// `Io` when the file is unreadable; `Parse`/`MissingField`/`InvalidId` when
/// the document is malformed. The error leaves no partial mission behind.
pub fn load(path: &Path) -> Result<LoadOutcome, DocumentError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;

    if value.pointer("/map_data").is_none() {
        return Err(DocumentError::MissingField("map_data"));
    }
    for &(pointer, name) in REQUIRED {
        if value.pointer(pointer).is_none() {
            return Err(DocumentError::MissingField(name));
        }
    }

    let mut warnings = Vec::new();
    for &(pointer, name) in SECTIONS {
        if value.pointer(pointer).is_none() {
            warnings.push(LoadWarning::MissingSection(name));
        }
    }
    if let Some(agents) = value.pointer("/agents").and_then(Value::as_object) {
        for (name, agent) in agents {
            if agent.get("safety_zone").is_none() {
                warnings.push(LoadWarning::NoSafetyZone(name.clone()));
            }
        }
    }

    let mut mission: Mission = serde_json::from_value(value)?;
    rederive_counters(&mut mission)?;

    if mission.map_data.map_size.is_degenerate() {
        let recovered = mission.recompute_map_bounds();
        warnings.push(LoadWarning::DegenerateMapBounds { recovered });
    }

    let image = mission.resolve(&mission.map_data.image_file);
    if !image.exists() {
        warnings.push(LoadWarning::MapImageMissing(image.display().to_string()));
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    Ok(LoadOutcome { mission, warnings })
}

/// Save a mission document with write-then-replace: the previous file stays
/// untouched unless the new content is fully written.
///
/// # Errors
///
/// `Parse` when serialization fails, `Io` when the temp file cannot be
/// written or swapped into place.
pub fn save(mission: &Mission, path: &Path) -> Result<(), DocumentError> {
    let json = serde_json::to_string_pretty(mission)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| DocumentError::Io(e.error))?;
    Ok(())
}

/// Rebuild every id allocator as `1 + max(ids present)`.
fn rederive_counters(mission: &mut Mission) -> Result<(), DocumentError> {
    for group in mission.wp_groups.values_mut() {
        for key in group.waypoints.keys() {
            group.next_waypoint.observe(parse_id("waypoint", key)?);
        }
        for key in group.patrols.keys() {
            group.next_patrol.observe(parse_id("patrol", key)?);
        }
    }
    for key in mission.goal.observation_points.keys() {
        mission.next_observation.observe(parse_id("observation", key)?);
    }
    Ok(())
}

fn parse_id(section: &'static str, key: &str) -> Result<u32, DocumentError> {
    key.parse()
        .map_err(|_| DocumentError::InvalidId { section, key: key.to_string() })
}
