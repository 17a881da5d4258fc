//! Mission data model: entity types, the `Mission` aggregate, and the
//! mutation entry points the editing engine drives.
//!
//! The types here are both the in-memory representation and the document
//! shape on disk (serde attributes carry the few differences: transient id
//! allocators are skipped, empty optional strings are omitted). All keyed
//! collections are `BTreeMap`s so that iteration order, and with it
//! serialization order and nearest-point tie-breaks, is deterministic.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_AGENT_COLOR, DEFAULT_MARKER, DEFAULT_TARGET_COLOR, INSTALL_ROOT_TOKEN,
    INSTALL_ROOT_VAR, MIN_MAP_SPAN_M,
};

/// Errors from mutation entry points. Lookups are re-checked defensively even
/// when the caller validated existence first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name already in use: {0}")]
    DuplicateName(String),
    #[error("unknown waypoint group: {0}")]
    GroupNotFound(String),
    #[error("unknown agent: {0}")]
    AgentNotFound(String),
    #[error("unknown waypoint {id} in group {group}")]
    WaypointNotFound { group: String, id: String },
    #[error("unknown observation point: {0}")]
    ObservationNotFound(String),
    #[error("unknown communication goal: {0}")]
    CommGoalNotFound(String),
    #[error("allocated id {0} already exists")]
    IdCollision(String),
}

/// A point in map-meter space. `z` is unused by the 2D editor but preserved
/// through serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Map bounding rectangle in map-meter units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl MapBounds {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// True when either span is too small for the map to be displayable.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width() < MIN_MAP_SPAN_M || self.height() < MIN_MAP_SPAN_M
    }
}

/// Map backdrop files and extent. All fields are required in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub image_file: String,
    pub region_file: String,
    pub dtm_file: String,
    pub blender_file: String,
    pub map_size: MapBounds,
}

/// A named vehicle type: config/region file references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentModel {
    #[serde(default)]
    pub config_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region_file: String,
}

/// A named point-of-interest marker. Carries no coordinates yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default = "default_target_color")]
    pub color: String,
}

/// An agent instance placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default = "default_agent_color")]
    pub color: String,
    #[serde(default = "default_marker")]
    pub marker: char,
    /// Referenced [`AgentModel`] name.
    #[serde(default)]
    pub model: String,
    /// Referenced [`WaypointGroup`] name.
    #[serde(default)]
    pub wp_group: String,
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub position: Point3,
    /// Closed polygon of map-meter points.
    #[serde(default)]
    pub safety_zone: Vec<Point3>,
    #[serde(default)]
    pub spare: bool,
    /// Reserved; not persisted yet.
    #[serde(skip)]
    pub authorized_comm: Vec<String>,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            color: default_agent_color(),
            marker: DEFAULT_MARKER,
            model: String::new(),
            wp_group: String::new(),
            energy: 0.0,
            position: Point3::default(),
            safety_zone: Vec::new(),
            spare: false,
            authorized_comm: Vec::new(),
        }
    }
}

/// A scheduled communication between two agents, optionally pinned to a
/// waypoint on each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommGoal {
    #[serde(default)]
    pub agent1: String,
    #[serde(default)]
    pub agent2: String,
    #[serde(default)]
    pub date: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wp_1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wp_2: String,
}

/// Allocator for per-container decimal-string ids.
///
/// Counters start at 1, advance on every allocation, and are never reused;
/// deleting the highest id does not give it back. They are derived state:
/// never persisted, rebuilt from the document on load via [`observe`].
///
/// [`observe`]: IdAllocator::observe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Return the next id and advance the counter.
    pub fn allocate(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }

    /// Bump the counter past an id seen in a loaded document.
    pub fn observe(&mut self, id: u32) {
        if id >= self.next {
            self.next = id + 1;
        }
    }

    /// The id the next allocation will return.
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// A named, independently colored/marked collection of waypoints and the
/// patrols built from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointGroup {
    #[serde(default = "default_marker")]
    pub marker: char,
    #[serde(default = "default_agent_color")]
    pub color: String,
    /// Waypoint id → position.
    #[serde(default)]
    pub waypoints: BTreeMap<String, Point3>,
    /// Patrol id → ordered waypoint-id route. Ids may repeat within a route.
    #[serde(default)]
    pub patrols: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    pub next_waypoint: IdAllocator,
    #[serde(skip)]
    pub next_patrol: IdAllocator,
}

/// Equality covers the persisted fields only; the allocators are derived
/// state and always re-derivable from the id sets.
impl PartialEq for WaypointGroup {
    fn eq(&self, other: &Self) -> bool {
        self.marker == other.marker
            && self.color == other.color
            && self.waypoints == other.waypoints
            && self.patrols == other.patrols
    }
}

impl WaypointGroup {
    #[must_use]
    pub fn new(color: &str, marker: char) -> Self {
        Self {
            marker,
            color: color.to_string(),
            waypoints: BTreeMap::new(),
            patrols: BTreeMap::new(),
            next_waypoint: IdAllocator::default(),
            next_patrol: IdAllocator::default(),
        }
    }
}

/// The `mission_goal` document section: global observation points and
/// communication goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionGoal {
    #[serde(default)]
    pub observation_points: BTreeMap<String, Point3>,
    #[serde(default)]
    pub communication_goals: BTreeMap<String, CommGoal>,
}

/// The aggregate root. Owned by exactly one editor at a time; the engine and
/// the persistence layer both receive it by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mission {
    #[serde(default)]
    pub max_time: f64,
    #[serde(default)]
    pub home_dir: String,
    pub map_data: MapData,
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
    #[serde(default)]
    pub agents: BTreeMap<String, Agent>,
    #[serde(default)]
    pub models: BTreeMap<String, AgentModel>,
    #[serde(default)]
    pub wp_groups: BTreeMap<String, WaypointGroup>,
    #[serde(rename = "mission_goal", default)]
    pub goal: MissionGoal,
    #[serde(skip)]
    pub next_observation: IdAllocator,
}

/// Equality covers the persisted fields only; see [`WaypointGroup`].
impl PartialEq for Mission {
    fn eq(&self, other: &Self) -> bool {
        self.max_time == other.max_time
            && self.home_dir == other.home_dir
            && self.map_data == other.map_data
            && self.targets == other.targets
            && self.agents == other.agents
            && self.models == other.models
            && self.wp_groups == other.wp_groups
            && self.goal == other.goal
    }
}

impl Mission {
    /// An empty mission: zero extent, no entities, counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the aggregate back to empty defaults, counters included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ── Waypoint groups ─────────────────────────────────────────

    /// Insert an empty waypoint group with fresh counters.
    ///
    /// # Errors
    ///
    /// `EmptyName` / `DuplicateName` when the name is unusable.
    pub fn add_waypoint_group(
        &mut self,
        name: &str,
        color: &str,
        marker: char,
    ) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if self.wp_groups.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.wp_groups.insert(name.to_string(), WaypointGroup::new(color, marker));
        Ok(())
    }

    /// Allocate a waypoint id in `group` and store `point` under it.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` when the group does not exist.
    pub fn add_waypoint(&mut self, group: &str, point: Point3) -> Result<String, ModelError> {
        let g = self.group_mut(group)?;
        let id = g.next_waypoint.allocate();
        g.waypoints.insert(id.clone(), point);
        Ok(id)
    }

    /// Rewrite a waypoint's x/y position. `z` is left untouched, matching the
    /// 2D editor's behavior.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` / `WaypointNotFound` on unknown references.
    pub fn move_waypoint(&mut self, group: &str, id: &str, x: f64, y: f64) -> Result<(), ModelError> {
        let g = self.group_mut(group)?;
        let Some(point) = g.waypoints.get_mut(id) else {
            return Err(ModelError::WaypointNotFound { group: group.to_string(), id: id.to_string() });
        };
        point.x = x;
        point.y = y;
        Ok(())
    }

    /// Delete a waypoint and cascade-delete every patrol in the group whose
    /// route references it anywhere. Returns the removed patrol ids.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` / `WaypointNotFound` on unknown references.
    pub fn delete_waypoint(&mut self, group: &str, id: &str) -> Result<Vec<String>, ModelError> {
        let g = self.group_mut(group)?;
        if g.waypoints.remove(id).is_none() {
            return Err(ModelError::WaypointNotFound { group: group.to_string(), id: id.to_string() });
        }
        let doomed: Vec<String> = g
            .patrols
            .iter()
            .filter(|(_, route)| route.iter().any(|wp| wp == id))
            .map(|(patrol_id, _)| patrol_id.clone())
            .collect();
        for patrol_id in &doomed {
            g.patrols.remove(patrol_id);
        }
        Ok(doomed)
    }

    // ── Patrols ─────────────────────────────────────────────────

    /// Allocate a fresh patrol id in `group` without creating the route yet.
    /// The route appears in the patrol map on its first appended point.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` when the group does not exist.
    pub fn open_patrol(&mut self, group: &str) -> Result<String, ModelError> {
        Ok(self.group_mut(group)?.next_patrol.allocate())
    }

    /// Append a waypoint reference to a patrol route, creating the route on
    /// first use. The waypoint id is deliberately not validated and duplicate
    /// consecutive points are accepted: documents written by earlier editors
    /// carry both shapes, and downstream consumers tolerate them. Consistency
    /// is maintained by the cascade rule in [`delete_waypoint`].
    ///
    /// # Errors
    ///
    /// `GroupNotFound` when the group does not exist.
    ///
    /// [`delete_waypoint`]: Mission::delete_waypoint
    pub fn add_patrol_point(
        &mut self,
        group: &str,
        patrol: &str,
        waypoint: &str,
    ) -> Result<(), ModelError> {
        self.group_mut(group)?
            .patrols
            .entry(patrol.to_string())
            .or_default()
            .push(waypoint.to_string());
        Ok(())
    }

    // ── Observation points ──────────────────────────────────────

    /// Allocate an observation id and store `point` under it.
    ///
    /// # Errors
    ///
    /// `IdCollision` when the allocated id already exists, a defensive check
    /// against counter corruption. The counter stays advanced, so a retry
    /// yields a fresh id.
    pub fn add_observation(&mut self, point: Point3) -> Result<String, ModelError> {
        let id = self.next_observation.allocate();
        if self.goal.observation_points.contains_key(&id) {
            return Err(ModelError::IdCollision(id));
        }
        self.goal.observation_points.insert(id.clone(), point);
        Ok(id)
    }

    /// Rewrite an observation point's x/y position.
    ///
    /// # Errors
    ///
    /// `ObservationNotFound` on an unknown id.
    pub fn move_observation(&mut self, id: &str, x: f64, y: f64) -> Result<(), ModelError> {
        let Some(point) = self.goal.observation_points.get_mut(id) else {
            return Err(ModelError::ObservationNotFound(id.to_string()));
        };
        point.x = x;
        point.y = y;
        Ok(())
    }

    /// Remove an observation point. Its id is never reused.
    ///
    /// # Errors
    ///
    /// `ObservationNotFound` on an unknown id.
    pub fn delete_observation(&mut self, id: &str) -> Result<(), ModelError> {
        if self.goal.observation_points.remove(id).is_none() {
            return Err(ModelError::ObservationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ── Agents & safety zones ───────────────────────────────────

    /// Insert a new agent.
    ///
    /// # Errors
    ///
    /// `EmptyName` / `DuplicateName` when the name is unusable.
    pub fn add_agent(&mut self, name: &str, agent: Agent) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if self.agents.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.agents.insert(name.to_string(), agent);
        Ok(())
    }

    /// Append a vertex to the named agent's safety-zone polygon.
    ///
    /// # Errors
    ///
    /// `AgentNotFound` on an unknown agent.
    pub fn add_safety_zone_point(&mut self, agent: &str, point: Point3) -> Result<(), ModelError> {
        self.agent_mut(agent)?.safety_zone.push(point);
        Ok(())
    }

    /// Empty the named agent's safety-zone polygon.
    ///
    /// # Errors
    ///
    /// `AgentNotFound` on an unknown agent.
    pub fn clear_safety_zone(&mut self, agent: &str) -> Result<(), ModelError> {
        self.agent_mut(agent)?.safety_zone.clear();
        Ok(())
    }

    // ── Targets, models, communication goals ────────────────────

    /// Insert a new target marker.
    ///
    /// # Errors
    ///
    /// `EmptyName` / `DuplicateName` when the name is unusable.
    pub fn add_target(&mut self, name: &str, color: &str) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if self.targets.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.targets.insert(name.to_string(), Target { color: color.to_string() });
        Ok(())
    }

    /// Insert a new agent model.
    ///
    /// # Errors
    ///
    /// `EmptyName` / `DuplicateName` when the name is unusable.
    pub fn add_agent_model(&mut self, name: &str, model: AgentModel) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if self.models.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.models.insert(name.to_string(), model);
        Ok(())
    }

    /// Insert a communication goal. Agent and waypoint references are not
    /// validated; the document format is lenient about them.
    ///
    /// # Errors
    ///
    /// `EmptyName` / `DuplicateName` when the name is unusable.
    pub fn add_comm_goal(&mut self, name: &str, goal: CommGoal) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if self.goal.communication_goals.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.goal.communication_goals.insert(name.to_string(), goal);
        Ok(())
    }

    /// Remove a communication goal.
    ///
    /// # Errors
    ///
    /// `CommGoalNotFound` on an unknown name.
    pub fn delete_comm_goal(&mut self, name: &str) -> Result<(), ModelError> {
        if self.goal.communication_goals.remove(name).is_none() {
            return Err(ModelError::CommGoalNotFound(name.to_string()));
        }
        Ok(())
    }

    // ── Paths ───────────────────────────────────────────────────

    /// The home directory with the installation-root token expanded.
    #[must_use]
    pub fn home_dir(&self) -> PathBuf {
        PathBuf::from(expand_install_root(&self.home_dir))
    }

    /// Resolve a mission-relative path against the expanded home directory.
    /// The token is expanded in the relative part too.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.home_dir().join(expand_install_root(relative))
    }

    // ── Geometry recovery ───────────────────────────────────────

    /// Replace the map bounds with the bounding box of every waypoint in
    /// every group. Returns `false`, leaving the bounds untouched, when
    /// there are no waypoints to recover from.
    pub fn recompute_map_bounds(&mut self) -> bool {
        let mut points = self.wp_groups.values().flat_map(|g| g.waypoints.values());
        let Some(first) = points.next() else {
            return false;
        };
        let mut bounds = MapBounds { x_min: first.x, x_max: first.x, y_min: first.y, y_max: first.y };
        for p in points {
            bounds.x_min = bounds.x_min.min(p.x);
            bounds.x_max = bounds.x_max.max(p.x);
            bounds.y_min = bounds.y_min.min(p.y);
            bounds.y_max = bounds.y_max.max(p.y);
        }
        self.map_data.map_size = bounds;
        true
    }

    // ── Internal lookups ────────────────────────────────────────

    fn group_mut(&mut self, name: &str) -> Result<&mut WaypointGroup, ModelError> {
        self.wp_groups
            .get_mut(name)
            .ok_or_else(|| ModelError::GroupNotFound(name.to_string()))
    }

    fn agent_mut(&mut self, name: &str) -> Result<&mut Agent, ModelError> {
        self.agents
            .get_mut(name)
            .ok_or_else(|| ModelError::AgentNotFound(name.to_string()))
    }
}

/// Expand the installation-root token from the environment. An unset
/// variable expands to the empty string, matching the original tooling.
#[must_use]
pub fn expand_install_root(path: &str) -> String {
    if path.contains(INSTALL_ROOT_TOKEN) {
        let root = env::var(INSTALL_ROOT_VAR).unwrap_or_default();
        path.replacen(INSTALL_ROOT_TOKEN, &root, 1)
    } else {
        path.to_string()
    }
}

fn default_agent_color() -> String {
    DEFAULT_AGENT_COLOR.to_string()
}

fn default_target_color() -> String {
    DEFAULT_TARGET_COLOR.to_string()
}

fn default_marker() -> char {
    DEFAULT_MARKER
}
