//! The editor core: owns the mission, the camera, and the editing state
//! machine, and turns raw pointer events into validated model mutations.
//!
//! Hosts wire their windowing layer's pointer/wheel events into the
//! `on_*` handlers and process the returned [`Action`]s (persisting edits,
//! repainting, and so on). All handlers are synchronous; the engine never
//! blocks on anything but the caller.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::mem;

use crate::camera::{MapCamera, Point};
use crate::hit;
use crate::input::{Button, Buttons, EditMode, EditOp, EditState, WheelDelta};
use crate::model::{Mission, ModelError, Point3};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The pointer moved; carries its map-meter position for a status bar.
    PointerMoved { x_m: f64, y_m: f64 },
    /// The scene changed (model edit, pan, zoom, or preview); repaint.
    RenderNeeded,
    WaypointAdded { group: String, id: String },
    WaypointMoved { group: String, id: String },
    /// A waypoint was deleted; `patrols_removed` lists the routes that
    /// referenced it and were cascade-deleted with it.
    WaypointDeleted { group: String, id: String, patrols_removed: Vec<String> },
    ZoneVertexAdded { agent: String },
    /// A fresh patrol route was opened by the first press of a patrol edit.
    PatrolOpened { group: String, patrol: String },
    PatrolExtended { group: String, patrol: String, waypoint: String },
    ObservationAdded { id: String },
    ObservationMoved { id: String },
    ObservationDeleted { id: String },
    /// A mutation was refused by the model; the state machine carries on.
    EditRejected(ModelError),
}

/// Live preview of the safety-zone polygon being drawn: the rubber-band edge
/// runs from `anchor` (last committed vertex, if any) to `cursor`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePreview {
    pub agent: String,
    pub anchor: Option<Point3>,
    /// Cursor position in map meters.
    pub cursor: Point,
}

/// Core editor state; all logic that doesn't depend on a windowing layer.
pub struct EditorCore {
    pub mission: Mission,
    pub camera: MapCamera,
    pub state: EditState,
    /// Grab-pan anchor in map pixels while a secondary drag is in progress.
    panning: Option<Point>,
    cursor_m: Point,
}

impl Default for EditorCore {
    fn default() -> Self {
        Self {
            mission: Mission::new(),
            camera: MapCamera::new(),
            state: EditState::Idle,
            panning: None,
            cursor_m: Point::new(0.0, 0.0),
        }
    }
}

impl EditorCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mission(mission: Mission) -> Self {
        let mut core = Self::default();
        core.replace_mission(mission);
        core
    }

    // ── Mission / viewport wiring ───────────────────────────────

    /// Swap in a freshly loaded mission, dropping any in-progress edit and
    /// resetting the view.
    pub fn replace_mission(&mut self, mission: Mission) {
        self.mission = mission;
        self.state = EditState::Idle;
        self.panning = None;
        self.camera.set_map_bounds(&self.mission.map_data.map_size);
        self.camera.clear_zoom();
    }

    /// Tell the camera the map image's pixel size (the host decodes the
    /// image; the engine only needs its dimensions).
    pub fn set_map_image_size(&mut self, width_px: f64, height_px: f64) {
        self.camera.set_image_size(width_px, height_px);
        self.camera.set_map_bounds(&self.mission.map_data.map_size);
    }

    /// Propagate a viewport resize.
    pub fn set_viewport_size(&mut self, width_px: f64, height_px: f64) {
        self.camera.set_viewport_size(width_px, height_px);
    }

    // ── Mode selection ──────────────────────────────────────────

    /// Arm an edit operation on a target group or agent. Always overrides
    /// whatever was active, from any state, without confirmation.
    pub fn enter_mode(&mut self, mode: EditMode, target: &str) {
        self.state = EditState::Armed(EditOp::new(mode, target));
    }

    // ── Input events ────────────────────────────────────────────

    pub fn on_pointer_down(&mut self, vp: Point, button: Button) -> Vec<Action> {
        let mut actions = Vec::new();
        match button {
            Button::Primary => {
                // The first press both activates the armed operation and
                // performs its core action, so arming runs first and the
                // press handler sees the already-active state.
                let state = mem::take(&mut self.state);
                let state = match state {
                    EditState::Armed(op) => self.start_op(op, vp, &mut actions),
                    other => other,
                };
                self.state = match state {
                    EditState::Active(mut op) => {
                        self.press_op(&mut op, vp, &mut actions);
                        EditState::Active(op)
                    }
                    other => other,
                };
                if !matches!(self.state, EditState::Idle) {
                    actions.push(Action::RenderNeeded);
                }
            }
            Button::Secondary => {
                if matches!(self.state, EditState::Idle) {
                    self.panning = Some(self.camera.viewport_to_map_px(vp));
                } else {
                    self.state = EditState::Idle;
                    actions.push(Action::RenderNeeded);
                }
            }
            Button::Middle => {}
        }
        actions
    }

    pub fn on_pointer_move(&mut self, vp: Point, held: Buttons) -> Vec<Action> {
        let m = self.camera.viewport_to_meters(vp);
        self.cursor_m = m;
        let mut actions = vec![Action::PointerMoved { x_m: m.x, y_m: m.y }];

        if let Some(anchor) = self.panning {
            if held.secondary {
                let current = self.camera.viewport_to_map_px(vp);
                self.camera.pan_by(Point::new(current.x - anchor.x, current.y - anchor.y));
                actions.push(Action::RenderNeeded);
                return actions;
            }
        }

        enum Drag {
            Waypoint(String, String),
            Observation(String),
            ZonePreview,
        }
        let drag = match &self.state {
            EditState::Active(EditOp::MoveWaypoints { group, grabbed: Some(id) }) => {
                Some(Drag::Waypoint(group.clone(), id.clone()))
            }
            EditState::Active(EditOp::MoveObservations { grabbed: Some(id) }) => {
                Some(Drag::Observation(id.clone()))
            }
            EditState::Active(EditOp::AddSafetyZone { .. }) => Some(Drag::ZonePreview),
            _ => None,
        };
        match drag {
            Some(Drag::Waypoint(group, id)) => {
                match self.mission.move_waypoint(&group, &id, m.x, m.y) {
                    Ok(()) => actions.push(Action::WaypointMoved { group, id }),
                    Err(err) => reject(err, &mut actions),
                }
                actions.push(Action::RenderNeeded);
            }
            Some(Drag::Observation(id)) => {
                match self.mission.move_observation(&id, m.x, m.y) {
                    Ok(()) => actions.push(Action::ObservationMoved { id }),
                    Err(err) => reject(err, &mut actions),
                }
                actions.push(Action::RenderNeeded);
            }
            Some(Drag::ZonePreview) => actions.push(Action::RenderNeeded),
            None => {}
        }
        actions
    }

    pub fn on_pointer_up(&mut self, held: Buttons) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.panning.is_some() && !held.secondary {
            self.panning = None;
            self.camera.clamp_origin();
            actions.push(Action::RenderNeeded);
        }

        if !held.primary {
            // Releasing the grab in a move mode re-arms the operation so the
            // next press can pick another point. The mode itself survives.
            let state = mem::take(&mut self.state);
            self.state = match state {
                EditState::Active(EditOp::MoveWaypoints { group, .. }) => {
                    actions.push(Action::RenderNeeded);
                    EditState::Armed(EditOp::MoveWaypoints { group, grabbed: None })
                }
                EditState::Active(EditOp::MoveObservations { .. }) => {
                    actions.push(Action::RenderNeeded);
                    EditState::Armed(EditOp::MoveObservations { grabbed: None })
                }
                other => other,
            };
        }
        actions
    }

    pub fn on_wheel(&mut self, vp: Point, delta: WheelDelta) -> Vec<Action> {
        let notches = if delta.dy < 0.0 { 1.0 } else { -1.0 };
        self.camera.zoom_at(vp, notches);
        vec![Action::RenderNeeded]
    }

    // ── Queries ─────────────────────────────────────────────────

    /// The active (or pending) edit mode, if any.
    #[must_use]
    pub fn mode(&self) -> Option<EditMode> {
        self.state.op().map(EditOp::mode)
    }

    /// The waypoint currently grabbed by a move edit, as `(group, id)`.
    #[must_use]
    pub fn grabbed_waypoint(&self) -> Option<(&str, &str)> {
        match &self.state {
            EditState::Active(EditOp::MoveWaypoints { group, grabbed: Some(id) }) => {
                Some((group.as_str(), id.as_str()))
            }
            _ => None,
        }
    }

    /// The observation point currently grabbed by a move edit.
    #[must_use]
    pub fn grabbed_observation(&self) -> Option<&str> {
        match &self.state {
            EditState::Active(EditOp::MoveObservations { grabbed: Some(id) }) => Some(id.as_str()),
            _ => None,
        }
    }

    /// The rubber-band preview for an in-progress safety-zone edit.
    #[must_use]
    pub fn zone_preview(&self) -> Option<ZonePreview> {
        match &self.state {
            EditState::Active(EditOp::AddSafetyZone { agent }) => {
                let anchor = self
                    .mission
                    .agents
                    .get(agent)
                    .and_then(|a| a.safety_zone.last())
                    .copied();
                Some(ZonePreview { agent: agent.clone(), anchor, cursor: self.cursor_m })
            }
            _ => None,
        }
    }

    /// Last reported cursor position in map meters.
    #[must_use]
    pub fn cursor_meters(&self) -> Point {
        self.cursor_m
    }

    // ── Per-mode behavior ───────────────────────────────────────

    /// Activate an armed operation: move modes grab (and snap) the nearest
    /// point, patrol mode opens its route. Returns `Idle` when activation
    /// cannot make progress.
    fn start_op(&mut self, op: EditOp, vp: Point, actions: &mut Vec<Action>) -> EditState {
        let m = self.camera.viewport_to_meters(vp);
        match op {
            EditOp::MoveWaypoints { group, .. } => {
                let grabbed = self
                    .mission
                    .wp_groups
                    .get(&group)
                    .and_then(|g| hit::nearest_waypoint(g, m.x, m.y))
                    .map(str::to_string);
                if let Some(id) = &grabbed {
                    match self.mission.move_waypoint(&group, id, m.x, m.y) {
                        Ok(()) => {
                            actions.push(Action::WaypointMoved { group: group.clone(), id: id.clone() });
                        }
                        Err(err) => reject(err, actions),
                    }
                }
                EditState::Active(EditOp::MoveWaypoints { group, grabbed })
            }
            EditOp::MoveObservations { .. } => {
                let grabbed = hit::nearest_observation(&self.mission.goal.observation_points, m.x, m.y)
                    .map(str::to_string);
                if let Some(id) = &grabbed {
                    match self.mission.move_observation(id, m.x, m.y) {
                        Ok(()) => actions.push(Action::ObservationMoved { id: id.clone() }),
                        Err(err) => reject(err, actions),
                    }
                }
                EditState::Active(EditOp::MoveObservations { grabbed })
            }
            EditOp::AddPatrol { group, .. } => match self.mission.open_patrol(&group) {
                Ok(patrol) => {
                    actions.push(Action::PatrolOpened { group: group.clone(), patrol: patrol.clone() });
                    EditState::Active(EditOp::AddPatrol { group, patrol: Some(patrol) })
                }
                Err(err) => {
                    reject(err, actions);
                    EditState::Idle
                }
            },
            other => EditState::Active(other),
        }
    }

    /// Run the core action of an active operation for a primary press.
    fn press_op(&mut self, op: &mut EditOp, vp: Point, actions: &mut Vec<Action>) {
        let m = self.camera.viewport_to_meters(vp);
        let point = Point3::new(m.x, m.y, 0.0);
        match op {
            EditOp::AddWaypoints { group } => match self.mission.add_waypoint(group, point) {
                Ok(id) => actions.push(Action::WaypointAdded { group: group.clone(), id }),
                Err(err) => reject(err, actions),
            },
            // Move modes act on grab (activation) and drag (pointer move).
            EditOp::MoveWaypoints { .. } | EditOp::MoveObservations { .. } => {}
            EditOp::AddSafetyZone { agent } => {
                match self.mission.add_safety_zone_point(agent, point) {
                    Ok(()) => actions.push(Action::ZoneVertexAdded { agent: agent.clone() }),
                    Err(err) => reject(err, actions),
                }
            }
            EditOp::DeleteWaypoints { group } => {
                let nearest = self
                    .mission
                    .wp_groups
                    .get(group.as_str())
                    .and_then(|g| hit::nearest_waypoint(g, m.x, m.y))
                    .map(str::to_string);
                if let Some(id) = nearest {
                    match self.mission.delete_waypoint(group, &id) {
                        Ok(patrols_removed) => actions.push(Action::WaypointDeleted {
                            group: group.clone(),
                            id,
                            patrols_removed,
                        }),
                        Err(err) => reject(err, actions),
                    }
                }
            }
            EditOp::AddPatrol { group, patrol: Some(patrol) } => {
                let nearest = self
                    .mission
                    .wp_groups
                    .get(group.as_str())
                    .and_then(|g| hit::nearest_waypoint(g, m.x, m.y))
                    .map(str::to_string);
                if let Some(waypoint) = nearest {
                    match self.mission.add_patrol_point(group, patrol, &waypoint) {
                        Ok(()) => actions.push(Action::PatrolExtended {
                            group: group.clone(),
                            patrol: patrol.clone(),
                            waypoint,
                        }),
                        Err(err) => reject(err, actions),
                    }
                }
            }
            EditOp::AddPatrol { patrol: None, .. } => {}
            EditOp::AddObservations => match self.mission.add_observation(point) {
                Ok(id) => actions.push(Action::ObservationAdded { id }),
                Err(err) => reject(err, actions),
            },
            EditOp::DeleteObservations => {
                let nearest = hit::nearest_observation(&self.mission.goal.observation_points, m.x, m.y)
                    .map(str::to_string);
                if let Some(id) = nearest {
                    match self.mission.delete_observation(&id) {
                        Ok(()) => actions.push(Action::ObservationDeleted { id }),
                        Err(err) => reject(err, actions),
                    }
                }
            }
        }
    }
}

fn reject(err: ModelError, actions: &mut Vec<Action>) {
    tracing::warn!("edit rejected: {err}");
    actions.push(Action::EditRejected(err));
}
