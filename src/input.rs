//! Input model: edit modes, pointer buttons, and the editing state machine
//! types.
//!
//! `EditOp` is the active operation with its per-mode context: the target
//! group or agent, plus the grabbed point in the move modes and the lazily
//! allocated route id in patrol mode. `EditState` is the protocol every
//! operation moves through: armed by a menu action, activated by the first
//! primary press, and cancelled from anywhere by a secondary press.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button; drives the active edit operation.
    Primary,
    /// Middle mouse button (unused).
    Middle,
    /// Right mouse button; cancels edits and drags the map.
    Secondary,
}

/// Which buttons are still held, as reported with move/release events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub primary: bool,
    pub secondary: bool,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The kind of edit operation a mode selection starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    AddWaypoints,
    MoveWaypoints,
    DeleteWaypoints,
    AddSafetyZone,
    AddPatrol,
    AddObservations,
    MoveObservations,
    DeleteObservations,
}

/// An edit operation with its mode-specific context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Each press drops a new waypoint in the group.
    AddWaypoints { group: String },
    /// Press grabs the nearest waypoint; dragging rewrites it live.
    MoveWaypoints { group: String, grabbed: Option<String> },
    /// Each press deletes the nearest waypoint, cascading to its patrols.
    DeleteWaypoints { group: String },
    /// Each press appends a vertex to the agent's zone polygon.
    AddSafetyZone { agent: String },
    /// First press opens a fresh route; each press appends the nearest
    /// waypoint to it.
    AddPatrol { group: String, patrol: Option<String> },
    /// Each press drops a new observation point.
    AddObservations,
    /// Press grabs the nearest observation point; dragging rewrites it live.
    MoveObservations { grabbed: Option<String> },
    /// Each press deletes the nearest observation point.
    DeleteObservations,
}

impl EditOp {
    /// Build the initial (nothing grabbed, no route open) operation for a
    /// mode. `target` names the waypoint group or agent; the observation
    /// modes ignore it.
    #[must_use]
    pub fn new(mode: EditMode, target: &str) -> Self {
        let target = target.to_string();
        match mode {
            EditMode::AddWaypoints => Self::AddWaypoints { group: target },
            EditMode::MoveWaypoints => Self::MoveWaypoints { group: target, grabbed: None },
            EditMode::DeleteWaypoints => Self::DeleteWaypoints { group: target },
            EditMode::AddSafetyZone => Self::AddSafetyZone { agent: target },
            EditMode::AddPatrol => Self::AddPatrol { group: target, patrol: None },
            EditMode::AddObservations => Self::AddObservations,
            EditMode::MoveObservations => Self::MoveObservations { grabbed: None },
            EditMode::DeleteObservations => Self::DeleteObservations,
        }
    }

    #[must_use]
    pub fn mode(&self) -> EditMode {
        match self {
            Self::AddWaypoints { .. } => EditMode::AddWaypoints,
            Self::MoveWaypoints { .. } => EditMode::MoveWaypoints,
            Self::DeleteWaypoints { .. } => EditMode::DeleteWaypoints,
            Self::AddSafetyZone { .. } => EditMode::AddSafetyZone,
            Self::AddPatrol { .. } => EditMode::AddPatrol,
            Self::AddObservations => EditMode::AddObservations,
            Self::MoveObservations { .. } => EditMode::MoveObservations,
            Self::DeleteObservations => EditMode::DeleteObservations,
        }
    }

    /// The group or agent the operation targets, where one applies.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::AddWaypoints { group }
            | Self::MoveWaypoints { group, .. }
            | Self::DeleteWaypoints { group }
            | Self::AddPatrol { group, .. } => Some(group),
            Self::AddSafetyZone { agent } => Some(agent),
            Self::AddObservations | Self::MoveObservations { .. } | Self::DeleteObservations => None,
        }
    }
}

/// State of the editing protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// No operation selected; secondary-drag pans the map.
    #[default]
    Idle,
    /// Operation selected, waiting for the first primary press.
    Armed(EditOp),
    /// Operation running; primary presses perform its core action.
    Active(EditOp),
}

impl EditState {
    /// The running or pending operation, if any.
    #[must_use]
    pub fn op(&self) -> Option<&EditOp> {
        match self {
            Self::Idle => None,
            Self::Armed(op) | Self::Active(op) => Some(op),
        }
    }
}
