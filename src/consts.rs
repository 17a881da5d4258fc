//! Shared numeric constants and editing vocabulary for the planboard crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Minimum zoom factor; at this level the whole map fits the viewport.
pub const ZOOM_MIN: f64 = 1.0;

/// Maximum user zoom factor.
pub const ZOOM_MAX: f64 = 10.0;

/// Zoom change per wheel notch.
pub const ZOOM_STEP: f64 = 0.5;

// ── Map geometry ────────────────────────────────────────────────

/// A map span (width or height) below this many meters is degenerate.
pub const MIN_MAP_SPAN_M: f64 = 1.0;

// ── Defaults ────────────────────────────────────────────────────

/// Fallback color for agents and waypoint groups missing one in the document.
pub const DEFAULT_AGENT_COLOR: &str = "green";

/// Fallback color for targets missing one in the document.
pub const DEFAULT_TARGET_COLOR: &str = "red";

/// Fallback marker glyph.
pub const DEFAULT_MARKER: char = 'X';

// ── Path expansion ──────────────────────────────────────────────

/// Placeholder token expanded to the installation root in path fields.
pub const INSTALL_ROOT_TOKEN: &str = "$PLANBOARD_HOME";

/// Environment variable the installation-root token expands to.
pub const INSTALL_ROOT_VAR: &str = "PLANBOARD_HOME";

// ── Editing vocabulary ──────────────────────────────────────────

/// Color names a mission document may reference, in menu order.
pub const COLOR_NAMES: &[&str] = &[
    "green",
    "blue",
    "magenta",
    "cyan",
    "yellow",
    "gray",
    "black",
    "darkRed",
    "darkGreen",
    "darkBlue",
    "darkMagenta",
    "darkCyan",
    "darkYellow",
    "darkGray",
    "lightGray",
];

/// Marker glyphs offered for waypoint groups.
pub const MARKER_GLYPHS: &[char] = &['X', '+', 'O', '*'];
