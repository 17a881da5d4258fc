#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

fn mission_with_group(name: &str) -> Mission {
    let mut m = Mission::new();
    m.add_waypoint_group(name, "blue", '+').unwrap();
    m
}

// =============================================================
// Waypoint groups
// =============================================================

#[test]
fn add_waypoint_group_inserts_empty_group() {
    let m = mission_with_group("g1");
    let g = &m.wp_groups["g1"];
    assert_eq!(g.color, "blue");
    assert_eq!(g.marker, '+');
    assert!(g.waypoints.is_empty());
    assert!(g.patrols.is_empty());
    assert_eq!(g.next_waypoint.peek(), 1);
    assert_eq!(g.next_patrol.peek(), 1);
}

#[test]
fn add_waypoint_group_rejects_duplicate_name() {
    let mut m = mission_with_group("g1");
    let err = m.add_waypoint_group("g1", "red", 'X').unwrap_err();
    assert_eq!(err, ModelError::DuplicateName("g1".to_string()));
}

#[test]
fn add_waypoint_group_rejects_empty_name() {
    let mut m = Mission::new();
    assert_eq!(m.add_waypoint_group("", "red", 'X').unwrap_err(), ModelError::EmptyName);
}

// =============================================================
// Waypoints
// =============================================================

#[test]
fn add_waypoint_allocates_sequential_ids() {
    let mut m = mission_with_group("g1");
    assert_eq!(m.add_waypoint("g1", pt(1.0, 1.0)).unwrap(), "1");
    assert_eq!(m.add_waypoint("g1", pt(2.0, 2.0)).unwrap(), "2");
    assert_eq!(m.wp_groups["g1"].next_waypoint.peek(), 3);
}

#[test]
fn add_waypoint_unknown_group_fails() {
    let mut m = Mission::new();
    let err = m.add_waypoint("nope", pt(0.0, 0.0)).unwrap_err();
    assert_eq!(err, ModelError::GroupNotFound("nope".to_string()));
}

#[test]
fn waypoint_ids_are_never_reused() {
    let mut m = mission_with_group("g1");
    m.add_waypoint("g1", pt(1.0, 1.0)).unwrap();
    m.add_waypoint("g1", pt(2.0, 2.0)).unwrap();
    m.delete_waypoint("g1", "2").unwrap();
    assert_eq!(m.add_waypoint("g1", pt(3.0, 3.0)).unwrap(), "3");
}

#[test]
fn move_waypoint_rewrites_xy_only() {
    let mut m = mission_with_group("g1");
    m.add_waypoint("g1", Point3::new(1.0, 2.0, 7.5)).unwrap();
    m.move_waypoint("g1", "1", 10.0, 20.0).unwrap();
    let p = m.wp_groups["g1"].waypoints["1"];
    assert_eq!((p.x, p.y, p.z), (10.0, 20.0, 7.5));
}

#[test]
fn move_waypoint_unknown_id_fails() {
    let mut m = mission_with_group("g1");
    let err = m.move_waypoint("g1", "9", 0.0, 0.0).unwrap_err();
    assert_eq!(
        err,
        ModelError::WaypointNotFound { group: "g1".to_string(), id: "9".to_string() }
    );
}

// =============================================================
// Cascade delete
// =============================================================

#[test]
fn delete_waypoint_cascades_to_referencing_patrols() {
    let mut m = mission_with_group("g1");
    for _ in 0..5 {
        m.add_waypoint("g1", pt(0.0, 0.0)).unwrap();
    }
    m.add_patrol_point("g1", "1", "1").unwrap();
    m.add_patrol_point("g1", "1", "3").unwrap();
    m.add_patrol_point("g1", "1", "5").unwrap();
    m.add_patrol_point("g1", "2", "5").unwrap();

    let removed = m.delete_waypoint("g1", "3").unwrap();
    assert_eq!(removed, vec!["1".to_string()]);
    let g = &m.wp_groups["g1"];
    assert!(!g.waypoints.contains_key("3"));
    assert!(!g.patrols.contains_key("1"));
    assert_eq!(g.patrols["2"], vec!["5".to_string()]);
}

#[test]
fn delete_waypoint_without_references_removes_no_patrols() {
    let mut m = mission_with_group("g1");
    m.add_waypoint("g1", pt(0.0, 0.0)).unwrap();
    m.add_waypoint("g1", pt(1.0, 0.0)).unwrap();
    m.add_patrol_point("g1", "1", "2").unwrap();

    let removed = m.delete_waypoint("g1", "1").unwrap();
    assert!(removed.is_empty());
    assert!(m.wp_groups["g1"].patrols.contains_key("1"));
}

#[test]
fn delete_waypoint_unknown_id_fails() {
    let mut m = mission_with_group("g1");
    let err = m.delete_waypoint("g1", "1").unwrap_err();
    assert_eq!(
        err,
        ModelError::WaypointNotFound { group: "g1".to_string(), id: "1".to_string() }
    );
}

// =============================================================
// Patrols
// =============================================================

#[test]
fn open_patrol_allocates_without_creating_route() {
    let mut m = mission_with_group("g1");
    assert_eq!(m.open_patrol("g1").unwrap(), "1");
    assert_eq!(m.open_patrol("g1").unwrap(), "2");
    assert!(m.wp_groups["g1"].patrols.is_empty());
}

#[test]
fn add_patrol_point_accepts_unknown_waypoints() {
    // Lenient on purpose: the document format tolerates dangling references
    // and duplicate consecutive points.
    let mut m = mission_with_group("g1");
    m.add_patrol_point("g1", "1", "42").unwrap();
    m.add_patrol_point("g1", "1", "42").unwrap();
    assert_eq!(m.wp_groups["g1"].patrols["1"], vec!["42".to_string(), "42".to_string()]);
}

#[test]
fn add_patrol_point_unknown_group_fails() {
    let mut m = Mission::new();
    let err = m.add_patrol_point("nope", "1", "1").unwrap_err();
    assert_eq!(err, ModelError::GroupNotFound("nope".to_string()));
}

// =============================================================
// Observation points
// =============================================================

#[test]
fn observation_ids_advance_and_never_reuse() {
    let mut m = Mission::new();
    assert_eq!(m.add_observation(pt(1.0, 1.0)).unwrap(), "1");
    assert_eq!(m.add_observation(pt(2.0, 2.0)).unwrap(), "2");
    m.delete_observation("1").unwrap();
    assert_eq!(m.add_observation(pt(3.0, 3.0)).unwrap(), "3");
}

#[test]
fn add_observation_reports_collision_and_stays_usable() {
    let mut m = Mission::new();
    // Corrupt state on purpose: an id the fresh counter will allocate.
    m.goal.observation_points.insert("1".to_string(), pt(0.0, 0.0));
    let err = m.add_observation(pt(5.0, 5.0)).unwrap_err();
    assert_eq!(err, ModelError::IdCollision("1".to_string()));
    // The counter advanced past the collision, so the next call succeeds.
    assert_eq!(m.add_observation(pt(5.0, 5.0)).unwrap(), "2");
}

#[test]
fn move_observation_unknown_id_fails() {
    let mut m = Mission::new();
    let err = m.move_observation("7", 0.0, 0.0).unwrap_err();
    assert_eq!(err, ModelError::ObservationNotFound("7".to_string()));
}

#[test]
fn delete_observation_unknown_id_fails() {
    let mut m = Mission::new();
    let err = m.delete_observation("7").unwrap_err();
    assert_eq!(err, ModelError::ObservationNotFound("7".to_string()));
}

// =============================================================
// Agents and safety zones
// =============================================================

#[test]
fn add_agent_rejects_duplicates() {
    let mut m = Mission::new();
    m.add_agent("a1", Agent::default()).unwrap();
    let err = m.add_agent("a1", Agent::default()).unwrap_err();
    assert_eq!(err, ModelError::DuplicateName("a1".to_string()));
}

#[test]
fn safety_zone_appends_and_clears() {
    let mut m = Mission::new();
    m.add_agent("a1", Agent::default()).unwrap();
    m.add_safety_zone_point("a1", pt(0.0, 0.0)).unwrap();
    m.add_safety_zone_point("a1", pt(5.0, 0.0)).unwrap();
    assert_eq!(m.agents["a1"].safety_zone.len(), 2);
    m.clear_safety_zone("a1").unwrap();
    assert!(m.agents["a1"].safety_zone.is_empty());
}

#[test]
fn safety_zone_unknown_agent_fails() {
    let mut m = Mission::new();
    let err = m.add_safety_zone_point("ghost", pt(0.0, 0.0)).unwrap_err();
    assert_eq!(err, ModelError::AgentNotFound("ghost".to_string()));
}

// =============================================================
// Targets, models, communication goals
// =============================================================

#[test]
fn add_target_and_model_reject_duplicates() {
    let mut m = Mission::new();
    m.add_target("t1", "cyan").unwrap();
    assert!(m.add_target("t1", "red").is_err());
    m.add_agent_model("quad", AgentModel::default()).unwrap();
    assert!(m.add_agent_model("quad", AgentModel::default()).is_err());
}

#[test]
fn comm_goals_insert_and_delete() {
    let mut m = Mission::new();
    let goal = CommGoal {
        agent1: "a1".to_string(),
        agent2: "a2".to_string(),
        date: 12.5,
        ..CommGoal::default()
    };
    m.add_comm_goal("c1", goal).unwrap();
    assert!(m.goal.communication_goals.contains_key("c1"));
    m.delete_comm_goal("c1").unwrap();
    assert_eq!(
        m.delete_comm_goal("c1").unwrap_err(),
        ModelError::CommGoalNotFound("c1".to_string())
    );
}

// =============================================================
// Reset
// =============================================================

#[test]
fn reset_clears_everything_including_counters() {
    let mut m = mission_with_group("g1");
    m.add_waypoint("g1", pt(1.0, 1.0)).unwrap();
    m.add_observation(pt(2.0, 2.0)).unwrap();
    m.max_time = 99.0;
    m.reset();
    assert!(m.wp_groups.is_empty());
    assert!(m.goal.observation_points.is_empty());
    assert_eq!(m.max_time, 0.0);
    assert_eq!(m.next_observation.peek(), 1);
}

// =============================================================
// Map bounds
// =============================================================

#[test]
fn degenerate_bounds_detection() {
    let flat = MapBounds { x_min: 0.0, x_max: 100.0, y_min: 5.0, y_max: 5.5 };
    assert!(flat.is_degenerate());
    let fine = MapBounds { x_min: -50.0, x_max: 50.0, y_min: 0.0, y_max: 10.0 };
    assert!(!fine.is_degenerate());
}

#[test]
fn recompute_map_bounds_spans_all_groups() {
    let mut m = mission_with_group("g1");
    m.add_waypoint_group("g2", "red", 'X').unwrap();
    m.add_waypoint("g1", pt(-10.0, 5.0)).unwrap();
    m.add_waypoint("g1", pt(30.0, -2.0)).unwrap();
    m.add_waypoint("g2", pt(0.0, 40.0)).unwrap();
    assert!(m.recompute_map_bounds());
    let b = m.map_data.map_size;
    assert_eq!((b.x_min, b.x_max, b.y_min, b.y_max), (-10.0, 30.0, -2.0, 40.0));
}

#[test]
fn recompute_map_bounds_without_waypoints_reports_failure() {
    let mut m = Mission::new();
    m.map_data.map_size = MapBounds { x_min: 0.0, x_max: 0.0, y_min: 0.0, y_max: 0.0 };
    assert!(!m.recompute_map_bounds());
    assert_eq!(m.map_data.map_size.width(), 0.0);
}

// =============================================================
// Path expansion
// =============================================================

#[test]
fn install_root_token_expands_from_environment() {
    // SAFETY: single-threaded access to a variable only this test reads.
    unsafe { std::env::set_var(INSTALL_ROOT_VAR, "/opt/planboard") };
    let mut m = Mission::new();
    m.home_dir = format!("{INSTALL_ROOT_TOKEN}/missions");
    assert_eq!(m.home_dir(), PathBuf::from("/opt/planboard/missions"));
    assert_eq!(m.resolve("maps/site.png"), PathBuf::from("/opt/planboard/missions/maps/site.png"));
}

#[test]
fn paths_without_token_pass_through() {
    assert_eq!(expand_install_root("/plain/path"), "/plain/path");
}
