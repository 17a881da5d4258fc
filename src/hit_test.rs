#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn group_with(points: &[(&str, f64, f64)]) -> WaypointGroup {
    let mut g = WaypointGroup::new("green", 'X');
    for (id, x, y) in points {
        g.waypoints.insert((*id).to_string(), Point3::new(*x, *y, 0.0));
    }
    g
}

// --- Waypoints ---

#[test]
fn nearest_waypoint_empty_group_is_none() {
    let g = group_with(&[]);
    assert_eq!(nearest_waypoint(&g, 0.0, 0.0), None);
}

#[test]
fn nearest_waypoint_picks_closest() {
    let g = group_with(&[("1", 0.0, 0.0), ("2", 10.0, 0.0), ("3", 0.0, 10.0)]);
    assert_eq!(nearest_waypoint(&g, 9.0, 1.0), Some("2"));
}

#[test]
fn nearest_waypoint_has_no_distance_cutoff() {
    let g = group_with(&[("1", 0.0, 0.0)]);
    assert_eq!(nearest_waypoint(&g, 1e6, -1e6), Some("1"));
}

#[test]
fn nearest_waypoint_tie_breaks_by_iteration_order() {
    // Equidistant candidates: the first key in map order wins.
    let g = group_with(&[("1", 0.0, 0.0), ("2", 2.0, 0.0)]);
    assert_eq!(nearest_waypoint(&g, 1.0, 0.0), Some("1"));
}

#[test]
fn nearest_waypoint_tie_break_is_stable() {
    let g = group_with(&[("1", 0.0, 0.0), ("2", 2.0, 0.0)]);
    let first = nearest_waypoint(&g, 1.0, 0.0);
    for _ in 0..10 {
        assert_eq!(nearest_waypoint(&g, 1.0, 0.0), first);
    }
}

// --- Observations ---

#[test]
fn nearest_observation_picks_closest() {
    let mut obs = BTreeMap::new();
    obs.insert("1".to_string(), Point3::new(-5.0, -5.0, 0.0));
    obs.insert("2".to_string(), Point3::new(4.0, 4.0, 0.0));
    assert_eq!(nearest_observation(&obs, 3.0, 3.0), Some("2"));
}

#[test]
fn nearest_observation_empty_is_none() {
    let obs = BTreeMap::new();
    assert_eq!(nearest_observation(&obs, 0.0, 0.0), None);
}
