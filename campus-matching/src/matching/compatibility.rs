use std::collections::HashSet;

use serde::Serialize;

use super::profile::{Profile, WakeCycle, LEVEL_MAX, LEVEL_MIN};

// -- Weights: sum to exactly 100 --
pub const W_INTERESTS: u32 = 25;
pub const W_HOBBIES: u32 = 20;
pub const W_GOALS: u32 = 20;
pub const W_SOCIAL: u32 = 10;
pub const W_ACTIVITY: u32 = 10;
pub const W_COMMUNICATION: u32 = 8;
pub const W_WAKE_CYCLE: u32 = 7;

pub const TOTAL_WEIGHT: u32 =
    W_INTERESTS + W_HOBBIES + W_GOALS + W_SOCIAL + W_ACTIVITY + W_COMMUNICATION + W_WAKE_CYCLE;

// Partial credit, in points of the factor's weight.
const COMMUNICATION_MISMATCH_POINTS: f64 = 4.0;
const WAKE_FLEXIBLE_POINTS: f64 = 5.0;
const WAKE_MISMATCH_POINTS: f64 = 2.0;

/// Weighted points earned per factor, before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub interests: f64,
    pub hobbies: f64,
    pub goals: f64,
    pub social: f64,
    pub activity: f64,
    pub communication: f64,
    pub wake_cycle: f64,
}

impl ScoreBreakdown {
    pub fn points(&self) -> f64 {
        self.interests
            + self.hobbies
            + self.goals
            + self.social
            + self.activity
            + self.communication
            + self.wake_cycle
    }

    /// Normalised to 0..=100, rounded half away from zero.
    pub fn total(&self) -> i32 {
        let normalised = 100.0 * self.points() / f64::from(TOTAL_WEIGHT);
        (normalised.round() as i32).clamp(0, 100)
    }
}

pub fn score_breakdown(a: &Profile, b: &Profile) -> ScoreBreakdown {
    ScoreBreakdown {
        interests: overlap_ratio(&a.interests, &b.interests) * f64::from(W_INTERESTS),
        hobbies: overlap_ratio(&a.hobbies, &b.hobbies) * f64::from(W_HOBBIES),
        goals: overlap_ratio(&a.goals, &b.goals) * f64::from(W_GOALS),
        social: closeness(a.personality_social_level, b.personality_social_level)
            * f64::from(W_SOCIAL),
        activity: closeness(a.personality_activity_level, b.personality_activity_level)
            * f64::from(W_ACTIVITY),
        communication: if a.personality_communication == b.personality_communication {
            f64::from(W_COMMUNICATION)
        } else {
            COMMUNICATION_MISMATCH_POINTS
        },
        wake_cycle: wake_cycle_points(a.personality_wake_cycle, b.personality_wake_cycle),
    }
}

/// Compatibility of two profiles in `0..=100`. Symmetric in its arguments.
pub fn calculate_compatibility(a: &Profile, b: &Profile) -> i32 {
    score_breakdown(a, b).total()
}

/// `|A ∩ B| / max(|A|, |B|, 1)` over distinct items.
fn overlap_ratio(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let shared = set_a.intersection(&set_b).count();
    let max_len = set_a.len().max(set_b.len()).max(1);
    shared as f64 / max_len as f64
}

fn closeness(a: i32, b: i32) -> f64 {
    let span = f64::from(LEVEL_MAX - LEVEL_MIN);
    let diff = (a.clamp(LEVEL_MIN, LEVEL_MAX) - b.clamp(LEVEL_MIN, LEVEL_MAX)).abs();
    (span - f64::from(diff)) / span
}

fn wake_cycle_points(a: WakeCycle, b: WakeCycle) -> f64 {
    if a == b {
        f64::from(W_WAKE_CYCLE)
    } else if a == WakeCycle::Flexible || b == WakeCycle::Flexible {
        WAKE_FLEXIBLE_POINTS
    } else {
        WAKE_MISMATCH_POINTS
    }
}

/// Items of `a` also present in `b`, in `a`'s order, without repeats.
fn shared_items(a: &[String], b: &[String]) -> Vec<String> {
    let in_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    a.iter()
        .filter(|item| in_b.contains(item.as_str()) && seen.insert(item.as_str()))
        .cloned()
        .collect()
}

pub fn shared_interests(a: &Profile, b: &Profile) -> Vec<String> {
    shared_items(&a.interests, &b.interests)
}

pub fn shared_hobbies(a: &Profile, b: &Profile) -> Vec<String> {
    shared_items(&a.hobbies, &b.hobbies)
}

pub fn shared_goals(a: &Profile, b: &Profile) -> Vec<String> {
    shared_items(&a.goals, &b.goals)
}

/// Viewer's interests and hobbies that appear among the candidate's
/// interests or hobbies. Used by the dating feed.
pub fn shared_interests_and_hobbies(viewer: &Profile, candidate: &Profile) -> Vec<String> {
    let viewer_items: Vec<String> = viewer
        .interests
        .iter()
        .chain(viewer.hobbies.iter())
        .cloned()
        .collect();
    let candidate_items: Vec<String> = candidate
        .interests
        .iter()
        .chain(candidate.hobbies.iter())
        .cloned()
        .collect();
    shared_items(&viewer_items, &candidate_items)
}

/// Both participants opted into dating.
pub fn is_dating_compatible(a: &Profile, b: &Profile) -> bool {
    a.dating_enabled && b.dating_enabled
}
