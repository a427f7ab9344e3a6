use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::compatibility::{calculate_compatibility, shared_interests, shared_interests_and_hobbies};
use super::profile::Profile;

pub const DEFAULT_LIMIT: usize = 20;

/// Ids a viewer must never see in discovery.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    ids: HashSet<Uuid>,
}

impl ExclusionSet {
    /// Self, blocked in either direction, already matched, already liked.
    pub fn build(
        viewer_id: Uuid,
        blocked: impl IntoIterator<Item = Uuid>,
        matched: impl IntoIterator<Item = Uuid>,
        liked: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        let mut ids: HashSet<Uuid> = HashSet::from([viewer_id]);
        ids.extend(blocked);
        ids.extend(matched);
        ids.extend(liked);
        Self { ids }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.ids.iter()
    }
}

/// Narrowing filters for the general feed. Empty lists and `None` mean
/// "no constraint".
#[derive(Debug, Clone, Default)]
pub struct DiscoverFilters {
    pub branch: Option<String>,
    pub year: Option<i32>,
    pub dating_only: bool,
    pub interests: Vec<String>,
    pub hobbies: Vec<String>,
    pub goals: Vec<String>,
    pub social_range: Option<(i32, i32)>,
    pub activity_range: Option<(i32, i32)>,
}

impl DiscoverFilters {
    fn admits(&self, viewer: &Profile, candidate: &Profile) -> bool {
        if let Some(branch) = &self.branch {
            if candidate.branch.as_ref() != Some(branch) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if candidate.year != Some(year) {
                return false;
            }
        }
        // the dating flag only narrows for viewers who are dating themselves
        if self.dating_only && viewer.dating_enabled && !candidate.dating_enabled {
            return false;
        }
        if !overlaps(&self.interests, &candidate.interests)
            || !overlaps(&self.hobbies, &candidate.hobbies)
            || !overlaps(&self.goals, &candidate.goals)
        {
            return false;
        }
        if let Some((min, max)) = self.social_range {
            if !(min..=max).contains(&candidate.personality_social_level) {
                return false;
            }
        }
        if let Some((min, max)) = self.activity_range {
            if !(min..=max).contains(&candidate.personality_activity_level) {
                return false;
            }
        }
        true
    }
}

fn overlaps(wanted: &[String], have: &[String]) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| have.contains(w))
}

#[derive(Debug, Clone)]
pub enum DiscoveryMode {
    General(DiscoverFilters),
    DatingOnly,
}

impl DiscoveryMode {
    /// Whether only dating-enabled candidates qualify for `viewer`.
    pub fn dating_only(&self, viewer: &Profile) -> bool {
        match self {
            Self::General(filters) => filters.dating_only && viewer.dating_enabled,
            Self::DatingOnly => true,
        }
    }

    fn admits(&self, viewer: &Profile, candidate: &Profile) -> bool {
        match self {
            Self::General(filters) => filters.admits(viewer, candidate),
            Self::DatingOnly => candidate.dating_enabled && mutual_preference(viewer, candidate),
        }
    }
}

/// Candidate selection pushed down to the store so that the row limit
/// applies after exclusions and filters, never before.
#[derive(Debug, Clone)]
pub struct PoolQuery {
    pub viewer: Profile,
    pub mode: DiscoveryMode,
    pub exclude: Vec<Uuid>,
    pub limit: usize,
}

impl PoolQuery {
    pub fn new(viewer: Profile, exclusions: &ExclusionSet, mode: DiscoveryMode, limit: usize) -> Self {
        let mut exclude: Vec<Uuid> = exclusions.iter().copied().collect();
        exclude.sort();
        Self {
            viewer,
            mode,
            exclude,
            limit,
        }
    }

    pub fn dating_only(&self) -> bool {
        self.mode.dating_only(&self.viewer)
    }

    /// The full predicate a store must apply to each onboarded profile.
    pub fn admits(&self, candidate: &Profile) -> bool {
        candidate.onboarding_completed
            && candidate.id != self.viewer.id
            && self.exclude.binary_search(&candidate.id).is_err()
            && self.mode.admits(&self.viewer, candidate)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub profile: Profile,
    pub compatibility: i32,
    pub shared_interests: Vec<String>,
}

/// Both sides' dating preferences accept the other's gender.
pub fn mutual_preference(viewer: &Profile, candidate: &Profile) -> bool {
    viewer.preference().accepts(candidate.gender()) && candidate.preference().accepts(viewer.gender())
}

/// Filters, scores and ranks `pool` for `viewer`.
///
/// Output is sorted by compatibility descending; ties keep pool order.
pub fn discover(
    viewer: &Profile,
    pool: &[Profile],
    exclusions: &ExclusionSet,
    mode: &DiscoveryMode,
    limit: usize,
) -> Vec<Candidate> {
    if matches!(mode, DiscoveryMode::DatingOnly) && !viewer.dating_enabled {
        return Vec::new();
    }

    let mut ranked: Vec<Candidate> = pool
        .iter()
        .filter(|c| c.id != viewer.id && !exclusions.contains(&c.id))
        .filter(|c| mode.admits(viewer, c))
        .map(|c| Candidate {
            profile: c.clone(),
            compatibility: calculate_compatibility(viewer, c),
            shared_interests: match mode {
                DiscoveryMode::General(_) => shared_interests(viewer, c),
                DiscoveryMode::DatingOnly => shared_interests_and_hobbies(viewer, c),
            },
        })
        .collect();

    // stable: equal scores keep their pool order
    ranked.sort_by(|a, b| b.compatibility.cmp(&a.compatibility));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::fixtures::{dater, profile, strings};
    use crate::matching::profile::DatingPreference;

    fn ids(result: &[Candidate]) -> Vec<Uuid> {
        result.iter().map(|c| c.profile.id).collect()
    }

    fn general() -> DiscoveryMode {
        DiscoveryMode::General(DiscoverFilters::default())
    }

    #[test]
    fn never_returns_excluded_or_self() {
        let viewer = profile(Uuid::new_v4());
        let blocked = profile(Uuid::new_v4());
        let matched = profile(Uuid::new_v4());
        let liked = profile(Uuid::new_v4());
        let fresh = profile(Uuid::new_v4());
        let pool = vec![
            viewer.clone(),
            blocked.clone(),
            matched.clone(),
            liked.clone(),
            fresh.clone(),
        ];
        let exclusions = ExclusionSet::build(viewer.id, [blocked.id], [matched.id], [liked.id]);

        let result = discover(&viewer, &pool, &exclusions, &general(), DEFAULT_LIMIT);
        assert_eq!(ids(&result), vec![fresh.id]);
    }

    #[test]
    fn viewer_excluded_even_without_exclusions() {
        let viewer = profile(Uuid::new_v4());
        let result = discover(
            &viewer,
            &[viewer.clone()],
            &ExclusionSet::default(),
            &general(),
            DEFAULT_LIMIT,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn sorted_by_score_with_stable_ties() {
        let viewer = Profile {
            interests: strings(&["AI/ML", "Research"]),
            ..profile(Uuid::new_v4())
        };
        let tie_first = profile(Uuid::new_v4());
        let best = Profile {
            interests: strings(&["AI/ML", "Research"]),
            ..profile(Uuid::new_v4())
        };
        let tie_second = profile(Uuid::new_v4());
        let pool = vec![tie_first.clone(), best.clone(), tie_second.clone()];

        let result = discover(&viewer, &pool, &ExclusionSet::default(), &general(), 10);
        assert_eq!(ids(&result), vec![best.id, tie_first.id, tie_second.id]);
        assert_eq!(result[0].shared_interests, strings(&["AI/ML", "Research"]));
    }

    #[test]
    fn truncates_to_limit() {
        let viewer = profile(Uuid::new_v4());
        let pool: Vec<Profile> = (0..30).map(|_| profile(Uuid::new_v4())).collect();
        let result = discover(&viewer, &pool, &ExclusionSet::default(), &general(), DEFAULT_LIMIT);
        assert_eq!(result.len(), DEFAULT_LIMIT);
    }

    #[test]
    fn empty_pool_is_not_an_error() {
        let viewer = profile(Uuid::new_v4());
        assert!(discover(&viewer, &[], &ExclusionSet::default(), &general(), 5).is_empty());
    }

    #[test]
    fn general_filters_narrow_pool() {
        let viewer = profile(Uuid::new_v4());
        let cs_gamer = Profile {
            branch: Some("Computer Science".into()),
            year: Some(2),
            hobbies: strings(&["Gaming"]),
            ..profile(Uuid::new_v4())
        };
        let cs_runner = Profile {
            branch: Some("Computer Science".into()),
            year: Some(2),
            hobbies: strings(&["Running"]),
            ..profile(Uuid::new_v4())
        };
        let civil_gamer = Profile {
            branch: Some("Civil".into()),
            hobbies: strings(&["Gaming"]),
            ..profile(Uuid::new_v4())
        };
        let filters = DiscoverFilters {
            branch: Some("Computer Science".into()),
            year: Some(2),
            hobbies: strings(&["Gaming", "Anime"]),
            ..Default::default()
        };
        let pool = vec![cs_gamer.clone(), cs_runner, civil_gamer];

        let result = discover(
            &viewer,
            &pool,
            &ExclusionSet::default(),
            &DiscoveryMode::General(filters),
            DEFAULT_LIMIT,
        );
        assert_eq!(ids(&result), vec![cs_gamer.id]);
    }

    #[test]
    fn personality_ranges_are_inclusive() {
        let viewer = profile(Uuid::new_v4());
        let low = Profile { personality_social_level: 2, ..profile(Uuid::new_v4()) };
        let edge = Profile { personality_social_level: 6, ..profile(Uuid::new_v4()) };
        let high = Profile { personality_social_level: 9, ..profile(Uuid::new_v4()) };
        let filters = DiscoverFilters {
            social_range: Some((3, 6)),
            ..Default::default()
        };

        let result = discover(
            &viewer,
            &[low, edge.clone(), high],
            &ExclusionSet::default(),
            &DiscoveryMode::General(filters),
            DEFAULT_LIMIT,
        );
        assert_eq!(ids(&result), vec![edge.id]);
    }

    #[test]
    fn dating_only_flag_ignored_for_non_dating_viewer() {
        let viewer = profile(Uuid::new_v4());
        let candidate = profile(Uuid::new_v4());
        let filters = DiscoverFilters { dating_only: true, ..Default::default() };

        let result = discover(
            &viewer,
            &[candidate.clone()],
            &ExclusionSet::default(),
            &DiscoveryMode::General(filters.clone()),
            DEFAULT_LIMIT,
        );
        assert_eq!(ids(&result), vec![candidate.id]);

        let dating_viewer = Profile { dating_enabled: true, ..viewer };
        let result = discover(
            &dating_viewer,
            &[candidate],
            &ExclusionSet::default(),
            &DiscoveryMode::General(filters),
            DEFAULT_LIMIT,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn strict_mutual_preference() {
        let viewer = dater(Uuid::new_v4(), "female", "male");
        let wants_women = dater(Uuid::new_v4(), "male", "female");
        let wants_men = dater(Uuid::new_v4(), "male", "male");
        let pool = vec![wants_women.clone(), wants_men];

        let result = discover(
            &viewer,
            &pool,
            &ExclusionSet::default(),
            &DiscoveryMode::DatingOnly,
            DEFAULT_LIMIT,
        );
        assert_eq!(ids(&result), vec![wants_women.id]);
    }

    #[test]
    fn open_candidate_still_needs_viewer_acceptance() {
        let viewer = dater(Uuid::new_v4(), "male", "female");
        let open_man = dater(Uuid::new_v4(), "male", "everyone");
        assert!(!mutual_preference(&viewer, &open_man));
    }

    #[test]
    fn open_viewer_still_needs_candidate_acceptance() {
        let viewer = dater(Uuid::new_v4(), "male", "everyone");
        let wants_women = dater(Uuid::new_v4(), "female", "female");
        let wants_men = dater(Uuid::new_v4(), "female", "male");
        assert!(!mutual_preference(&viewer, &wants_women));
        assert!(mutual_preference(&viewer, &wants_men));
    }

    #[test]
    fn unknown_gender_fails_specific_preference() {
        let viewer = dater(Uuid::new_v4(), "female", "male");
        let mystery = Profile { gender: None, ..dater(Uuid::new_v4(), "male", "everyone") };
        assert!(!mutual_preference(&viewer, &mystery));

        let genderless_viewer = Profile {
            gender: None,
            dating_preference: Some(DatingPreference::Everyone),
            ..dater(Uuid::new_v4(), "female", "everyone")
        };
        let picky = dater(Uuid::new_v4(), "male", "female");
        assert!(!mutual_preference(&genderless_viewer, &picky));

        let open = dater(Uuid::new_v4(), "male", "everyone");
        assert!(mutual_preference(&genderless_viewer, &open));
    }

    #[test]
    fn dating_feed_requires_both_opted_in() {
        let viewer = dater(Uuid::new_v4(), "female", "everyone");
        let not_dating = Profile {
            gender: Some("male".into()),
            ..profile(Uuid::new_v4())
        };
        let dating = dater(Uuid::new_v4(), "male", "everyone");
        let pool = vec![not_dating, dating.clone()];

        let result = discover(
            &viewer,
            &pool,
            &ExclusionSet::default(),
            &DiscoveryMode::DatingOnly,
            DEFAULT_LIMIT,
        );
        assert_eq!(ids(&result), vec![dating.id]);

        let off = Profile { dating_enabled: false, ..viewer };
        let result = discover(
            &off,
            &pool,
            &ExclusionSet::default(),
            &DiscoveryMode::DatingOnly,
            DEFAULT_LIMIT,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn dating_feed_shares_across_interests_and_hobbies() {
        let viewer = Profile {
            hobbies: strings(&["Music"]),
            ..dater(Uuid::new_v4(), "female", "everyone")
        };
        let candidate = Profile {
            interests: strings(&["Music"]),
            ..dater(Uuid::new_v4(), "male", "everyone")
        };

        let result = discover(
            &viewer,
            &[candidate],
            &ExclusionSet::default(),
            &DiscoveryMode::DatingOnly,
            DEFAULT_LIMIT,
        );
        assert_eq!(result[0].shared_interests, strings(&["Music"]));
    }

    #[test]
    fn pool_query_carries_exclusions_and_filters() {
        let viewer = profile(Uuid::new_v4());
        let liked = Profile { branch: Some("Civil".into()), ..profile(Uuid::new_v4()) };
        let civil = Profile { branch: Some("Civil".into()), ..profile(Uuid::new_v4()) };
        let other = profile(Uuid::new_v4());
        let pending = Profile {
            onboarding_completed: false,
            ..civil.clone()
        };
        let exclusions = ExclusionSet::build(viewer.id, [], [], [liked.id]);
        let filters = DiscoverFilters { branch: Some("Civil".into()), ..Default::default() };

        let query = PoolQuery::new(viewer.clone(), &exclusions, DiscoveryMode::General(filters), 10);
        assert!(query.admits(&civil));
        assert!(!query.admits(&liked));
        assert!(!query.admits(&other));
        assert!(!query.admits(&pending));
        assert!(!query.admits(&viewer));
        assert!(!query.dating_only());
    }

    #[test]
    fn dating_pool_query_checks_both_preferences() {
        let viewer = dater(Uuid::new_v4(), "female", "male");
        let query = PoolQuery::new(viewer.clone(), &ExclusionSet::default(), DiscoveryMode::DatingOnly, 10);
        assert!(query.dating_only());
        assert!(query.admits(&dater(Uuid::new_v4(), "male", "female")));
        assert!(!query.admits(&dater(Uuid::new_v4(), "female", "everyone")));
        assert!(!query.admits(&dater(Uuid::new_v4(), "male", "male")));
    }
}
