use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Closed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("unknown request status: {s}")),
        }
    }
}

/// A user-posted listing ("looking for a hackathon team") that others join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRequest {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub related_interests: Vec<String>,
    pub status: RequestStatus,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl MatchRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }
}

#[derive(Debug, Clone)]
pub struct NewMatchRequest {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub related_interests: Vec<String>,
    pub max_participants: Option<i32>,
}

/// An owner's edit to their request. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub related_interests: Option<Vec<String>>,
    pub status: Option<RequestStatus>,
    pub max_participants: Option<i32>,
}

impl RequestUpdate {
    pub fn apply(self, mut request: MatchRequest) -> MatchRequest {
        if let Some(title) = self.title {
            request.title = title;
        }
        if self.description.is_some() {
            request.description = self.description;
        }
        if let Some(category) = self.category {
            request.category = category;
        }
        if let Some(related) = self.related_interests {
            request.related_interests = related;
        }
        if let Some(status) = self.status {
            request.status = status;
        }
        if self.max_participants.is_some() {
            request.max_participants = self.max_participants;
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMember {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedRequest {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub relevance: usize,
    pub member_count: usize,
    pub has_joined: bool,
}

impl RankedRequest {
    pub fn with_members(mut self, members: &[Uuid], viewer: Uuid) -> Self {
        self.member_count = members.len();
        self.has_joined = members.contains(&viewer);
        self
    }
}

/// One of the caller's own requests with its current head count.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedRequest {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub member_count: usize,
}

/// Count of the request's interests the viewer lists as an interest or hobby.
pub fn relevance(viewer: &Profile, request: &MatchRequest) -> usize {
    let viewer_items: HashSet<&str> = viewer
        .interests
        .iter()
        .chain(viewer.hobbies.iter())
        .map(String::as_str)
        .collect();
    request
        .related_interests
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&viewer_items)
        .count()
}

/// Open requests ranked by relevance to `viewer`, most relevant first.
/// Requests from blocked owners are dropped; ties keep input order.
pub fn rank_open_requests(
    viewer: &Profile,
    requests: Vec<MatchRequest>,
    blocked: &HashSet<Uuid>,
) -> Vec<RankedRequest> {
    let mut ranked: Vec<RankedRequest> = requests
        .into_iter()
        .filter(|r| r.is_open() && !blocked.contains(&r.owner_id))
        .map(|request| RankedRequest {
            relevance: relevance(viewer, &request),
            request,
            member_count: 0,
            has_joined: false,
        })
        .collect();
    ranked.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    ranked
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn open_request(owner_id: Uuid, related: &[&str]) -> MatchRequest {
        MatchRequest {
            id: Uuid::new_v4(),
            owner_id,
            title: "Looking for a hackathon team".into(),
            description: None,
            category: "project".into(),
            related_interests: related.iter().map(|s| s.to_string()).collect(),
            status: RequestStatus::Open,
            max_participants: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::open_request;
    use super::*;
    use crate::matching::profile::fixtures::{profile, strings};

    #[test]
    fn relevance_counts_interests_and_hobbies() {
        let viewer = Profile {
            interests: strings(&["AI/ML"]),
            hobbies: strings(&["Gaming"]),
            ..profile(Uuid::new_v4())
        };
        let request = open_request(Uuid::new_v4(), &["AI/ML", "Gaming", "Robotics"]);
        assert_eq!(relevance(&viewer, &request), 2);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let viewer = Profile {
            interests: strings(&["AI/ML", "Research"]),
            ..profile(Uuid::new_v4())
        };
        let none_a = open_request(Uuid::new_v4(), &["Art"]);
        let both = open_request(Uuid::new_v4(), &["Research", "AI/ML"]);
        let none_b = open_request(Uuid::new_v4(), &[]);
        let one = open_request(Uuid::new_v4(), &["AI/ML"]);

        let ranked = rank_open_requests(
            &viewer,
            vec![none_a.clone(), both.clone(), none_b.clone(), one.clone()],
            &HashSet::new(),
        );
        let order: Vec<Uuid> = ranked.iter().map(|r| r.request.id).collect();
        assert_eq!(order, vec![both.id, one.id, none_a.id, none_b.id]);
    }

    #[test]
    fn blocked_owners_and_closed_requests_hidden() {
        let viewer = profile(Uuid::new_v4());
        let blocked_owner = Uuid::new_v4();
        let hidden = open_request(blocked_owner, &[]);
        let closed = MatchRequest {
            status: RequestStatus::Closed,
            ..open_request(Uuid::new_v4(), &[])
        };
        let visible = open_request(Uuid::new_v4(), &[]);

        let ranked = rank_open_requests(
            &viewer,
            vec![hidden, closed, visible.clone()],
            &HashSet::from([blocked_owner]),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].request.id, visible.id);
    }

    #[test]
    fn membership_summary() {
        let viewer = profile(Uuid::new_v4());
        let ranked = rank_open_requests(
            &viewer,
            vec![open_request(Uuid::new_v4(), &[])],
            &HashSet::new(),
        );
        let other = Uuid::new_v4();
        let summary = ranked[0].clone().with_members(&[other, viewer.id], viewer.id);
        assert_eq!(summary.member_count, 2);
        assert!(summary.has_joined);
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!("closed".parse::<RequestStatus>(), Ok(RequestStatus::Closed));
        assert_eq!(RequestStatus::Open.as_str(), "open");
    }

    #[test]
    fn update_can_close_a_request() {
        let request = open_request(Uuid::new_v4(), &["AI/ML"]);
        let closed = RequestUpdate {
            status: Some(RequestStatus::Closed),
            max_participants: Some(4),
            ..Default::default()
        }
        .apply(request.clone());

        assert!(!closed.is_open());
        assert_eq!(closed.max_participants, Some(4));
        assert_eq!(closed.title, request.title);
        assert_eq!(closed.related_interests, request.related_interests);
    }
}
