use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `campus.{domain}.{entity}.{action}`
/// Example: `campus.matching.match.created`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    pub const MATCHING_LIKE_SENT: &str = "campus.matching.like.sent";
    pub const MATCHING_MATCH_CREATED: &str = "campus.matching.match.created";
    pub const MATCHING_MATCH_REMOVED: &str = "campus.matching.match.removed";
    pub const MATCHING_REQUEST_JOINED: &str = "campus.matching.request.joined";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LikeSent {
        pub from_user: Uuid,
        pub to_user: Uuid,
        pub kind: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchCreated {
        pub match_id: Uuid,
        pub chat_id: Uuid,
        pub user_low: Uuid,
        pub user_high: Uuid,
        pub compatibility_score: i32,
        pub is_dating_match: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchRemoved {
        pub match_id: Uuid,
        pub removed_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestJoined {
        pub request_id: Uuid,
        pub owner_id: Uuid,
        pub member_id: Uuid,
        pub match_id: Option<Uuid>,
    }
}
