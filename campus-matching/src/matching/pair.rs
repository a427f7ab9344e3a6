use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unordered pair of users stored as `(low, high)`, so (A,B) and (B,A)
/// resolve to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CanonicalPair {
    low: Uuid,
    high: Uuid,
}

impl CanonicalPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Self { low, high }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user: Uuid) -> bool {
        self.low == user || self.high == user
    }

    /// The other member of the pair, or `None` if `user` is not in it.
    pub fn partner_of(&self, user: Uuid) -> Option<Uuid> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl std::fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Friend,
    Project,
    Study,
    Dating,
}

impl LikeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Project => "project",
            Self::Study => "study",
            Self::Dating => "dating",
        }
    }

    pub fn is_dating(&self) -> bool {
        matches!(self, Self::Dating)
    }
}

impl std::str::FromStr for LikeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friend" => Ok(Self::Friend),
            "project" => Ok(Self::Project),
            "study" => Ok(Self::Study),
            "dating" => Ok(Self::Dating),
            _ => Err(format!("unknown like kind: {s}")),
        }
    }
}

/// Directed like. At most one exists per ordered `(from_user, to_user)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeEvent {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: LikeKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLike {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: LikeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub compatibility_score: i32,
    pub is_dating_match: bool,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn pair(&self) -> CanonicalPair {
        CanonicalPair::new(self.user_low, self.user_high)
    }
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub pair: CanonicalPair,
    pub compatibility_score: i32,
    pub is_dating_match: bool,
}

/// Chat channel opened 1:1 with a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chat {
    pub id: Uuid,
    pub match_id: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ab = CanonicalPair::new(a, b);
        let ba = CanonicalPair::new(b, a);

        assert_eq!(ab, ba);
        assert!(ab.low() < ab.high());
        assert_eq!(ab.low(), a.min(b));
    }

    #[test]
    fn partner_lookup() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pair = CanonicalPair::new(a, b);

        assert_eq!(pair.partner_of(a), Some(b));
        assert_eq!(pair.partner_of(b), Some(a));
        assert_eq!(pair.partner_of(Uuid::new_v4()), None);
        assert!(pair.contains(a));
    }

    #[test]
    fn only_dating_kind_is_dating() {
        assert!(LikeKind::Dating.is_dating());
        assert!(!LikeKind::Study.is_dating());
        assert_eq!("project".parse::<LikeKind>(), Ok(LikeKind::Project));
        assert_eq!(serde_json::to_string(&LikeKind::Friend).unwrap(), "\"friend\"");
    }
}
