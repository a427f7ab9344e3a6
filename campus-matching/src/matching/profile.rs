use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest and highest accepted personality level.
pub const LEVEL_MIN: i32 = 0;
pub const LEVEL_MAX: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Communication {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "vc")]
    VoiceCall,
    #[serde(rename = "in-person")]
    InPerson,
}

impl Communication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::VoiceCall => "vc",
            Self::InPerson => "in-person",
        }
    }
}

impl std::str::FromStr for Communication {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "vc" | "voice-call" => Ok(Self::VoiceCall),
            "in-person" => Ok(Self::InPerson),
            _ => Err(format!("unknown communication preference: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WakeCycle {
    EarlyBird,
    NightOwl,
    Flexible,
}

impl WakeCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EarlyBird => "early-bird",
            Self::NightOwl => "night-owl",
            Self::Flexible => "flexible",
        }
    }
}

impl std::str::FromStr for WakeCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early-bird" => Ok(Self::EarlyBird),
            "night-owl" => Ok(Self::NightOwl),
            "flexible" => Ok(Self::Flexible),
            _ => Err(format!("unknown wake cycle: {s}")),
        }
    }
}

/// Who a dating-enabled profile wants to see.
///
/// Stored as a plain string: `"everyone"` or a gender value such as
/// `"male"` / `"female"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatingPreference {
    #[default]
    Everyone,
    Only(String),
}

impl DatingPreference {
    /// Whether a person of `observed` gender satisfies this preference.
    /// An unknown gender never satisfies a specific preference.
    pub fn accepts(&self, observed: Option<&str>) -> bool {
        match self {
            Self::Everyone => true,
            Self::Only(wanted) => observed == Some(wanted.as_str()),
        }
    }
}

impl From<String> for DatingPreference {
    fn from(value: String) -> Self {
        if value == "everyone" {
            Self::Everyone
        } else {
            Self::Only(value)
        }
    }
}

impl From<DatingPreference> for String {
    fn from(value: DatingPreference) -> Self {
        match value {
            DatingPreference::Everyone => "everyone".to_string(),
            DatingPreference::Only(gender) => gender,
        }
    }
}

/// The attributes of a participant that scoring and discovery look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub branch: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    pub personality_social_level: i32,
    pub personality_activity_level: i32,
    pub personality_communication: Communication,
    pub personality_wake_cycle: WakeCycle,
    #[serde(rename = "dating_mode")]
    pub dating_enabled: bool,
    pub dating_preference: Option<DatingPreference>,
    pub gender: Option<String>,
    pub onboarding_completed: bool,
}

impl Profile {
    /// Effective preference; unset means everyone.
    pub fn preference(&self) -> DatingPreference {
        self.dating_preference.clone().unwrap_or_default()
    }

    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }
}

/// A partial profile edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i32>,
    pub interests: Option<Vec<String>>,
    pub hobbies: Option<Vec<String>>,
    pub goals: Option<Vec<String>>,
    pub personality_social_level: Option<i32>,
    pub personality_activity_level: Option<i32>,
    pub personality_communication: Option<Communication>,
    pub personality_wake_cycle: Option<WakeCycle>,
    pub dating_enabled: Option<bool>,
    pub dating_preference: Option<DatingPreference>,
    pub gender: Option<String>,
    pub onboarding_completed: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply(self, mut profile: Profile) -> Profile {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut profile.name, self.name);
        set(&mut profile.interests, self.interests);
        set(&mut profile.hobbies, self.hobbies);
        set(&mut profile.goals, self.goals);
        set(&mut profile.personality_social_level, self.personality_social_level);
        set(&mut profile.personality_activity_level, self.personality_activity_level);
        set(&mut profile.personality_communication, self.personality_communication);
        set(&mut profile.personality_wake_cycle, self.personality_wake_cycle);
        set(&mut profile.dating_enabled, self.dating_enabled);
        set(&mut profile.onboarding_completed, self.onboarding_completed);
        if self.branch.is_some() {
            profile.branch = self.branch;
        }
        if self.year.is_some() {
            profile.year = self.year;
        }
        if self.dating_preference.is_some() {
            profile.dating_preference = self.dating_preference;
        }
        if self.gender.is_some() {
            profile.gender = self.gender;
        }
        profile
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A fully onboarded profile with neutral attributes and empty lists.
    pub fn profile(id: Uuid) -> Profile {
        Profile {
            id,
            name: format!("user-{}", &id.to_string()[..8]),
            branch: None,
            year: None,
            interests: vec![],
            hobbies: vec![],
            goals: vec![],
            personality_social_level: 5,
            personality_activity_level: 5,
            personality_communication: Communication::Text,
            personality_wake_cycle: WakeCycle::Flexible,
            dating_enabled: false,
            dating_preference: None,
            gender: None,
            onboarding_completed: true,
        }
    }

    pub fn dater(id: Uuid, gender: &str, preference: &str) -> Profile {
        Profile {
            dating_enabled: true,
            gender: Some(gender.to_string()),
            dating_preference: Some(DatingPreference::from(preference.to_string())),
            ..profile(id)
        }
    }

    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_accepts_unknown_gender() {
        assert!(DatingPreference::Everyone.accepts(None));
        assert!(DatingPreference::Everyone.accepts(Some("non-binary")));
    }

    #[test]
    fn specific_preference_needs_exact_gender() {
        let pref = DatingPreference::Only("female".into());
        assert!(pref.accepts(Some("female")));
        assert!(!pref.accepts(Some("male")));
        assert!(!pref.accepts(None));
    }

    #[test]
    fn preference_wire_format() {
        let pref: DatingPreference = serde_json::from_str("\"everyone\"").unwrap();
        assert_eq!(pref, DatingPreference::Everyone);

        let pref: DatingPreference = serde_json::from_str("\"male\"").unwrap();
        assert_eq!(pref, DatingPreference::Only("male".into()));
        assert_eq!(serde_json::to_string(&pref).unwrap(), "\"male\"");
    }

    #[test]
    fn unset_preference_defaults_to_everyone() {
        let p = fixtures::profile(Uuid::new_v4());
        assert_eq!(p.preference(), DatingPreference::Everyone);
    }

    #[test]
    fn enum_spellings() {
        assert_eq!(serde_json::to_string(&WakeCycle::EarlyBird).unwrap(), "\"early-bird\"");
        assert_eq!(serde_json::to_string(&Communication::VoiceCall).unwrap(), "\"vc\"");
        assert_eq!("in-person".parse::<Communication>(), Ok(Communication::InPerson));
        assert!("sometimes".parse::<WakeCycle>().is_err());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let before = fixtures::profile(Uuid::new_v4());
        let after = ProfileUpdate {
            branch: Some("Civil".into()),
            personality_social_level: Some(8),
            dating_enabled: Some(true),
            ..Default::default()
        }
        .apply(before.clone());

        assert_eq!(after.branch.as_deref(), Some("Civil"));
        assert_eq!(after.personality_social_level, 8);
        assert!(after.dating_enabled);
        assert_eq!(after.name, before.name);
        assert_eq!(after.personality_wake_cycle, before.personality_wake_cycle);
        assert_eq!(after.gender, None);
    }
}
