//! The closed set of league roles and their precedence.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// A league role. Every user holds exactly one.
///
/// Parsing accepts the identifier (`HeadCoach`) and the spaced display
/// name (`Head Coach`), case-insensitively.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin,
    #[strum(to_string = "LeagueManager", serialize = "League Manager")]
    #[serde(alias = "League Manager")]
    LeagueManager,
    #[strum(to_string = "HeadCoach", serialize = "Head Coach")]
    #[serde(alias = "Head Coach")]
    HeadCoach,
    #[strum(to_string = "AssistantCoach", serialize = "Assistant Coach")]
    #[serde(alias = "Assistant Coach")]
    AssistantCoach,
    Parent,
    Player,
    #[default]
    #[strum(to_string = "UnconfirmedUser", serialize = "Unconfirmed User")]
    #[serde(alias = "Unconfirmed User")]
    UnconfirmedUser,
}

impl Role {
    /// Precedence: a higher rank may manage lower ranks.
    pub const fn rank(self) -> u8 {
        match self {
            Role::Admin => 6,
            Role::LeagueManager => 5,
            Role::HeadCoach => 4,
            Role::AssistantCoach => 3,
            Role::Parent => 2,
            Role::Player => 1,
            Role::UnconfirmedUser => 0,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::LeagueManager => "League Manager",
            Role::HeadCoach => "Head Coach",
            Role::AssistantCoach => "Assistant Coach",
            Role::Parent => "Parent",
            Role::Player => "Player",
            Role::UnconfirmedUser => "Unconfirmed User",
        }
    }

    /// Roles that may alter other users at all.
    pub const fn is_manager(self) -> bool {
        self.rank() >= Role::HeadCoach.rank()
    }

    pub const fn is_confirmed(self) -> bool {
        !matches!(self, Role::UnconfirmedUser)
    }

    pub fn all() -> impl Iterator<Item = Role> {
        Role::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ranks_are_strictly_ordered() {
        let ranks: Vec<u8> = Role::all().map(Role::rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_parse_accepts_identifier_and_display_name() {
        assert_eq!(Role::from_str("HeadCoach").unwrap(), Role::HeadCoach);
        assert_eq!(Role::from_str("Head Coach").unwrap(), Role::HeadCoach);
        assert_eq!(Role::from_str("league manager").unwrap(), Role::LeagueManager);
        assert_eq!(Role::from_str("parent").unwrap(), Role::Parent);
        assert!(Role::from_str("Referee").is_err());
    }

    #[test]
    fn test_display_uses_identifier() {
        assert_eq!(Role::AssistantCoach.to_string(), "AssistantCoach");
        assert_eq!(Role::AssistantCoach.display_name(), "Assistant Coach");
    }

    #[test]
    fn test_serde_accepts_alias() {
        let role: Role = serde_json::from_str("\"League Manager\"").unwrap();
        assert_eq!(role, Role::LeagueManager);
        assert_eq!(serde_json::to_string(&Role::LeagueManager).unwrap(), "\"LeagueManager\"");
    }

    #[test]
    fn test_managers() {
        assert!(Role::Admin.is_manager());
        assert!(Role::HeadCoach.is_manager());
        assert!(!Role::AssistantCoach.is_manager());
        assert!(!Role::UnconfirmedUser.is_confirmed());
    }
}
