//! Player Identity Types
//!
//! Stable player identifiers, team roles, and the immutable game roster.
//! All per-agent state elsewhere in the workspace is arena-held in vectors
//! indexed by [`PlayerId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of a player in the roster.
///
/// Assigned once at game start and never reused. Doubles as the arena
/// index for ledgers and belief models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl PlayerId {
    /// Returns the underlying arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player_{}", self.0)
    }
}

/// Team role of a player.
///
/// Role is the only axis of asymmetry in the layer: belief semantics,
/// reward tables, and meeting-role stacks are all keyed off this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Crewmate,
    Impostor,
}

impl Role {
    /// Whether this role is the adversarial one.
    pub fn is_impostor(self) -> bool {
        matches!(self, Role::Impostor)
    }

    /// The opposing team.
    pub fn opponent(self) -> Role {
        match self {
            Role::Crewmate => Role::Impostor,
            Role::Impostor => Role::Crewmate,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Crewmate => write!(f, "crewmate"),
            Role::Impostor => write!(f, "impostor"),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
}

impl PlayerInfo {
    /// Creates a new roster entry.
    pub fn new(id: PlayerId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

/// Immutable list of players fixed at game start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<PlayerInfo>,
}

impl Roster {
    /// Creates a roster from a list of entries.
    ///
    /// Entries are expected in id order; ids must match their position.
    pub fn new(players: Vec<PlayerInfo>) -> Self {
        Self { players }
    }

    /// Builds a roster from `(name, role)` pairs, assigning sequential ids.
    pub fn from_names<N, I>(entries: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Role)>,
    {
        let players = entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, role))| PlayerInfo::new(PlayerId(i), name, role))
            .collect();
        Self { players }
    }

    /// Looks up a player by id.
    pub fn get(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.players.get(id.index())
    }

    /// Whether the id refers to a known player.
    pub fn contains(&self, id: PlayerId) -> bool {
        id.index() < self.players.len()
    }

    /// Number of players in the roster.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// All player ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    /// All roster entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter()
    }

    /// The role of a player, if known.
    pub fn role_of(&self, id: PlayerId) -> Option<Role> {
        self.get(id).map(|p| p.role)
    }

    /// The display name of a player, if known.
    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.get(id).map(|p| p.name.as_str())
    }

    /// Ids of all impostors.
    pub fn impostors(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.role.is_impostor())
            .map(|p| p.id)
            .collect()
    }

    /// Ids of all crewmates.
    pub fn crewmates(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.role.is_impostor())
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_roster() -> Roster {
        Roster::from_names([
            ("Red", Role::Impostor),
            ("Blue", Role::Crewmate),
            ("Green", Role::Crewmate),
            ("Yellow", Role::Crewmate),
            ("Purple", Role::Crewmate),
        ])
    }

    #[test]
    fn test_roster_lookup() {
        let roster = make_roster();

        assert_eq!(roster.len(), 5);
        assert_eq!(roster.name_of(PlayerId(0)), Some("Red"));
        assert_eq!(roster.role_of(PlayerId(0)), Some(Role::Impostor));
        assert_eq!(roster.role_of(PlayerId(1)), Some(Role::Crewmate));
        assert!(roster.contains(PlayerId(4)));
        assert!(!roster.contains(PlayerId(5)));
    }

    #[test]
    fn test_roster_team_partition() {
        let roster = make_roster();

        assert_eq!(roster.impostors(), vec![PlayerId(0)]);
        assert_eq!(
            roster.crewmates(),
            vec![PlayerId(1), PlayerId(2), PlayerId(3), PlayerId(4)]
        );
    }

    #[test]
    fn test_role_opponent() {
        assert_eq!(Role::Crewmate.opponent(), Role::Impostor);
        assert_eq!(Role::Impostor.opponent(), Role::Crewmate);
        assert!(Role::Impostor.is_impostor());
        assert!(!Role::Crewmate.is_impostor());
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(3).to_string(), "player_3");
    }

    #[test]
    fn test_roster_serialization() {
        let roster = make_roster();
        let json = serde_json::to_string(&roster).unwrap();
        let parsed: Roster = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed.name_of(PlayerId(2)), Some("Green"));
    }
}
