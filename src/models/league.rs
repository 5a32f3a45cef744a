use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit of locking, calculation and snapshotting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeagueSeasonKey {
    pub league_id: i64,
    pub season_id: i64,
}

impl LeagueSeasonKey {
    pub fn new(league_id: i64, season_id: i64) -> Self {
        Self {
            league_id,
            season_id,
        }
    }
}

impl fmt::Display for LeagueSeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "league:{}/season:{}", self.league_id, self.season_id)
    }
}

/// A competing club or roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

impl Side {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            logo: None,
        }
    }
}

/// A competition grouping sides; `sides` are the registered participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sides: Vec<Side>,
}

impl League {
    pub fn new(id: i64, name: impl Into<String>, sides: Vec<Side>) -> Self {
        Self {
            id,
            name: name.into(),
            sides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: i64,
    pub name: String,
}

impl Season {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
