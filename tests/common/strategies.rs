use proptest::prelude::*;

use standings_core::models::{LeagueSeasonKey, Match, Side};

pub const PROPERTY_KEY: LeagueSeasonKey = LeagueSeasonKey {
    league_id: 9,
    season_id: 2025,
};

/// Realistic amateur scores
pub fn goals_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![8 => 0u32..=5, 2 => 6u32..=10]
}

/// Two distinct side ids
pub fn pairing_strategy(sides: i64) -> impl Strategy<Value = (i64, i64)> {
    (1..=sides, 1..=sides).prop_filter("a side cannot play itself", |(home, away)| home != away)
}

/// A valid completed match between distinct sides
pub fn completed_match_strategy() -> impl Strategy<Value = Match> {
    (1i64..10_000, pairing_strategy(12), goals_strategy(), goals_strategy()).prop_map(
        |(id, (home, away), home_goals, away_goals)| {
            Match::completed(id, PROPERTY_KEY, home, away, home_goals, away_goals)
        },
    )
}

/// A season's worth of completed matches among `sides` sides
pub fn season_strategy(sides: i64) -> impl Strategy<Value = Vec<Match>> {
    prop::collection::vec((pairing_strategy(sides), goals_strategy(), goals_strategy()), 0..40)
        .prop_map(|games| {
            games
                .into_iter()
                .enumerate()
                .map(|(index, ((home, away), home_goals, away_goals))| {
                    Match::completed(index as i64 + 1, PROPERTY_KEY, home, away, home_goals, away_goals)
                })
                .collect()
        })
}

/// Registered sides with names that may collide on purpose
pub fn sides_strategy(count: i64) -> impl Strategy<Value = Vec<Side>> {
    prop::collection::vec(prop::sample::select(vec!["Eintracht", "Borussia", "Fortuna", "Union"]), count as usize)
        .prop_map(|names| {
            names
                .into_iter()
                .enumerate()
                .map(|(index, name)| Side::new(index as i64 + 1, name))
                .collect()
        })
}

/// Goal values a hostile payload might carry
pub fn bad_goal_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1000.0f64..-0.001),
        (0u32..50).prop_map(|whole| f64::from(whole) + 0.5),
    ]
}
