//! Normalization of the gamecenter payload into a [`GameDetail`].
//!
//! The payload is read as an untyped `serde_json::Value`. Every lookup goes
//! through the small accessor layer below and every missing or mistyped field
//! falls back to a fixed default, so normalization cannot fail.
use crate::{
    GENERIC_IMAGE_URL, GameDetail, Penalty, PlayerStat, PlayerStatsGroup, RosterPlayer,
    ScoringPlay, StatValue, TeamStat, sort_goalies, sort_skaters,
};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Default policy
// ---------------------------------------------------------------------------

/// Period used when neither the descriptor nor the flat field carries one.
pub const DEFAULT_PERIOD: u8 = 0;
pub const DEFAULT_TOI: &str = "0:00";
pub const DEFAULT_HEADSHOT: &str = GENERIC_IMAGE_URL;

type NumericSetter = fn(&mut PlayerStat, i32);

/// Raw player key → `PlayerStat` field. Each defaults to 0 when the key is
/// missing or not a number (numeric strings are accepted).
pub const PLAYER_NUMERIC_FIELDS: &[(&str, NumericSetter)] = &[
    ("goals", |p, v| p.goals = v),
    ("assists", |p, v| p.assists = v),
    ("points", |p, v| p.points = v),
    ("plusMinus", |p, v| p.plus_minus = v),
    ("sog", |p, v| p.shots = v),
    ("hits", |p, v| p.hits = v),
    ("blockedShots", |p, v| p.blocked_shots = v),
    ("pim", |p, v| p.pim = v),
    ("saves", |p, v| p.saves = v),
    ("shotsAgainst", |p, v| p.shots_against = v),
    ("goalsAgainst", |p, v| p.goals_against = v),
];

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn int(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn small<T: TryFrom<i64>>(value: &Value, key: &str) -> Option<T> {
    int(value, key).and_then(|n| T::try_from(n).ok())
}

/// Plain strings, numbers, and localized `{ "default": ... }` objects.
fn text(value: &Value, key: &str) -> Option<String> {
    let found = match value.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("default")?.as_str()?.to_owned(),
        _ => return None,
    };
    (!found.trim().is_empty()).then_some(found)
}

fn person_name(value: &Value) -> String {
    if let Some(name) = text(value, "name") {
        return name;
    }
    let first = text(value, "firstName").unwrap_or_default();
    let last = text(value, "lastName").unwrap_or_default();
    format!("{first} {last}").trim().to_owned()
}

/// Descriptor first, flat field second.
fn period_of(block: &Value) -> u8 {
    block
        .get("periodDescriptor")
        .and_then(|d| small(d, "number"))
        .or_else(|| small(block, "period"))
        .unwrap_or(DEFAULT_PERIOD)
}

fn stat_value(value: Option<&Value>) -> StatValue {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => StatValue::Integer(i),
            None => StatValue::Decimal(n.as_f64().unwrap_or_default()),
        },
        Some(Value::String(s)) => StatValue::Text(s.clone()),
        _ => StatValue::default(),
    }
}

/// Nested `boxscore.{key}` wins over a top-level `{key}`.
fn boxscore_section<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload
        .get("boxscore")
        .and_then(|b| b.get(key))
        .filter(|v| !v.is_null())
        .or_else(|| payload.get(key).filter(|v| !v.is_null()))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Build the canonical detail record. Never fails; see the default policy above.
pub fn normalize(payload: &Value) -> GameDetail {
    let summary = payload.get("summary").unwrap_or(&Value::Null);
    let players = boxscore_section(payload, "playerByGameStats").unwrap_or(&Value::Null);

    GameDetail {
        game_id: int(payload, "id").unwrap_or_default(),
        scoring: scoring_plays(summary),
        penalties: penalties(summary),
        team_stats: team_stats(boxscore_section(payload, "teamGameStats")),
        away_players: player_group(players.get("awayTeam")),
        home_players: player_group(players.get("homeTeam")),
        roster: array(payload, "rosterSpots").iter().map(roster_player).collect(),
    }
}

/// True when the payload already carries per-player stats.
pub fn has_player_stats(payload: &Value) -> bool {
    boxscore_section(payload, "playerByGameStats").is_some()
}

/// Fold a separately fetched boxscore payload into `landing.boxscore`.
/// Sections the landing payload already carries are kept; missing or null
/// ones are filled from `boxscore`.
pub fn merge_boxscore(landing: &mut Value, boxscore: Value) {
    let Some(map) = landing.as_object_mut() else {
        return;
    };
    let Value::Object(fetched) = boxscore else {
        return;
    };
    match map.get_mut("boxscore") {
        Some(Value::Object(existing)) => {
            for (key, section) in fetched {
                let slot = existing.entry(key).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = section;
                }
            }
        }
        _ => {
            map.insert("boxscore".to_string(), Value::Object(fetched));
        }
    }
}

fn scoring_plays(summary: &Value) -> Vec<ScoringPlay> {
    let mut plays: Vec<ScoringPlay> = array(summary, "scoring")
        .iter()
        .flat_map(|block| {
            let period = period_of(block);
            array(block, "goals").iter().map(move |goal| scoring_play(period, goal))
        })
        .collect();
    // Stable: flattening already keeps feed order within a period.
    plays.sort_by_key(|p| p.period);
    plays
}

fn scoring_play(period: u8, goal: &Value) -> ScoringPlay {
    ScoringPlay {
        period,
        clock: text(goal, "timeInPeriod").unwrap_or_default(),
        scorer: person_name(goal),
        assists: array(goal, "assists").iter().map(person_name).collect(),
        team_abbrev: text(goal, "teamAbbrev").unwrap_or_default(),
        strength: text(goal, "strength").unwrap_or_default(),
        situation_code: text(goal, "situationCode"),
        highlight_clip: text(goal, "highlightClip"),
        away_score: small(goal, "awayScore"),
        home_score: small(goal, "homeScore"),
    }
}

fn penalties(summary: &Value) -> Vec<Penalty> {
    let blocks = match array(summary, "penaltiesByPeriod") {
        [] => array(summary, "penalties"),
        blocks => blocks,
    };
    blocks
        .iter()
        .flat_map(|block| {
            let period = period_of(block);
            array(block, "penalties").iter().map(move |p| Penalty {
                period,
                clock: text(p, "timeInPeriod").unwrap_or_default(),
                kind: text(p, "desc")
                    .or_else(|| text(p, "descKey"))
                    .unwrap_or_default(),
                duration: small(p, "duration").unwrap_or_default(),
                committed_by: text(p, "committedByPlayer")
                    .or_else(|| text(p, "name"))
                    .unwrap_or_default(),
                team_abbrev: text(p, "teamAbbrev").unwrap_or_default(),
            })
        })
        .collect()
}

fn team_stats(section: Option<&Value>) -> Vec<TeamStat> {
    let Some(Value::Array(rows)) = section else {
        return Vec::new();
    };
    rows.iter()
        .filter(|row| row.is_object())
        .map(|row| TeamStat {
            category: text(row, "category").unwrap_or_default(),
            away: stat_value(row.get("awayValue")),
            home: stat_value(row.get("homeValue")),
        })
        .collect()
}

fn player_group(side: Option<&Value>) -> PlayerStatsGroup {
    let side = side.unwrap_or(&Value::Null);
    let decode_all = |key: &str| -> Vec<PlayerStat> {
        array(side, key).iter().map(decode_player).collect()
    };

    let mut forwards = decode_all("forwards");
    let mut defense = decode_all("defense");
    let mut goalies = decode_all("goalies");
    sort_skaters(&mut forwards);
    sort_skaters(&mut defense);
    sort_goalies(&mut goalies);

    PlayerStatsGroup { forwards, defense, goalies }
}

/// Map one raw player record, applying [`PLAYER_NUMERIC_FIELDS`] and the
/// text fallbacks.
pub fn decode_player(raw: &Value) -> PlayerStat {
    let mut stat = PlayerStat {
        player_id: int(raw, "playerId").unwrap_or_default(),
        name: person_name(raw),
        headshot: text(raw, "headshot").unwrap_or_else(|| DEFAULT_HEADSHOT.to_owned()),
        sweater_number: small(raw, "sweaterNumber").unwrap_or_default(),
        position: text(raw, "positionCode")
            .or_else(|| text(raw, "position"))
            .unwrap_or_default(),
        toi: text(raw, "toi").unwrap_or_else(|| DEFAULT_TOI.to_owned()),
        save_pctg: save_pctg(raw.get("savePctg")),
        ..Default::default()
    };
    for (key, set) in PLAYER_NUMERIC_FIELDS {
        set(&mut stat, small(raw, key).unwrap_or(0));
    }
    stat
}

fn save_pctg(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| format!("{f:.3}")),
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn roster_player(raw: &Value) -> RosterPlayer {
    RosterPlayer {
        player_id: int(raw, "playerId").unwrap_or_default(),
        team_id: int(raw, "teamId").unwrap_or_default(),
        first_name: text(raw, "firstName").unwrap_or_default(),
        last_name: text(raw, "lastName").unwrap_or_default(),
        sweater_number: small(raw, "sweaterNumber").unwrap_or_default(),
        position: text(raw, "positionCode").unwrap_or_default(),
        headshot: text(raw, "headshot").unwrap_or_else(|| DEFAULT_HEADSHOT.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "id": 2023020654,
            "summary": {
                "scoring": [
                    {
                        "periodDescriptor": { "number": 2 },
                        "period": 9,
                        "goals": [
                            {
                                "timeInPeriod": "04:12",
                                "name": { "default": "D. Pastrnak" },
                                "teamAbbrev": { "default": "BOS" },
                                "strength": "pp",
                                "highlightClip": 6345612,
                                "assists": [
                                    { "name": { "default": "C. McAvoy" } },
                                    { "name": { "default": "B. Marchand" } }
                                ],
                                "awayScore": 1,
                                "homeScore": 1
                            }
                        ]
                    },
                    {
                        "periodDescriptor": { "number": 1 },
                        "goals": [
                            { "timeInPeriod": "01:00", "name": { "default": "A. Matthews" }, "teamAbbrev": "TOR" },
                            { "timeInPeriod": "15:30", "name": { "default": "M. Marner" }, "teamAbbrev": "TOR" }
                        ]
                    }
                ],
                "penalties": [
                    {
                        "period": 1,
                        "penalties": [
                            { "timeInPeriod": "07:45", "desc": "tripping", "duration": 2, "committedByPlayer": "T. Bertuzzi", "teamAbbrev": { "default": "TOR" } }
                        ]
                    }
                ]
            },
            "boxscore": {
                "teamGameStats": [
                    { "category": "sog", "awayValue": 31, "homeValue": 28 },
                    { "category": "powerPlay", "awayValue": "1/3", "homeValue": "0/2" },
                    { "category": "expectedGoals", "awayValue": 2.4, "homeValue": 1.9 }
                ],
                "playerByGameStats": {
                    "awayTeam": {
                        "forwards": [
                            { "playerId": 1, "name": { "default": "Low" }, "points": 1, "goals": 0 },
                            { "playerId": 2, "name": { "default": "High" }, "points": 2, "goals": 1, "sog": 4 }
                        ],
                        "defense": [
                            { "playerId": 3, "name": { "default": "Tie" }, "points": 2, "goals": 2 }
                        ],
                        "goalies": [
                            { "playerId": 4, "name": { "default": "Backup" }, "saves": 10, "savePctg": 0.909 },
                            { "playerId": 5, "name": { "default": "Starter" }, "saves": 27 }
                        ]
                    }
                }
            },
            "rosterSpots": [
                { "playerId": 8478402, "teamId": 6, "firstName": { "default": "David" }, "lastName": { "default": "Pastrnak" }, "sweaterNumber": 88, "positionCode": "R" }
            ]
        })
    }

    #[test]
    fn scoring_plays_sorted_by_period_with_feed_order_within() {
        let detail = normalize(&sample_payload());
        let periods: Vec<u8> = detail.scoring.iter().map(|p| p.period).collect();
        assert_eq!(periods, vec![1, 1, 2]);
        assert_eq!(detail.scoring[0].scorer, "A. Matthews");
        assert_eq!(detail.scoring[1].scorer, "M. Marner");
    }

    #[test]
    fn descriptor_wins_over_flat_period() {
        let detail = normalize(&sample_payload());
        let pasta = detail.scoring.iter().find(|p| p.scorer == "D. Pastrnak").unwrap();
        assert_eq!(pasta.period, 2);
        assert_eq!(pasta.assists, vec!["C. McAvoy", "B. Marchand"]);
        assert_eq!(pasta.highlight_clip.as_deref(), Some("6345612"));
        assert_eq!(pasta.team_abbrev, "BOS");
        assert_eq!(pasta.home_score, Some(1));
    }

    #[test]
    fn flat_period_used_without_descriptor() {
        let payload = json!({
            "summary": { "scoring": [ { "period": 2, "goals": [ { "name": { "default": "X" } } ] } ] }
        });
        let detail = normalize(&payload);
        assert_eq!(detail.scoring.len(), 1);
        assert_eq!(detail.scoring[0].period, 2);
    }

    #[test]
    fn period_defaults_to_zero() {
        let payload = json!({ "summary": { "scoring": [ { "goals": [ {} ] } ] } });
        assert_eq!(normalize(&payload).scoring[0].period, 0);
    }

    #[test]
    fn empty_payload_yields_empty_sequences() {
        let detail = normalize(&json!({}));
        assert!(detail.scoring.is_empty());
        assert!(detail.penalties.is_empty());
        assert!(detail.team_stats.is_empty());
        assert!(detail.away_players.is_empty());
        assert!(detail.home_players.is_empty());
        assert!(detail.roster.is_empty());
    }

    #[test]
    fn mistyped_sections_degrade_to_empty() {
        let payload = json!({
            "summary": { "scoring": "unavailable", "penalties": 3 },
            "boxscore": { "teamGameStats": { "sog": 1 }, "playerByGameStats": [] },
            "rosterSpots": null
        });
        let detail = normalize(&payload);
        assert_eq!(detail, GameDetail::default());
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let payload = sample_payload();
        let first = normalize(&payload);
        let second = normalize(&payload);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn penalties_flattened_with_period() {
        let detail = normalize(&sample_payload());
        assert_eq!(detail.penalties.len(), 1);
        let p = &detail.penalties[0];
        assert_eq!(p.period, 1);
        assert_eq!(p.kind, "tripping");
        assert_eq!(p.duration, 2);
        assert_eq!(p.committed_by, "T. Bertuzzi");
        assert_eq!(p.team_abbrev, "TOR");
    }

    #[test]
    fn unknown_team_stat_categories_are_kept() {
        let detail = normalize(&sample_payload());
        let categories: Vec<&str> = detail.team_stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, vec!["sog", "powerPlay", "expectedGoals"]);
        assert_eq!(detail.team_stats[0].away, StatValue::Integer(31));
        assert_eq!(detail.team_stats[1].home, StatValue::Text("0/2".into()));
        assert_eq!(detail.team_stats[2].away, StatValue::Decimal(2.4));
    }

    #[test]
    fn player_rows_sorted() {
        let detail = normalize(&sample_payload());
        let skaters: Vec<String> = detail.away_players.skaters().into_iter().map(|p| p.name).collect();
        assert_eq!(skaters, vec!["Tie", "High", "Low"]);
        let goalies: Vec<&str> = detail.away_players.goalies.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(goalies, vec!["Starter", "Backup"]);
    }

    #[test]
    fn missing_numeric_fields_become_zero() {
        let stat = decode_player(&json!({ "playerId": 7 }));
        assert_eq!(stat.goals, 0);
        assert_eq!(stat.assists, 0);
        assert_eq!(stat.points, 0);
        assert_eq!(stat.plus_minus, 0);
        assert_eq!(stat.shots, 0);
        assert_eq!(stat.hits, 0);
        assert_eq!(stat.blocked_shots, 0);
        assert_eq!(stat.pim, 0);
        assert_eq!(stat.saves, 0);
        assert_eq!(stat.shots_against, 0);
        assert_eq!(stat.goals_against, 0);
        assert_eq!(stat.toi, DEFAULT_TOI);
        assert_eq!(stat.headshot, DEFAULT_HEADSHOT);
        assert_eq!(stat.save_pctg, None);
    }

    #[test]
    fn every_numeric_rule_reads_its_key() {
        for (key, _) in PLAYER_NUMERIC_FIELDS {
            let mut raw = serde_json::Map::new();
            raw.insert((*key).to_owned(), json!(3));
            let stat = decode_player(&Value::Object(raw));
            let fields = [
                stat.goals, stat.assists, stat.points, stat.plus_minus, stat.shots, stat.hits,
                stat.blocked_shots, stat.pim, stat.saves, stat.shots_against, stat.goals_against,
            ];
            assert_eq!(fields.iter().filter(|v| **v == 3).count(), 1, "key {key}");
        }
    }

    #[test]
    fn numeric_strings_and_position_alias() {
        let stat = decode_player(&json!({ "goals": "2", "position": "D", "savePctg": "0.000" }));
        assert_eq!(stat.goals, 2);
        assert_eq!(stat.position, "D");
        assert_eq!(stat.save_pctg.as_deref(), Some("0.000"));
    }

    #[test]
    fn top_level_player_stats_used_when_boxscore_missing() {
        let payload = json!({
            "playerByGameStats": { "homeTeam": { "goalies": [ { "saves": 30 } ] } }
        });
        assert!(has_player_stats(&payload));
        let detail = normalize(&payload);
        assert_eq!(detail.home_players.goalies[0].saves, 30);
    }

    #[test]
    fn merge_fills_missing_sections_of_existing_boxscore() {
        let mut landing = json!({
            "boxscore": { "teamGameStats": [ { "category": "sog", "awayValue": 20, "homeValue": 27 } ] }
        });
        merge_boxscore(
            &mut landing,
            json!({
                "playerByGameStats": { "homeTeam": { "goalies": [ { "saves": 25 } ] } },
                "teamGameStats": []
            }),
        );

        assert!(has_player_stats(&landing));
        let detail = normalize(&landing);
        assert_eq!(detail.home_players.goalies.len(), 1);
        assert_eq!(detail.home_players.goalies[0].saves, 25);
        assert_eq!(detail.team_stats.len(), 1, "landing section wins");
        assert_eq!(detail.team_stats[0].home, StatValue::Integer(27));
    }

    #[test]
    fn merge_replaces_null_sections_and_attaches_when_absent() {
        let mut landing = json!({ "boxscore": { "playerByGameStats": null } });
        merge_boxscore(&mut landing, json!({ "playerByGameStats": { "awayTeam": {} } }));
        assert!(has_player_stats(&landing));

        let mut bare = json!({ "id": 1 });
        merge_boxscore(&mut bare, json!({ "playerByGameStats": { "awayTeam": {} } }));
        assert!(has_player_stats(&bare));

        let mut untouched = json!({ "id": 2 });
        merge_boxscore(&mut untouched, json!("not an object"));
        assert_eq!(untouched, json!({ "id": 2 }));
    }

    #[test]
    fn team_stat_rows_without_category_are_kept() {
        let payload = json!({
            "boxscore": { "teamGameStats": [
                { "awayValue": 3, "homeValue": 4 },
                { "category": "hits", "awayValue": 18, "homeValue": 22 },
                "garbage"
            ] }
        });
        let stats = normalize(&payload).team_stats;
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, "");
        assert_eq!(stats[0].away, StatValue::Integer(3));
        assert_eq!(stats[1].category, "hits");
    }

    #[test]
    fn roster_mapped() {
        let detail = normalize(&sample_payload());
        assert_eq!(detail.roster.len(), 1);
        assert_eq!(detail.roster[0].full_name(), "David Pastrnak");
        assert_eq!(detail.roster[0].sweater_number, 88);
    }
}
