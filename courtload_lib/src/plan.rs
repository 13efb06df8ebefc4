//! The stats API load plan: which endpoints feed which datasets, in which order.
//!
//! | phase        | datasets                                                       | built from          |
//! |--------------|----------------------------------------------------------------|---------------------|
//! | `core`       | game logs, player index, team years, draft, playoff series     | season only         |
//! | `dependents` | rosters, schedule, box scores, play-by-play, player info       | `core`              |
//! | `lineups`    | league and per-team lineups                                    | `core`              |
//! | `shot_charts`| shot charts, one task per team side of every game              | `dependents`        |

use chrono::NaiveDate;
use serde_json::Value;
use statsnba_api::types::{PlayerOrTeam, ResultSelector, ResultSetName};
use statsnba_api::{
    BoxScoreParams, CommonAllPlayersParams, CommonPlayerInfoParams, CommonPlayoffSeriesParams,
    CommonTeamRosterParams, CommonTeamYearsParams, DraftHistoryParams, LeagueDashLineupsParams,
    LeagueGameLogParams, PlayByPlayParams, ScoreboardParams, ShotChartParams,
    TeamDashLineupsParams,
};

use crate::orchestrator::{cap, FetchPhase, FetchTask, Tables};
use crate::season::SeasonContext;
use crate::table::id_string;

pub const TEAM_GAME_LOGS: &str = "team_game_logs";
pub const PLAYER_GAME_LOGS: &str = "player_game_logs";
pub const COMMON_ALL_PLAYERS: &str = "common_all_players";
pub const COMMON_TEAM_YEARS: &str = "common_team_years";
pub const DRAFT_HISTORY: &str = "draft_history";
pub const COMMON_PLAYOFF_SERIES: &str = "common_playoff_series";
pub const TEAM_ROSTERS: &str = "team_rosters";
pub const SCHEDULE: &str = "schedule";
pub const BOX_SUMMARIES: &str = "box_summaries";
pub const BOX_ADVANCED: &str = "box_advanced";
pub const BOX_TRADITIONAL: &str = "box_traditional";
pub const PLAYBYPLAY: &str = "playbyplay";
pub const PLAYER_INFO: &str = "player_info";
pub const LEAGUE_DASH_LINEUPS: &str = "league_dash_lineups";
pub const TEAM_DASH_LINEUPS: &str = "team_dash_lineups";
pub const SHOT_CHARTS: &str = "shot_charts";

/// Mechanical knobs that shrink a run without changing what it does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Cap on every derived id list (teams, dates, games, players).
    pub limit: Option<usize>,
    /// Leave the lineup endpoints out; their datasets come back empty.
    pub skip_lineups: bool,
}

/// Builds the four stats API phases for one season.
pub fn nba_phases(context: SeasonContext, options: PlanOptions) -> Vec<FetchPhase> {
    vec![
        core_phase(context),
        dependents_phase(context, options),
        lineups_phase(context, options),
        shot_charts_phase(context),
    ]
}

fn core_phase(ctx: SeasonContext) -> FetchPhase {
    FetchPhase::new(
        "core",
        &[
            TEAM_GAME_LOGS,
            PLAYER_GAME_LOGS,
            COMMON_ALL_PLAYERS,
            COMMON_TEAM_YEARS,
            DRAFT_HISTORY,
            COMMON_PLAYOFF_SERIES,
        ],
        move |_| {
            let label = ctx.season_label();
            let mut tasks = Vec::new();
            push(
                &mut tasks,
                TEAM_GAME_LOGS,
                LeagueGameLogParams::new(&label, ctx.season_type, PlayerOrTeam::Team)
                    .map(|p| FetchTask::new(TEAM_GAME_LOGS, p)),
            );
            push(
                &mut tasks,
                PLAYER_GAME_LOGS,
                LeagueGameLogParams::new(&label, ctx.season_type, PlayerOrTeam::Player)
                    .map(|p| FetchTask::new(PLAYER_GAME_LOGS, p)),
            );
            push(
                &mut tasks,
                COMMON_ALL_PLAYERS,
                CommonAllPlayersParams::new(&label).map(|p| {
                    FetchTask::new(COMMON_ALL_PLAYERS, p)
                        .select(ResultSelector::Name(ResultSetName::COMMON_ALL_PLAYERS))
                }),
            );
            tasks.push(FetchTask::new(COMMON_TEAM_YEARS, CommonTeamYearsParams));
            tasks.push(FetchTask::new(DRAFT_HISTORY, DraftHistoryParams));
            push(
                &mut tasks,
                COMMON_PLAYOFF_SERIES,
                CommonPlayoffSeriesParams::new(&label).map(|p| FetchTask::new(COMMON_PLAYOFF_SERIES, p)),
            );
            tasks
        },
    )
}

fn dependents_phase(ctx: SeasonContext, options: PlanOptions) -> FetchPhase {
    FetchPhase::new(
        "dependents",
        &[
            TEAM_ROSTERS,
            SCHEDULE,
            BOX_SUMMARIES,
            BOX_ADVANCED,
            BOX_TRADITIONAL,
            PLAYBYPLAY,
            PLAYER_INFO,
        ],
        move |upstream| {
            let label = ctx.season_label();
            let mut tasks = Vec::new();

            for (team_id, abbreviation) in cap(teams_by_abbreviation(upstream), options.limit) {
                push(
                    &mut tasks,
                    TEAM_ROSTERS,
                    CommonTeamRosterParams::new(&label, &team_id).map(|p| {
                        FetchTask::new(TEAM_ROSTERS, p)
                            .select(ResultSelector::Name(ResultSetName::COMMON_TEAM_ROSTER))
                            .tag("team_id", id_value(&team_id))
                            .tag("team_abbreviation", abbreviation.clone())
                    }),
                );
            }

            for date in cap(game_dates(upstream), options.limit) {
                tasks.push(
                    FetchTask::new(SCHEDULE, ScoreboardParams::new(date))
                        .select(ResultSelector::Name(ResultSetName::GAME_HEADER)),
                );
            }

            for game_id in cap(game_ids(upstream), options.limit) {
                push(
                    &mut tasks,
                    BOX_SUMMARIES,
                    BoxScoreParams::summary(&game_id).map(|p| {
                        FetchTask::new(BOX_SUMMARIES, p)
                            .select(ResultSelector::Name(ResultSetName::GAME_SUMMARY))
                    }),
                );
                push(
                    &mut tasks,
                    BOX_ADVANCED,
                    BoxScoreParams::advanced(&game_id).map(|p| FetchTask::new(BOX_ADVANCED, p)),
                );
                push(
                    &mut tasks,
                    BOX_TRADITIONAL,
                    BoxScoreParams::traditional(&game_id)
                        .map(|p| FetchTask::new(BOX_TRADITIONAL, p)),
                );
                push(
                    &mut tasks,
                    PLAYBYPLAY,
                    PlayByPlayParams::new(&game_id).map(|p| FetchTask::new(PLAYBYPLAY, p)),
                );
            }

            for person_id in cap(distinct_ids(upstream, COMMON_ALL_PLAYERS, "person_id"), options.limit) {
                push(
                    &mut tasks,
                    PLAYER_INFO,
                    CommonPlayerInfoParams::new(&person_id).map(|p| {
                        FetchTask::new(PLAYER_INFO, p)
                            .select(ResultSelector::Name(ResultSetName::COMMON_PLAYER_INFO))
                    }),
                );
            }
            tasks
        },
    )
    .dedupe_by(SCHEDULE, &["game_id"])
}

fn lineups_phase(ctx: SeasonContext, options: PlanOptions) -> FetchPhase {
    FetchPhase::new(
        "lineups",
        &[LEAGUE_DASH_LINEUPS, TEAM_DASH_LINEUPS],
        move |upstream| {
            let label = ctx.season_label();
            let mut tasks = Vec::new();
            push(
                &mut tasks,
                LEAGUE_DASH_LINEUPS,
                LeagueDashLineupsParams::new(&label, ctx.season_type)
                    .map(|p| FetchTask::new(LEAGUE_DASH_LINEUPS, p)),
            );
            for team_id in cap(distinct_ids(upstream, TEAM_GAME_LOGS, "team_id"), options.limit) {
                push(
                    &mut tasks,
                    TEAM_DASH_LINEUPS,
                    TeamDashLineupsParams::new(&label, ctx.season_type, &team_id).map(|p| {
                        FetchTask::new(TEAM_DASH_LINEUPS, p).tag("team_id", id_value(&team_id))
                    }),
                );
            }
            tasks
        },
    )
    .skipped(options.skip_lineups)
}

fn shot_charts_phase(ctx: SeasonContext) -> FetchPhase {
    FetchPhase::new("shot_charts", &[SHOT_CHARTS], move |upstream| {
        let label = ctx.season_label();
        let mut tasks = Vec::new();
        let Some(summaries) = upstream.get(BOX_SUMMARIES) else {
            return tasks;
        };
        for triple in summaries.distinct(&["game_id", "home_team_id", "visitor_team_id"]) {
            let (Some(game_id), Some(home), Some(visitor)) = (
                id_string(&triple[0]),
                id_string(&triple[1]),
                id_string(&triple[2]),
            ) else {
                continue;
            };
            for team_id in [home, visitor] {
                push(
                    &mut tasks,
                    SHOT_CHARTS,
                    ShotChartParams::new(&label, ctx.season_type, &game_id, &team_id).map(|p| {
                        FetchTask::new(SHOT_CHARTS, p)
                            .tag("game_id", game_id.clone())
                            .tag("team_id", id_value(&team_id))
                    }),
                );
            }
        }
        tasks
    })
}

/// Keeps a task whose parameters validated; logs and drops the rest.
fn push(tasks: &mut Vec<FetchTask>, dataset: &str, built: Result<FetchTask, statsnba_api::Error>) {
    match built {
        Ok(task) => tasks.push(task),
        Err(e) => tracing::warn!("{}: skipping task: {}", dataset, e),
    }
}

/// Numeric ids are tagged as integers, anything else as text.
fn id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(id.to_string()))
}

fn distinct_ids(upstream: &Tables, dataset: &str, column: &str) -> Vec<String> {
    upstream
        .get(dataset)
        .map(|t| {
            t.distinct(&[column])
                .iter()
                .filter_map(|row| id_string(&row[0]))
                .collect()
        })
        .unwrap_or_default()
}

fn game_ids(upstream: &Tables) -> Vec<String> {
    distinct_ids(upstream, TEAM_GAME_LOGS, "game_id")
}

/// Distinct `(team_id, team_abbreviation)` pairs, sorted by abbreviation.
fn teams_by_abbreviation(upstream: &Tables) -> Vec<(String, String)> {
    let Some(logs) = upstream.get(TEAM_GAME_LOGS) else {
        return Vec::new();
    };
    let mut teams: Vec<(String, String)> = logs
        .distinct(&["team_id", "team_abbreviation"])
        .iter()
        .filter_map(|row| Some((id_string(&row[0])?, id_string(&row[1])?)))
        .collect();
    teams.sort_by(|a, b| a.1.cmp(&b.1));
    teams
}

/// Distinct game dates, sorted. Accepts `2025-10-21` and `2025-10-21T00:00:00`.
fn game_dates(upstream: &Tables) -> Vec<NaiveDate> {
    let Some(logs) = upstream.get(TEAM_GAME_LOGS) else {
        return Vec::new();
    };
    let mut dates: Vec<NaiveDate> = logs
        .distinct(&["game_date"])
        .iter()
        .filter_map(|row| {
            let raw = row[0].as_str()?;
            let day = raw.get(..10).unwrap_or(raw);
            match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    tracing::warn!("{}: unparsable game_date {:?}", SCHEDULE, raw);
                    None
                }
            }
        })
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::{Season, SeasonType};
    use crate::table::RawTable;
    use serde_json::json;
    use statsnba_api::Query;

    fn ctx() -> SeasonContext {
        SeasonContext::new(Season::new(2026).unwrap(), SeasonType::RegularSeason)
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn upstream() -> Tables {
        let mut tables = Tables::new();
        tables.insert(
            TEAM_GAME_LOGS.into(),
            RawTable::new(
                TEAM_GAME_LOGS,
                cols(&["team_id", "team_abbreviation", "game_id", "game_date"]),
                vec![
                    vec![json!(1610612752), json!("NYK"), json!("0022500001"), json!("2025-10-21")],
                    vec![json!(1610612738), json!("BOS"), json!("0022500001"), json!("2025-10-21")],
                    vec![json!(1610612747), json!("LAL"), json!("0022500002"), json!("2025-10-22T00:00:00")],
                    vec![json!(1610612744), json!("GSW"), json!("0022500002"), json!("2025-10-22T00:00:00")],
                ],
            ),
        );
        tables.insert(
            COMMON_ALL_PLAYERS.into(),
            RawTable::new(
                COMMON_ALL_PLAYERS,
                cols(&["person_id", "display_first_last"]),
                vec![
                    vec![json!(201939), json!("Stephen Curry")],
                    vec![json!(2544), json!("LeBron James")],
                ],
            ),
        );
        tables
    }

    fn by_dataset<'a>(tasks: &'a [FetchTask], dataset: &str) -> Vec<&'a FetchTask> {
        tasks.iter().filter(|t| t.dataset == dataset).collect()
    }

    fn param<'a>(pairs: &'a [(&'static str, String)], key: &str) -> &'a str {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn four_phases_in_order() {
        let names: Vec<_> = nba_phases(ctx(), PlanOptions::default())
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["core", "dependents", "lineups", "shot_charts"]);
    }

    #[test]
    fn core_needs_no_upstream() {
        let tasks = core_phase(ctx()).build_tasks(&Tables::new());
        assert_eq!(tasks.len(), 6);
        let team = by_dataset(&tasks, TEAM_GAME_LOGS)[0].params.to_query_pairs();
        assert_eq!(param(&team, "PlayerOrTeam"), "T");
        assert_eq!(param(&team, "Season"), "2025-26");
        assert_eq!(param(&team, "SeasonType"), "Regular Season");
    }

    #[test]
    fn rosters_sorted_by_abbreviation_and_tagged() {
        let tasks = dependents_phase(ctx(), PlanOptions::default()).build_tasks(&upstream());
        let rosters = by_dataset(&tasks, TEAM_ROSTERS);
        let abbrevs: Vec<_> = rosters
            .iter()
            .map(|t| t.tags.iter().find(|(k, _)| k == "team_abbreviation").unwrap().1.clone())
            .collect();
        assert_eq!(abbrevs, vec![json!("BOS"), json!("GSW"), json!("LAL"), json!("NYK")]);
        assert_eq!(rosters[0].tags[0], ("team_id".to_string(), json!(1610612738)));
    }

    #[test]
    fn schedule_dates_and_game_fanout() {
        let tasks = dependents_phase(ctx(), PlanOptions::default()).build_tasks(&upstream());
        let dates: Vec<String> = by_dataset(&tasks, SCHEDULE)
            .iter()
            .map(|t| param(&t.params.to_query_pairs(), "GameDate").to_string())
            .collect();
        assert_eq!(dates, vec!["10/21/2025", "10/22/2025"]);
        for dataset in [BOX_SUMMARIES, BOX_ADVANCED, BOX_TRADITIONAL, PLAYBYPLAY] {
            assert_eq!(by_dataset(&tasks, dataset).len(), 2, "{}", dataset);
        }
        assert_eq!(by_dataset(&tasks, PLAYER_INFO).len(), 2);
    }

    #[test]
    fn limit_caps_every_list() {
        let options = PlanOptions {
            limit: Some(1),
            skip_lineups: false,
        };
        let tasks = dependents_phase(ctx(), options).build_tasks(&upstream());
        for dataset in [TEAM_ROSTERS, SCHEDULE, BOX_SUMMARIES, PLAYBYPLAY, PLAYER_INFO] {
            assert_eq!(by_dataset(&tasks, dataset).len(), 1, "{}", dataset);
        }
    }

    #[test]
    fn empty_upstream_builds_nothing() {
        let tasks = dependents_phase(ctx(), PlanOptions::default()).build_tasks(&Tables::new());
        assert!(tasks.is_empty());
        let tasks = shot_charts_phase(ctx()).build_tasks(&Tables::new());
        assert!(tasks.is_empty());
    }

    #[test]
    fn lineups_skippable() {
        let options = PlanOptions {
            limit: None,
            skip_lineups: true,
        };
        assert!(lineups_phase(ctx(), options).skip);
        let tasks = lineups_phase(ctx(), PlanOptions::default()).build_tasks(&upstream());
        assert_eq!(by_dataset(&tasks, LEAGUE_DASH_LINEUPS).len(), 1);
        assert_eq!(by_dataset(&tasks, TEAM_DASH_LINEUPS).len(), 4);
    }

    #[test]
    fn shot_charts_one_task_per_team_side() {
        let mut tables = Tables::new();
        tables.insert(
            BOX_SUMMARIES.into(),
            RawTable::new(
                BOX_SUMMARIES,
                cols(&["game_id", "home_team_id", "visitor_team_id"]),
                vec![
                    vec![json!("0022500001"), json!(1610612738), json!(1610612752)],
                    vec![json!("0022500001"), json!(1610612738), json!(1610612752)],
                    vec![json!("0022500002"), json!(1610612747), json!(null)],
                ],
            ),
        );
        let tasks = shot_charts_phase(ctx()).build_tasks(&tables);
        assert_eq!(tasks.len(), 2);
        let teams: Vec<_> = tasks
            .iter()
            .map(|t| param(&t.params.to_query_pairs(), "TeamID").to_string())
            .collect();
        assert_eq!(teams, vec!["1610612738", "1610612752"]);
        assert!(tasks
            .iter()
            .all(|t| t.tags.contains(&("game_id".to_string(), json!("0022500001")))));
    }
}
