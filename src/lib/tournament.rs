use crate::observation::ObservationSource;
use crate::ranker::{rank, RankConfig, RankingVerdict};
use crate::simulator::Team;
use ahash::{HashMap, HashMapExt};
use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Points {
    pub win: u32,
    pub draw: u32,
}

/// Tournament layout.
///
/// Group entries of the first round name teams directly. Later rounds may
/// also refer to earlier standings with `<round>_<group>_<rank>`, e.g.
/// `seeds_A_2` for the runner-up of group A in round `seeds`.
#[derive(Debug, Clone, Deserialize)]
pub struct TournamentConfig {
    /// Team name to start script.
    pub teams: BTreeMap<String, String>,
    #[serde(deserialize_with = "points_from_pair")]
    pub points: Points,
    pub rounds: Vec<RoundConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundConfig {
    pub name: String,
    pub groups: BTreeMap<String, Vec<String>>,
}

fn points_from_pair<'de, D>(deserializer: D) -> Result<Points, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let (win, draw) = <(u32, u32)>::deserialize(deserializer)?;
    Ok(Points { win, draw })
}

impl TournamentConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Could not open tournament file: {}", path.display()))?;
        let config: TournamentConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Could not parse tournament file: {}", path.display()))?;
        Ok(config)
    }

    pub fn team(&self, name: &str) -> Result<Team> {
        let script = self
            .teams
            .get(name)
            .ok_or_else(|| anyhow!("Unknown team: {}", name))?;
        Ok(Team::new(name, script))
    }
}

/// Points table keeping first-seen order for equal scores.
#[derive(Debug, Clone, Default)]
pub struct Standings {
    order: Vec<String>,
    points: HashMap<String, u32>,
}

impl Standings {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut standings = Self {
            order: Vec::new(),
            points: HashMap::new(),
        };
        for name in names {
            let name: String = name.into();
            standings.award(&name, 0);
        }
        standings
    }

    pub fn award(&mut self, name: &str, points: u32) {
        match self.points.get_mut(name) {
            Some(total) => *total += points,
            None => {
                self.order.push(name.to_string());
                self.points.insert(name.to_string(), points);
            }
        }
    }

    pub fn points(&self, name: &str) -> Option<u32> {
        self.points.get(name).copied()
    }

    /// Teams by points, highest first.
    pub fn ranked(&self) -> Vec<(String, u32)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.points[name]))
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .collect()
    }

    /// Team at 1-based `rank`.
    pub fn at_rank(&self, rank: usize) -> Option<String> {
        rank.checked_sub(1)
            .and_then(|idx| self.ranked().into_iter().nth(idx))
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub round: String,
    pub group: String,
    pub verdict: RankingVerdict,
}

#[derive(Debug, Clone)]
pub struct RoundResult {
    pub name: String,
    pub groups: BTreeMap<String, Standings>,
}

#[derive(Debug, Clone)]
pub struct TournamentResult {
    pub rounds: Vec<RoundResult>,
    pub overall: Standings,
    pub matches: Vec<MatchRecord>,
}

fn resolve_entry(entry: &str, config: &TournamentConfig, played: &[RoundResult]) -> Result<String> {
    if config.teams.contains_key(entry) {
        return Ok(entry.to_string());
    }
    let (path, rank) = entry
        .rsplit_once('_')
        .ok_or_else(|| anyhow!("Entry is neither a team nor a reference: {}", entry))?;
    let (round, group) = path
        .split_once('_')
        .ok_or_else(|| anyhow!("Entry is neither a team nor a reference: {}", entry))?;
    let rank: usize = rank
        .parse()
        .with_context(|| format!("Invalid rank in reference: {}", entry))?;
    let standings = played
        .iter()
        .find(|r| r.name == round)
        .ok_or_else(|| anyhow!("Reference to a round that has not been played: {}", entry))?
        .groups
        .get(group)
        .ok_or_else(|| anyhow!("Reference to an unknown group: {}", entry))?;
    standings
        .at_rank(rank)
        .ok_or_else(|| anyhow!("Group {} of round {} has no rank {}", group, round, rank))
}

/// Ranks every pair of every group, round by round.
///
/// `source_for` builds the observation source for one pairing; the left
/// team is always the earlier entry of the group.
pub fn run_tournament<F, S>(
    config: &TournamentConfig,
    rank_config: &RankConfig,
    mut source_for: F,
) -> Result<TournamentResult>
where
    F: FnMut(&Team, &Team) -> Result<S>,
    S: ObservationSource,
{
    let mut overall = Standings::new(config.teams.keys().cloned());
    let mut rounds: Vec<RoundResult> = Vec::new();
    let mut matches = Vec::new();

    for round in &config.rounds {
        info!("Playing round: {}", round.name);
        if rounds.iter().any(|r| r.name == round.name) {
            bail!("Round {} appears twice", round.name);
        }
        let mut groups = BTreeMap::new();
        for (group, entries) in &round.groups {
            let names = entries
                .iter()
                .map(|entry| resolve_entry(entry, config, &rounds))
                .collect::<Result<Vec<String>>>()?;
            if !names.iter().all_unique() {
                bail!("Group {} of round {} lists a team twice: {:?}", group, round.name, names);
            }
            debug!("Group {}: {:?}", group, names);

            let mut standings = Standings::new(names.iter().cloned());
            for (left_name, right_name) in names.iter().tuple_combinations() {
                let left = config.team(left_name)?;
                let right = config.team(right_name)?;
                let source = source_for(&left, &right)?;
                let verdict = rank(rank_config, &left.name, &right.name, source).with_context(|| {
                    format!("Ranking {} vs {} failed in round {}", left.name, right.name, round.name)
                })?;

                match verdict.winner_id() {
                    Some(winner) => {
                        standings.award(winner, config.points.win);
                        overall.award(winner, config.points.win);
                    }
                    None => {
                        for name in [&left.name, &right.name] {
                            standings.award(name, config.points.draw);
                            overall.award(name, config.points.draw);
                        }
                    }
                }
                matches.push(MatchRecord {
                    round: round.name.clone(),
                    group: group.clone(),
                    verdict,
                });
            }
            groups.insert(group.clone(), standings);
        }
        rounds.push(RoundResult {
            name: round.name.clone(),
            groups,
        });
    }

    Ok(TournamentResult {
        rounds,
        overall,
        matches,
    })
}
