use anyhow::{Context, Result};
use bayesrank_utils::tournament::{MatchRecord, Standings, TournamentResult};
use csv::WriterBuilder;
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Writes `name<TAB>points` lines, best team first.
pub fn write_standings(file_path: &Path, standings: &Standings) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Could not create standings file: {}", file_path.display()))?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(file);
    for (name, points) in standings.ranked() {
        writer.write_record([name, points.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    round: &'a str,
    group: &'a str,
    left: &'a str,
    right: &'a str,
    winner: &'a str,
    tie_break: bool,
    prior_games: u64,
    iterations: u64,
    additional_games: u64,
    left_wins: u64,
    right_wins: u64,
}

impl<'a> From<&'a MatchRecord> for MatchRow<'a> {
    fn from(record: &'a MatchRecord) -> Self {
        let verdict = &record.verdict;
        Self {
            round: &record.round,
            group: &record.group,
            left: &verdict.id_a,
            right: &verdict.id_b,
            winner: verdict.winner_id().unwrap_or(""),
            tie_break: verdict.decided_by_tie_break(),
            prior_games: verdict.prior_games,
            iterations: verdict.iterations,
            additional_games: verdict.additional_trials,
            left_wins: verdict.wins_a,
            right_wins: verdict.wins_b,
        }
    }
}

pub fn write_matches(file_path: &Path, matches: &[MatchRecord]) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Could not create match file: {}", file_path.display()))?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(file);
    for record in matches {
        writer.serialize(MatchRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// One standings file per round group, a `final` table and `matches.tsv`.
pub fn write_tournament(out_dir: &Path, result: &TournamentResult) -> Result<()> {
    for round in &result.rounds {
        for (group, standings) in &round.groups {
            let path = out_dir.join(format!("{}_{}", round.name, group));
            debug!("Writing standings to {}", path.display());
            write_standings(&path, standings)?;
        }
    }
    write_standings(&out_dir.join("final"), &result.overall)?;
    write_matches(&out_dir.join("matches.tsv"), &result.matches)?;
    Ok(())
}
