use crate::observation::{MatchScore, Observation, ObservationSource};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

/// How to launch the match simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub program: PathBuf,
    /// Arguments placed before the server options.
    pub program_args: Vec<String>,
    pub log_dir: PathBuf,
    /// Run the server in synchronous mode.
    pub fast_mode: bool,
    /// Drawn matches replayed per trial before giving up.
    pub max_replays: u32,
}

impl SimulatorConfig {
    pub fn new(program: &str, log_dir: &Path) -> Self {
        Self {
            program: PathBuf::from(program),
            program_args: Vec::new(),
            log_dir: log_dir.to_path_buf(),
            fast_mode: true,
            max_replays: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub script: String,
}

impl Team {
    pub fn new(name: &str, script: &str) -> Self {
        Self {
            name: name.to_string(),
            script: script.to_string(),
        }
    }
}

/// Final score recovered from a game log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogScore {
    pub left_name: String,
    pub left_goals: u64,
    pub right_name: String,
    pub right_goals: u64,
}

pub fn server_args(left_script: &str, right_script: &str, log_dir: &Path, fast_mode: bool) -> Vec<String> {
    let log_dir = log_dir.display();
    vec![
        "server::auto_mode=1".to_string(),
        format!("server::synch_mode={}", fast_mode),
        format!("server::team_l_start={}", left_script),
        format!("server::team_r_start={}", right_script),
        "server::kick_off_wait=50".to_string(),
        "server::half_time=300".to_string(),
        "server::nr_normal_halfs=1".to_string(),
        "server::nr_extra_halfs=0".to_string(),
        "server::penalty_shoot_outs=0".to_string(),
        "server::game_logging=1".to_string(),
        "server::text_logging=0".to_string(),
        "server::log_date_format=%Y%m%d%H%M%S-".to_string(),
        format!("server::game_log_dir={}", log_dir),
        format!("server::text_log_dir={}", log_dir),
    ]
}

fn log_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d{14}-)?(?P<left>.+)_(?P<lgoals>\d+)-vs-(?P<right>.+)_(?P<rgoals>\d+)\.rcg$")
            .expect("log name pattern is valid")
    })
}

/// Parses `<date>-<left>_<goals>-vs-<right>_<goals>.rcg`.
pub fn parse_log_name(file_name: &str) -> Result<LogScore> {
    let caps = log_name_regex()
        .captures(file_name)
        .ok_or_else(|| anyhow!("Not a game log name: {}", file_name))?;
    let goals = |group: &str| {
        atoi::atoi::<u64>(caps[group].as_bytes())
            .ok_or_else(|| anyhow!("Invalid goal count in log name: {}", file_name))
    };
    Ok(LogScore {
        left_name: caps["left"].to_string(),
        left_goals: goals("lgoals")?,
        right_name: caps["right"].to_string(),
        right_goals: goals("rgoals")?,
    })
}

fn game_logs(log_dir: &Path) -> Result<HashSet<PathBuf>> {
    let mut logs = HashSet::new();
    if !log_dir.exists() {
        return Ok(logs);
    }
    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("Could not read log directory: {}", log_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "rcg") {
            logs.insert(path);
        }
    }
    Ok(logs)
}

/// Newest game log in `log_dir` that is not in `known`.
pub fn newest_log(log_dir: &Path, known: &HashSet<PathBuf>) -> Result<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for path in game_logs(log_dir)?.difference(known) {
        let modified = fs::metadata(path)?.modified()?;
        let is_newer = match &newest {
            Some((time, current)) => (modified, path) > (*time, current),
            None => true,
        };
        if is_newer {
            newest = Some((modified, path.clone()));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| anyhow!("Simulator wrote no game log to {}", log_dir.display()))
}

/// Plays one match and reads its score back from the game log.
pub fn play_match(config: &SimulatorConfig, left: &Team, right: &Team) -> Result<LogScore> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Could not create log directory: {}", config.log_dir.display()))?;
    let known = game_logs(&config.log_dir)?;

    debug!("Launching {} for {} vs {}", config.program.display(), left.name, right.name);
    let status = Command::new(&config.program)
        .args(&config.program_args)
        .args(server_args(&left.script, &right.script, &config.log_dir, config.fast_mode))
        .status()
        .with_context(|| format!("Could not launch simulator: {}", config.program.display()))?;
    if !status.success() {
        bail!("Simulator exited with {}", status);
    }

    let log = newest_log(&config.log_dir, &known)?;
    let file_name = log
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Invalid log file name: {}", log.display()))?;
    let score = parse_log_name(file_name)?;
    info!(
        "{} {} - {} {}",
        score.left_name, score.left_goals, score.right_goals, score.right_name
    );
    Ok(score)
}

/// Observation source backed by the external simulator. The left team is
/// competitor A.
pub struct SimulatorSource {
    config: SimulatorConfig,
    left: Team,
    right: Team,
}

impl SimulatorSource {
    pub fn new(config: SimulatorConfig, left: Team, right: Team) -> Self {
        Self { config, left, right }
    }

    fn decisive_match(&self) -> Result<bool> {
        for replay in 0..=self.config.max_replays {
            let score = play_match(&self.config, &self.left, &self.right)?;
            if score.left_goals != score.right_goals {
                return Ok(score.left_goals > score.right_goals);
            }
            warn!(
                "Draw between {} and {} ({} of {} replays used)",
                self.left.name, self.right.name, replay, self.config.max_replays
            );
        }
        bail!(
            "No decisive match between {} and {} after {} replays",
            self.left.name,
            self.right.name,
            self.config.max_replays
        )
    }
}

impl ObservationSource for SimulatorSource {
    fn generate(&mut self, batch_size: u64) -> Result<Observation> {
        let mut wins_left = 0;
        for _ in 0..batch_size {
            if self.decisive_match()? {
                wins_left += 1;
            }
        }
        Observation::new(batch_size, wins_left)
    }

    fn tie_break(&mut self) -> Result<MatchScore> {
        let score = play_match(&self.config, &self.left, &self.right)?;
        Ok(MatchScore {
            a: score.left_goals,
            b: score.right_goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_log_name() {
        let score = parse_log_name("20160701153012-HELIOS2016_3-vs-Gliders2016_1.rcg").unwrap();
        assert_eq!(score.left_name, "HELIOS2016");
        assert_eq!(score.left_goals, 3);
        assert_eq!(score.right_name, "Gliders2016");
        assert_eq!(score.right_goals, 1);
    }

    #[test]
    fn test_parse_log_name_with_underscores() {
        let score = parse_log_name("20160701153012-agent2d_base_0-vs-helios_team_12.rcg").unwrap();
        assert_eq!(score.left_name, "agent2d_base");
        assert_eq!(score.right_name, "helios_team");
        assert_eq!(score.right_goals, 12);
    }

    #[test]
    fn test_parse_log_name_errors() {
        for name in ["incomplete.rcg", "A_1-vs-B_x.rcg", "A_1-vs-B_2.rcl", "A_99999999999999999999999-vs-B_1.rcg"] {
            assert!(parse_log_name(name).is_err(), "{} should not parse", name);
        }
    }

    #[test]
    fn test_server_args() {
        let args = server_args("/teams/a/start.sh", "/teams/b/start.sh", Path::new("logs"), true);
        assert!(args.contains(&"server::synch_mode=true".to_string()));
        assert!(args.contains(&"server::team_l_start=/teams/a/start.sh".to_string()));
        assert!(args.contains(&"server::team_r_start=/teams/b/start.sh".to_string()));
        assert!(args.contains(&"server::game_log_dir=logs".to_string()));
        let slow = server_args("a", "b", Path::new("logs"), false);
        assert!(slow.contains(&"server::synch_mode=false".to_string()));
    }

    #[test]
    fn test_newest_log_ignores_known_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("00000000000001-A_1-vs-B_0.rcg"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let known = game_logs(dir.path()).unwrap();
        assert_eq!(known.len(), 1);
        assert!(newest_log(dir.path(), &known).is_err());

        fs::write(dir.path().join("00000000000002-A_0-vs-B_2.rcg"), "").unwrap();
        let newest = newest_log(dir.path(), &known).unwrap();
        assert!(newest.ends_with("00000000000002-A_0-vs-B_2.rcg"));
    }

    /// Fake simulator: the first match in an empty log directory is a 1-1
    /// draw, every later one a 2-1 win for the left team.
    #[cfg(unix)]
    fn fake_simulator(dir: &Path) -> SimulatorConfig {
        let script = dir.join("fake_server.sh");
        fs::write(
            &script,
            r#"for arg in "$@"; do
  case "$arg" in
    server::game_log_dir=*) dir="${arg#server::game_log_dir=}" ;;
  esac
done
n=$(ls "$dir" | wc -l)
if [ "$n" -eq 0 ]; then l=1; else l=2; fi
touch "$dir/$(printf '%014d' "$n")-Left_${l}-vs-Right_1.rcg"
"#,
        )
        .unwrap();
        let mut config = SimulatorConfig::new("sh", &dir.join("logs"));
        config.program_args = vec![script.display().to_string()];
        config
    }

    #[cfg(unix)]
    #[test]
    fn test_simulator_source_replays_draws() {
        let dir = TempDir::new().unwrap();
        let config = fake_simulator(dir.path());
        let mut source = SimulatorSource::new(config, Team::new("Left", "l.sh"), Team::new("Right", "r.sh"));
        let observation = source.generate(2).unwrap();
        assert_eq!(observation, Observation { trials: 2, wins_a: 2, wins_b: 0 });
        assert_eq!(game_logs(&dir.path().join("logs")).unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_simulator_tie_break_keeps_draws() {
        let dir = TempDir::new().unwrap();
        let config = fake_simulator(dir.path());
        let mut source = SimulatorSource::new(config, Team::new("Left", "l.sh"), Team::new("Right", "r.sh"));
        assert_eq!(source.tie_break().unwrap(), MatchScore { a: 1, b: 1 });
    }

    #[cfg(unix)]
    #[test]
    fn test_simulator_gives_up_after_replays() {
        let dir = TempDir::new().unwrap();
        let mut config = fake_simulator(dir.path());
        config.max_replays = 0;
        let mut source = SimulatorSource::new(config, Team::new("Left", "l.sh"), Team::new("Right", "r.sh"));
        assert!(source.generate(1).is_err());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = SimulatorConfig::new("/nonexistent/rcssserver", dir.path());
        let result = play_match(&config, &Team::new("A", "a"), &Team::new("B", "b"));
        assert!(result.is_err());
    }
}
