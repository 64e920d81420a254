//! Integration tests for the warlight referee.
//!
//! Runs matches between real `sh` bot processes, both through the library
//! and by spawning the `warlight` binary.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use warlight::board::{parse_map, Settings};
use warlight::bot::{BotChannel, Player, Transport};
use warlight::protocol::V1Protocol;
use warlight::referee::{MatchOptions, MatchPhase, Referee};
use warlight::replay::MatchOutcome;

/// Four regions in a line, two bonuses.
const LINE_MAP: &str = r#"{
  "name": "Line",
  "territories": [
    {"id": 1, "name": "West", "connectedTo": [2]},
    {"id": 2, "name": "Midwest", "connectedTo": [1, 3]},
    {"id": 3, "name": "Mideast", "connectedTo": [2, 4]},
    {"id": 4, "name": "East", "connectedTo": [3]}
  ],
  "bonuses": [
    {"id": 1, "name": "Left", "value": 1, "territoryIDs": [1, 2]},
    {"id": 2, "name": "Right", "value": 1, "territoryIDs": [3, 4]}
  ]
}"#;

const FAST_SETTINGS: &str = r#"{
  "TerritoryLimit": 1,
  "DistributionMode": -3,
  "Wastelands": {"NumberOfWastelands": 0},
  "RoundsUntilDraw": 2,
  "MaxTimeBank": 300,
  "TimePerMove": 50
}"#;

/// Answers every request with "No moves".
const PASSIVE_BOT: &str =
    r#"while read line; do case "$line" in go*|pick_starting_region*) echo "No moves";; esac; done"#;

/// Reads everything and never answers.
const SILENT_BOT: &str = "exec cat > /dev/null";

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn run_referee(args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_warlight");
    Command::new(exe)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to start warlight")
}

fn shell_player(name: &str, script: &str, settings: &Settings) -> Player {
    let channel = BotChannel::from_shell(name, script).expect("sh should spawn");
    Player::new(name, Box::new(channel), settings)
}

#[test]
fn silent_process_is_skipped_and_match_finishes() {
    let settings = Settings::from_json_str(FAST_SETTINGS).unwrap();
    let map = parse_map(LINE_MAP).unwrap();
    let players = [
        shell_player("bot1", SILENT_BOT, &settings),
        shell_player("bot2", PASSIVE_BOT, &settings),
    ];
    let options = MatchOptions {
        map_seed: 7,
        game_seed: 7,
        parallel_requests: false,
    };
    let protocol = V1Protocol::new(&settings);
    let mut referee = Referee::new(map, settings, protocol, players, options).unwrap();

    let start = Instant::now();
    assert_eq!(referee.run(), MatchOutcome::Draw);
    assert_eq!(referee.phase(), MatchPhase::Done);
    assert!(start.elapsed() < Duration::from_secs(20));

    assert_eq!(referee.player(0).strikes(), 3);
    assert!(referee.player(0).is_skipped());
    assert_eq!(referee.player(1).strikes(), 0);
    assert!(referee
        .player(0)
        .communication_log()
        .iter()
        .any(|l| l.contains("<skipping player - too many errors>")));
}

#[test]
fn exited_process_does_not_stall_the_match() {
    let settings = Settings::from_json_str(FAST_SETTINGS).unwrap();
    let map = parse_map(LINE_MAP).unwrap();
    let players = [
        shell_player("bot1", "exit 0", &settings),
        shell_player("bot2", PASSIVE_BOT, &settings),
    ];
    let protocol = V1Protocol::new(&settings);
    let mut referee =
        Referee::new(map, settings, protocol, players, MatchOptions::default()).unwrap();

    let start = Instant::now();
    assert_eq!(referee.run(), MatchOutcome::Draw);
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(referee.player(0).strikes(), 3);
}

#[test]
fn channel_round_trip_with_real_process() {
    let mut channel = BotChannel::from_shell("echo", "while read line; do echo \"$line\"; done").unwrap();
    channel.send("bot1 place_armies 1 2");
    assert_eq!(channel.receive(Some(Duration::from_secs(5))), "bot1 place_armies 1 2");
    channel.shutdown();
}

#[test]
fn binary_plays_a_match_and_writes_replay() {
    let dir = tempfile::tempdir().unwrap();
    let map = write(dir.path(), "map.json", LINE_MAP);
    let settings = write(dir.path(), "settings.json", FAST_SETTINGS);
    let replay = dir.path().join("replay.json");
    let replay_arg = replay.to_string_lossy().into_owned();

    let output = run_referee(&[
        "--map",
        &map,
        "--settings",
        &settings,
        "--map-seed",
        "3",
        "--game-seed",
        "4",
        "--replay",
        &replay_arg,
        PASSIVE_BOT,
        PASSIVE_BOT,
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "draw");

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&replay).unwrap()).unwrap();
    assert_eq!(value["map"], "Line");
    assert_eq!(value["outcome"], "Draw");
    assert_eq!(value["rounds"].as_array().unwrap().len(), 2);
    assert_eq!(value["starting_regions"]["bot1"].as_array().unwrap().len(), 1);
}

#[test]
fn binary_runs_with_parallel_requests() {
    let dir = tempfile::tempdir().unwrap();
    let map = write(dir.path(), "map.json", LINE_MAP);
    let settings = write(dir.path(), "settings.json", FAST_SETTINGS);

    let output = run_referee(&[
        "--map",
        &map,
        "--settings",
        &settings,
        "--parallel",
        "--name1",
        "alpha",
        "--name2",
        "beta",
        PASSIVE_BOT,
        PASSIVE_BOT,
    ]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "draw");
}

#[test]
fn missing_map_fails() {
    let output = run_referee(&["--map", "/nonexistent/map.json", "true", "true"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading map"));
}

#[test]
fn legacy_protocol_rejects_unsupported_settings() {
    let dir = tempfile::tempdir().unwrap();
    let map = write(dir.path(), "map.json", LINE_MAP);

    // default wasteland size is 10, the legacy format only knows 6
    let output = run_referee(&[
        "--map",
        &map,
        "--protocol",
        "legacy",
        PASSIVE_BOT,
        PASSIVE_BOT,
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("WastelandSize"));
}

#[test]
fn reserved_player_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let map = write(dir.path(), "map.json", LINE_MAP);
    let settings = write(dir.path(), "settings.json", FAST_SETTINGS);

    let output = run_referee(&[
        "--map",
        &map,
        "--settings",
        &settings,
        "--name1",
        "neutral",
        PASSIVE_BOT,
        PASSIVE_BOT,
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid player name"));
}

#[test]
fn invalid_settings_fail() {
    let dir = tempfile::tempdir().unwrap();
    let map = write(dir.path(), "map.json", LINE_MAP);
    let settings = write(dir.path(), "settings.json", r#"{"LuckModifier": 2.5}"#);

    let output = run_referee(&[
        "--map",
        &map,
        "--settings",
        &settings,
        PASSIVE_BOT,
        PASSIVE_BOT,
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("LuckModifier"));
}
