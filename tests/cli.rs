use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const CSV: &str = "\
Year,Avg_Temp (°C),Min_Temp (°C),Max_Temp (°C),Precipitation (mm),Humidity (%),Wind_Speed (m/s)
2000,14.0,2.0,30.0,100,60,10
2000,15.0,3.0,31.0,50,70,14
2001,16.0,4.0,32.0,200,65,12
";

fn fixture() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("climate.csv");
    fs::write(&path, CSV).unwrap();
    (dir, path)
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("climate-viz"));
}

#[test]
fn views_lists_the_slideshow() {
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("views");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1. Introduction"))
        .stdout(predicate::str::contains("3. Yearly Precipitation Trends [bar]"))
        .stdout(predicate::str::contains("4. Climate Factors: Humidity and Wind Speed [dual-bar]"));
}

#[test]
fn views_json_round_trips_through_render() {
    let (dir, data) = fixture();
    let out = Command::cargo_bin("climate-viz")
        .unwrap()
        .args(["views", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let views: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(views.as_array().unwrap().len(), 4);
    assert_eq!(views[2]["mark"]["kind"], "bar");

    let views_path = dir.path().join("views.json");
    fs::write(&views_path, &out.stdout).unwrap();
    let chart = dir.path().join("chart.svg");
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .arg("--views")
        .arg(&views_path)
        .args(["--view", "precipitation", "--out"])
        .arg(&chart);
    cmd.assert().success();
    assert!(fs::read_to_string(&chart).unwrap().contains("</svg>"));
}

#[test]
fn render_writes_svg_with_interaction_state() {
    let (dir, data) = fixture();
    let chart = dir.path().join("humidity.svg");
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--view", "4", "--hide", "Wind Speed", "--zoom", "2", "--pan", "-50,0"])
        .arg("--out")
        .arg(&chart);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("2 groups"));
    let svg = fs::read_to_string(&chart).unwrap();
    assert!(svg.contains("Humidity (%)"));
}

#[test]
fn render_prints_stats_as_json() {
    let (_dir, data) = fixture();
    let out = Command::cargo_bin("climate-viz")
        .unwrap()
        .arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--view", "precipitation", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stats[0]["metric"], "Precipitation (mm)");
    assert_eq!(stats[0]["count"], 3);
    assert_eq!(stats[0]["max"], 200.0);
}

#[test]
fn render_selects_a_metric() {
    let (_dir, data) = fixture();
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--view", "2", "--metric", "Minimum Temp", "--stats"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Min_Temp (°C)  count=3"));

    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--view", "2", "--metric", "Dew Point"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Dew Point"));
}

#[test]
fn render_fails_cleanly_on_missing_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(dir.path().join("nope.csv"))
        .args(["--view", "1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("could not load data"));
}

#[test]
fn render_rejects_size_below_margins() {
    let (dir, data) = fixture();
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--view", "1", "--width", "90", "--out"])
        .arg(dir.path().join("tiny.svg"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no plot area"));
    assert!(!dir.path().join("tiny.svg").exists());
}

#[test]
fn unknown_view_is_rejected() {
    let (_dir, data) = fixture();
    let mut cmd = Command::cargo_bin("climate-viz").unwrap();
    cmd.arg("render").arg("--data").arg(&data).args(["--view", "9"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}
