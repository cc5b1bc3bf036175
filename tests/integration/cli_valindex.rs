#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn token_file(lines: &[&str]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("tokens.txt");
    fs::write(&path, lines.join("\n")).expect("write tokens");
    (dir, path)
}

fn stdout_of(args: &[&str], tokens: &PathBuf) -> String {
    let output = cargo_bin_cmd!("valindex")
        .arg(tokens)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn prefix_lists_matching_tokens_in_order() {
    let (_dir, tokens) = token_file(&["b", "abd", "ab", "abc", "ab"]);
    let out = stdout_of(&["prefix", "ab"], &tokens);
    let lines: Vec<&str> = out.lines().collect();
    // token, occurrences, line of first occurrence
    assert_eq!(lines, vec!["ab\t2\t3", "abc\t1\t4", "abd\t1\t2"]);
}

#[test]
fn lookup_reports_hits_and_misses_as_json() {
    let (_dir, tokens) = token_file(&["alpha", "beta", "alpha"]);
    let out = stdout_of(&["--format", "json", "lookup", "alpha", "gamma"], &tokens);
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json[0]["token"], "alpha");
    assert_eq!(json[0]["found"], true);
    assert_eq!(json[0]["size"], 2);
    assert_eq!(json[0]["pointer"], 1);
    assert_eq!(json[1]["found"], false);
}

#[test]
fn lookup_can_list_the_cache() {
    let (_dir, tokens) = token_file(&["alpha", "beta", "gamma"]);
    let out = stdout_of(&["lookup", "beta", "delta", "alpha", "--cached"], &tokens);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "beta\t1\t2",
            "delta\t-",
            "alpha\t1\t1",
            "cached\talpha\t1\t1",
            "cached\tbeta\t1\t2",
        ]
    );

    let out = stdout_of(&["--format", "json", "lookup", "gamma", "--cached"], &tokens);
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["rows"][0]["pointer"], 3);
    assert_eq!(json["cached"][0]["token"], "gamma");
}

#[test]
fn descending_range_honours_limit() {
    let (_dir, tokens) = token_file(&["a", "b", "c", "d", "e"]);
    let out = stdout_of(&["range", "d", "--desc", "--limit", "2"], &tokens);
    let keys: Vec<&str> = out
        .lines()
        .map(|line| line.split('\t').next().unwrap_or_default())
        .collect();
    assert_eq!(keys, vec!["d", "c"]);
}

#[test]
fn stats_emits_json() {
    let (_dir, tokens) = token_file(&["x", "y", "z", "x"]);
    let out = stdout_of(&["--format", "json", "--kind", "attribute", "stats"], &tokens);
    let json: Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["entries"], 3);
    assert!(json["height"].is_number());
    assert!(json["cache"]["hits"].is_number());
}

#[test]
fn invalid_config_fails() {
    let (dir, tokens) = token_file(&["x"]);
    let config = dir.path().join("valindex.toml");
    fs::write(&config, "cache_capacity = 0\n").expect("write config");
    cargo_bin_cmd!("valindex")
        .arg(&tokens)
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .failure();
}
