// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Reference-query bridge command line
//!
//! Runs one SQL statement on a reference coordinator through the statement
//! protocol and prints the decoded result rows.

use clap::Parser;
use refq_client::SessionProperties;
use refq_common::Config;
use refq_plan::RowVector;
use refq_runner::ReferenceQueryRunner;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "conf/refq.toml")]
    config: PathBuf,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Coordinator URI, overrides the configuration file
    #[arg(long)]
    coordinator: Option<String>,

    /// User, overrides the configuration file
    #[arg(short, long)]
    user: Option<String>,

    /// Session property `name=value`, may be repeated
    #[arg(short, long = "session", value_parser = parse_session_property)]
    session: Vec<(String, String)>,

    /// SQL statement to run
    sql: String,
}

fn parse_session_property(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("expected name=value, got '{}'", text)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut config, found) = load_config(&args.config)?;
    init_logging(log_level(&args, &config))?;
    if !found {
        warn!("Config file not found: {:?}, using defaults", args.config);
    }

    info!("Version: {}", refq_common::version::VERSION);
    info!("Git Commit: {}", refq_common::version::GIT_COMMIT);
    info!("Build Time: {}", refq_common::version::BUILD_TIME);

    config.apply_env_overrides();
    if let Some(coordinator) = &args.coordinator {
        config.coordinator_uri = coordinator.clone();
    }
    if let Some(user) = &args.user {
        config.user = user.clone();
    }
    config.validate()?;
    info!("Coordinator: {}", config.coordinator_uri);

    let session: SessionProperties = args.session.iter().cloned().collect();
    let runner = ReferenceQueryRunner::new(&config)?;
    let results = runner.execute_sql_with_session(&args.sql, &session).await?;

    print_results(&results);
    Ok(())
}

/// Initialize logging
fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// The command line level wins over the configured one; `RUST_LOG` wins over both.
fn log_level<'a>(args: &'a Args, config: &'a Config) -> &'a str {
    args.log_level.as_deref().unwrap_or(&config.log_level)
}

/// Load configuration from file. Runs before logging is up, so a missing
/// file is reported through the returned flag.
fn load_config(config_path: &PathBuf) -> anyhow::Result<(Config, bool)> {
    if config_path.exists() {
        let config = Config::from_file(config_path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        Ok((config, true))
    } else {
        Ok((Config::default(), false))
    }
}

fn print_results(results: &[RowVector]) {
    let mut num_rows = 0;
    if let Some(first) = results.first() {
        println!("{}", first.row_type().names().join("\t"));
    }
    for batch in results {
        for row in batch.rows() {
            let cells: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
            println!("{}", cells.join("\t"));
        }
        num_rows += batch.num_rows();
    }
    println!("({} rows)", num_rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_property() {
        assert_eq!(
            parse_session_property("query_max_run_time=1m").unwrap(),
            ("query_max_run_time".to_string(), "1m".to_string())
        );
        assert_eq!(
            parse_session_property("hive.x = a=b").unwrap(),
            ("hive.x".to_string(), "a=b".to_string())
        );
        assert!(parse_session_property("no_value").is_err());
        assert!(parse_session_property("=1").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "refq",
            "--coordinator",
            "http://presto:8080",
            "-s",
            "a=1",
            "--session",
            "b=2",
            "SELECT 1",
        ])
        .unwrap();
        assert_eq!(args.coordinator.as_deref(), Some("http://presto:8080"));
        assert_eq!(args.session.len(), 2);
        assert_eq!(args.sql, "SELECT 1");
        assert_eq!(args.config, PathBuf::from("conf/refq.toml"));
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let config = Config {
            log_level: "debug".to_string(),
            ..Config::default()
        };

        let args = Args::try_parse_from(["refq", "SELECT 1"]).unwrap();
        assert_eq!(log_level(&args, &config), "debug");

        let args = Args::try_parse_from(["refq", "--log-level", "warn", "SELECT 1"]).unwrap();
        assert_eq!(log_level(&args, &config), "warn");
    }

    #[test]
    fn test_load_config_reads_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refq.toml");
        std::fs::write(&path, "log_level = \"trace\"\n").unwrap();

        let (config, found) = load_config(&path).unwrap();
        assert!(found);
        assert_eq!(config.log_level, "trace");

        let (config, found) = load_config(&dir.path().join("missing.toml")).unwrap();
        assert!(!found);
        assert_eq!(config.log_level, "info");
    }
}
