//! # ShoalKV binary
//!
//! Two modes over the same store:
//!
//! - `shoalkv` (default): an interactive shell against an embedded store.
//! - `shoalkv serve`: the TCP ingress, serving until interrupted.
//!
//! ## Shell commands
//!
//! ```text
//! PUT key v1,v2      Store a key (fragments are comma-separated)
//! GET key [key ...]  Look up keys (prints fragments or "(nil)")
//! SEAL               Seal the active table and open a fresh one
//! COMPACT            Merge the three oldest sealed tables
//! STATS              Print the table list
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! Configuration comes from a JSON file (`--config`, default
//! `config.json`); a missing file falls back to defaults. `--data-dir`
//! overrides the sstable directory either way.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use store::{Config, GetRequest, PutEntry, PutRequest, Server, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// ShoalKV
#[derive(Parser, Debug)]
#[command(name = "shoalkv")]
#[command(about = "Layered key-value store over bloom-filtered sstables")]
#[command(version)]
struct Args {
    /// JSON config file; defaults apply if it does not exist
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override the sstable directory from the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the TCP ingress until interrupted
    Serve,
    /// Interactive shell against an embedded store (default)
    Shell,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("failed to load config: {e:#}");
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!(path = %args.config.display(), "config file not found, using defaults");
        Config::default()
    };
    if let Some(dir) = args.data_dir {
        config.sstable_directory = dir;
    }

    let result = match args.command.unwrap_or(Command::Shell) {
        Command::Serve => serve(config),
        Command::Shell => shell(config),
    };
    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn serve(config: Config) -> Result<()> {
    let store = Store::open(&config)?;
    let server = Server::bind(config, store.router())?;
    server.run()?;
    store.close();
    Ok(())
}

fn shell(config: Config) -> Result<()> {
    let store = Store::open(&config)?;
    let router = store.router();

    println!(
        "ShoalKV shell (dir={}, max_keys={}, compaction_threshold={})",
        config.sstable_directory.display(),
        config.max_keys_per_sstable,
        config.compaction_threshold
    );
    println!("Commands: PUT key v1,v2 | GET key [key ...] | SEAL | COMPACT | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        };

        match command.to_uppercase().as_str() {
            "PUT" => {
                let Some(key) = parts.next() else {
                    println!("ERR usage: PUT key v1,v2");
                    prompt();
                    continue;
                };
                let raw = parts.collect::<Vec<&str>>().join(" ");
                if raw.is_empty() {
                    println!("ERR usage: PUT key v1,v2");
                    prompt();
                    continue;
                }
                let request = PutRequest {
                    new_keys: vec![PutEntry {
                        key: key.to_string(),
                        value: raw.split(',').map(str::to_string).collect(),
                    }],
                };
                match router.put(request) {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR put failed: {e:#}"),
                }
            }
            "GET" => {
                let keys: Vec<String> = parts.map(str::to_string).collect();
                if keys.is_empty() {
                    println!("ERR usage: GET key [key ...]");
                    prompt();
                    continue;
                }
                match router.get(&GetRequest { keys: keys.clone() }) {
                    Ok(response) => {
                        for (key, fragments) in keys.iter().zip(response.value) {
                            if fragments.is_empty() {
                                println!("{key} -> (nil)");
                            } else {
                                println!("{key} -> {}", fragments.join(","));
                            }
                        }
                    }
                    Err(e) => println!("ERR get failed: {e:#}"),
                }
            }
            "SEAL" => match store.roll() {
                Ok(()) => println!("OK"),
                Err(e) => println!("ERR seal failed: {e:#}"),
            },
            "COMPACT" => match store.compact() {
                Ok(()) => println!("OK"),
                Err(e) => println!("ERR compact failed: {e:#}"),
            },
            "STATS" => match store.stats() {
                Ok(stats) => {
                    for table in &stats.tables {
                        println!(
                            "{}  {:?}  keys={}",
                            table.name, table.state, table.key_count
                        );
                    }
                    println!("({} tables, {} keys)", stats.tables.len(), stats.total_keys());
                }
                Err(e) => println!("ERR stats failed: {e:#}"),
            },
            "EXIT" | "QUIT" => {
                println!("bye");
                break;
            }
            other => println!("ERR unknown command {other:?}"),
        }
        prompt();
    }

    store.close();
    Ok(())
}

fn prompt() {
    print!("> ");
    io::stdout().flush().ok();
}
