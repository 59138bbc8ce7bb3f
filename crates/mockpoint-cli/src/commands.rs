//! Subcommands: each one loads the store, runs one repository operation and
//! saves the result back when something changed.

use anyhow::{Context, Result};
use clap::Subcommand;
use mockpoint::capture::{rule_for, RuleStrategy};
use mockpoint::config::MockpointConfig;
use mockpoint::{
    EntryId, Interception, Interceptor, Matcher, MockEntry, MockRepository, MockRule, Protocol,
    RequestTarget,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the rule set in priority order
    List {
        /// Print the persisted JSON records instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a rule from explicit fields (an invalid port falls back to the default)
    Add {
        #[arg(value_parser = parse_protocol)]
        protocol: Protocol,
        host: String,
        /// Path, optionally with a query string
        path: String,
        #[arg(short, long, default_value = "")]
        port: String,
    },
    /// Add a rule from a URL
    AddUrl {
        url: String,
        /// Ignore the query string when matching
        #[arg(long)]
        without_query: bool,
        /// File holding the raw HTTP response to serve
        #[arg(short, long)]
        response: Option<PathBuf>,
    },
    /// Remove the entry at a position
    Remove { index: usize },
    /// Copy the entry at a position to just below it
    Duplicate { index: usize },
    /// Move rows FROM..=TO so that row FROM lands at DEST
    Move { from: usize, to: usize, dest: usize },
    /// Move the entry at a position one row up
    Up { index: usize },
    /// Move the entry at a position one row down
    Down { index: usize },
    /// Enable the entry with an id
    Enable { id: u64 },
    /// Disable the entry with an id
    Disable { id: u64 },
    /// Attach a raw HTTP response read from a file
    SetResponse { id: u64, file: PathBuf },
    /// Remove the stored response of an entry
    ClearResponse { id: u64 },
    /// Report whether a request URL would be mocked
    Decide { url: String },
}

fn parse_protocol(raw: &str) -> std::result::Result<Protocol, String> {
    Protocol::from_scheme(raw)
}

pub fn run(command: &Command, config: &MockpointConfig, out: &mut impl Write) -> Result<()> {
    let store = config.store_path.as_path();
    let repo = load(store)?;

    let changed = match command {
        Command::List { json } => {
            if *json {
                out.write_all(&repo.serialize()?)?;
                writeln!(out)?;
            } else {
                print_table(&repo, out)?;
            }
            false
        }
        Command::Add {
            protocol,
            host,
            path,
            port,
        } => {
            let rule = MockRule::from_fields(*protocol, host, port, path);
            let id = repo.add(MockEntry::new(rule, None));
            writeln!(out, "{GREEN}Added{RESET} entry {id}")?;
            true
        }
        Command::AddUrl {
            url,
            without_query,
            response,
        } => {
            let strategy = if *without_query {
                RuleStrategy::WithoutQuery
            } else {
                RuleStrategy::FullUrl
            };
            let rule = rule_for(url, strategy)?;
            let body = match response {
                Some(file) => Some(read_response(file)?),
                None => None,
            };
            let id = repo.add(MockEntry::new(rule, body.map(Into::into)));
            writeln!(out, "{GREEN}Added{RESET} entry {id}")?;
            true
        }
        Command::Remove { index } => {
            let removed = repo.remove_at(*index)?;
            writeln!(out, "Removed entry {}", removed.id())?;
            true
        }
        Command::Duplicate { index } => {
            let id = repo.duplicate(*index)?;
            writeln!(out, "Duplicated as entry {id} at {}", index + 1)?;
            true
        }
        Command::Move { from, to, dest } => {
            repo.move_range(*from, *to, *dest)?;
            writeln!(out, "Moved {from}..={to} to {dest}")?;
            true
        }
        Command::Up { index } => {
            let now = repo.move_up(*index)?;
            writeln!(out, "Moved to {now}")?;
            true
        }
        Command::Down { index } => {
            let now = repo.move_down(*index)?;
            writeln!(out, "Moved to {now}")?;
            true
        }
        Command::Enable { id } => {
            repo.set_enabled(EntryId::new(*id), true)?;
            true
        }
        Command::Disable { id } => {
            repo.set_enabled(EntryId::new(*id), false)?;
            true
        }
        Command::SetResponse { id, file } => {
            let body = read_response(file)?;
            repo.set_response(EntryId::new(*id), Some(body.into()))?;
            true
        }
        Command::ClearResponse { id } => {
            repo.set_response(EntryId::new(*id), None)?;
            true
        }
        Command::Decide { url } => {
            decide(repo, url, config, out)?;
            return Ok(());
        }
    };

    if changed {
        repo.save_to_file(store)
            .with_context(|| format!("Failed to save {}", store.display()))?;
    }
    Ok(())
}

fn load(store: &Path) -> Result<MockRepository> {
    let report = MockRepository::load_from_file(store)
        .with_context(|| format!("Failed to load {}", store.display()))?;
    for dropped in &report.dropped {
        warn!(
            "Skipped record {} of {}: {}",
            dropped.position,
            store.display(),
            dropped.reason
        );
    }
    Ok(report.repository)
}

fn read_response(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("Failed to read response file {}", file.display()))
}

fn print_table(repo: &MockRepository, out: &mut impl Write) -> Result<()> {
    let snapshot = repo.snapshot();
    if snapshot.is_empty() {
        writeln!(out, "{YELLOW}No mock entries{RESET}")?;
        return Ok(());
    }
    writeln!(out, "{DIM}#    id     on   rule{RESET}")?;
    for (index, entry) in snapshot.iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<6} {:<4} {}",
            index,
            entry.id(),
            if entry.is_enabled() { "yes" } else { "no" },
            entry.rule()
        )?;
    }
    Ok(())
}

fn decide(
    repo: MockRepository,
    url: &str,
    config: &MockpointConfig,
    out: &mut impl Write,
) -> Result<()> {
    let request = RequestTarget::from_url(url)?;
    let interceptor = Interceptor::new(Matcher::new(Arc::new(repo)), config.empty_response);

    if let Some(decision) = interceptor.matcher().decide(&request) {
        writeln!(
            out,
            "Matched entry {} at {}: {}",
            decision.entry_id(),
            decision.position(),
            decision.entry().rule()
        )?;
    }

    match interceptor.intercept(&request) {
        Interception::Mock(body) => writeln!(out, "{GREEN}MOCK{RESET} {} bytes", body.len())?,
        Interception::Forward => writeln!(out, "{YELLOW}FORWARD{RESET}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockpoint::EmptyResponsePolicy;
    use tempfile::TempDir;

    fn setup() -> (TempDir, MockpointConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = MockpointConfig {
            store_path: dir.path().join("mocks.json"),
            ..Default::default()
        };
        (dir, config)
    }

    fn exec(command: Command, config: &MockpointConfig) -> String {
        let mut out = Vec::new();
        run(&command, config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn stored_ids(config: &MockpointConfig) -> Vec<EntryId> {
        MockRepository::load_from_file(&config.store_path)
            .unwrap()
            .repository
            .snapshot()
            .ids()
    }

    #[test]
    fn test_add_url_then_decide() {
        let (dir, config) = setup();
        let response = dir.path().join("resp.http");
        std::fs::write(&response, b"HTTP/1.1 200 OK\r\n\r\nok").unwrap();

        let output = exec(
            Command::AddUrl {
                url: "http://example.com/a?x=1".to_string(),
                without_query: true,
                response: Some(response),
            },
            &config,
        );
        assert!(output.contains("Added"));

        let output = exec(
            Command::Decide {
                url: "http://example.com/a?x=2".to_string(),
            },
            &config,
        );
        assert!(output.contains("Matched entry 1 at 0"));
        assert!(output.contains("MOCK"));

        let output = exec(
            Command::Decide {
                url: "http://example.com/b".to_string(),
            },
            &config,
        );
        assert!(output.contains("FORWARD"));
    }

    #[test]
    fn test_entry_without_response_forwards_unless_configured() {
        let (_dir, mut config) = setup();
        exec(
            Command::Add {
                protocol: Protocol::Http,
                host: "example.com".to_string(),
                path: "/a".to_string(),
                port: "not-a-port".to_string(),
            },
            &config,
        );

        let decide = || Command::Decide {
            url: "http://example.com/a".to_string(),
        };
        assert!(exec(decide(), &config).contains("FORWARD"));

        config.empty_response = EmptyResponsePolicy::ServeEmpty;
        assert!(exec(decide(), &config).contains("MOCK"));
    }

    #[test]
    fn test_reorder_and_duplicate_persist() {
        let (_dir, config) = setup();
        for path in ["/a", "/b", "/c"] {
            exec(
                Command::AddUrl {
                    url: format!("http://example.com{path}"),
                    without_query: false,
                    response: None,
                },
                &config,
            );
        }

        let moved = exec(Command::Move { from: 2, to: 2, dest: 0 }, &config);
        assert!(moved.contains("Moved 2..=2 to 0"));
        assert_eq!(
            stored_ids(&config),
            vec![EntryId::new(3), EntryId::new(1), EntryId::new(2)]
        );

        exec(Command::Duplicate { index: 0 }, &config);
        assert_eq!(
            stored_ids(&config),
            vec![EntryId::new(3), EntryId::new(4), EntryId::new(1), EntryId::new(2)]
        );

        assert!(exec(Command::Down { index: 1 }, &config).contains("Moved to 2"));
        assert_eq!(
            stored_ids(&config),
            vec![EntryId::new(3), EntryId::new(1), EntryId::new(4), EntryId::new(2)]
        );
    }

    #[test]
    fn test_errors_leave_store_untouched() {
        let (_dir, config) = setup();
        exec(
            Command::AddUrl {
                url: "https://example.com/".to_string(),
                without_query: false,
                response: None,
            },
            &config,
        );
        let before = std::fs::read(&config.store_path).unwrap();

        let mut out = Vec::new();
        assert!(run(&Command::Remove { index: 4 }, &config, &mut out).is_err());
        assert!(run(&Command::Enable { id: 99 }, &config, &mut out).is_err());
        assert!(run(&Command::Move { from: 0, to: 0, dest: 3 }, &config, &mut out).is_err());
        assert!(run(
            &Command::AddUrl {
                url: "not a url".to_string(),
                without_query: false,
                response: None,
            },
            &config,
            &mut out
        )
        .is_err());

        assert_eq!(std::fs::read(&config.store_path).unwrap(), before);
    }

    #[test]
    fn test_list_json_and_table() {
        let (_dir, config) = setup();
        assert!(exec(Command::List { json: false }, &config).contains("No mock entries"));

        exec(
            Command::AddUrl {
                url: "https://example.com:8443/x".to_string(),
                without_query: false,
                response: None,
            },
            &config,
        );
        exec(Command::Disable { id: 1 }, &config);

        let table = exec(Command::List { json: false }, &config);
        assert!(table.contains("https://example.com:8443/x"));
        assert!(table.contains("no"));

        let json: serde_json::Value =
            serde_json::from_str(&exec(Command::List { json: true }, &config)).unwrap();
        assert_eq!(json[0]["port"], 8443);
        assert_eq!(json[0]["enabled"], false);
    }
}
