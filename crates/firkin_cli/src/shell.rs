//! The interactive command loop.
//!
//! Engine errors are reported as plain text and the loop continues; only
//! stdin/stdout failures terminate the shell.

use firkin_core::Engine;
use std::io::{self, BufRead, Write};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PUT <key> <value>` — the value is the remainder of the line.
    Put {
        /// Key to write.
        key: String,
        /// Value to write.
        value: String,
    },
    /// `GET <key>`.
    Get {
        /// Key to look up.
        key: String,
    },
    /// `COMPACT`.
    Compact,
    /// `HELP`.
    Help,
    /// `EXIT` or `QUIT`.
    Exit,
}

impl Command {
    /// Parses one input line. Command words are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns the message to show the user (usage hint or unknown-command
    /// notice) when the line does not parse.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim_start()),
            None => (line, ""),
        };

        match word.to_ascii_uppercase().as_str() {
            "PUT" => {
                let Some((key, value)) = rest.split_once(char::is_whitespace) else {
                    return Err("Usage: PUT <key> <value>".to_string());
                };
                Ok(Self::Put {
                    key: key.to_string(),
                    value: value.trim_start().to_string(),
                })
            }
            "GET" => {
                if rest.is_empty() {
                    return Err("Usage: GET <key>".to_string());
                }
                Ok(Self::Get {
                    key: rest.to_string(),
                })
            }
            "COMPACT" => Ok(Self::Compact),
            "HELP" => Ok(Self::Help),
            "EXIT" | "QUIT" => Ok(Self::Exit),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

/// Runs the command loop until `EXIT`, `QUIT`, or end of input.
///
/// # Errors
///
/// Returns an error only if stdin or stdout itself fails.
pub fn run(engine: &Engine) -> io::Result<()> {
    print_help();

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // end of input
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            Command::Put { key, value } => {
                match engine.put(key.as_bytes(), value.as_bytes()) {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("error: {e}"),
                }
            }
            Command::Get { key } => match engine.get(key.as_bytes()) {
                Ok(Some(value)) => println!("{}", String::from_utf8_lossy(&value)),
                Ok(None) => println!("(nil)"),
                Err(e) => println!("error: {e}"),
            },
            Command::Compact => match engine.compact() {
                Ok(stats) => println!(
                    "Compaction completed: {} records migrated, {} bytes reclaimed",
                    stats.migrated_records,
                    stats.bytes_reclaimed()
                ),
                Err(e) => println!("error: {e}"),
            },
            Command::Help => print_help(),
            Command::Exit => {
                println!("Shutting down.");
                break;
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  PUT <key> <value>");
    println!("  GET <key>");
    println!("  COMPACT");
    println!("  HELP");
    println!("  EXIT | QUIT");
}
