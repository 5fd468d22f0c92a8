//! Line-editing prompt. Each line is parsed as one subcommand.

use crate::commands::{self, Command};
use anyhow::{Result, bail};
use clap::Parser;
use mesadb::Client;
use rustyline::{DefaultEditor, error::ReadlineError};

const PROMPT: &str = "mesadb> ";

#[derive(Debug, Parser)]
#[command(name = "mesadb", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

pub async fn run(client: &Client) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("mesadb {} shell; `help` lists commands, ctrl-d exits", mesadb::VERSION);

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;
        if matches!(line, "exit" | "quit") {
            break;
        }
        if line == "debug" {
            let store = client.store();
            store.set_debug(!store.is_debug());
            println!("debug {}", if store.is_debug() { "on" } else { "off" });
            continue;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // help and usage errors print themselves
                let _ = err.print();
                continue;
            }
        };

        match commands::run(client, command).await {
            Ok(output) => println!("{}", output.text),
            Err(err) => eprintln!("error: {err:#}"),
        }
    }

    Ok(())
}

/// Split on whitespace, honouring single and double quotes so JSON
/// arguments can contain spaces.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        bail!("unterminated {q} quote");
    }
    if in_word {
        words.push(current);
    }

    Ok(words)
}
