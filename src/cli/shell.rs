use std::io::{BufRead, IsTerminal};

use clap::{CommandFactory, Parser};
use dialoguer::Input;
use tracing::debug;

use crate::cli::{execute, Cli, Commands, Session};
use crate::error::Result;

const PROMPT: &str = "rup";

/// Split a command line into words. Single and double quotes group words.
pub fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
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
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Next command line, `None` at end of input. A terminal gets a dialoguer
/// prompt; piped input is read line by line without one.
fn read_command(interactive: bool) -> Result<Option<String>> {
    if interactive {
        return Ok(Input::<String>::new()
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()
            .ok());
    }
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Read commands from stdin until EOF or `exit`. Data loaded by one command
/// is reused by the next through the session cache.
pub fn run(session: &mut Session) -> Result<String> {
    let interactive = std::io::stdin().is_terminal();
    while let Some(line) = read_command(interactive)? {
        let words = match split_words(line.trim()) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            Some("help") => {
                println!("{}", Cli::command().render_help());
                continue;
            }
            _ => {}
        }

        let cli = match Cli::try_parse_from(std::iter::once("rupscope".to_string()).chain(words)) {
            Ok(cli) => cli,
            Err(e) => {
                eprintln!("{}", e.render());
                continue;
            }
        };
        if let Some(db) = cli.db {
            session.db = db.into();
        }
        if matches!(cli.command, Commands::Shell) {
            eprintln!("Already in a shell.");
            continue;
        }
        match execute(session, cli.command) {
            Ok(out) if !out.is_empty() => println!("{out}"),
            Ok(_) => {}
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    debug!(loads = session.loads(), "Shell closed");
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_words("top --by province  --limit 3").unwrap(),
            vec!["top", "--by", "province", "--limit", "3"]
        );
    }

    #[test]
    fn test_split_quoted_words() {
        assert_eq!(
            split_words(r#"drill sub-unit "Dinas Kominfo" --province 'DKI Jakarta'"#).unwrap(),
            vec!["drill", "sub-unit", "Dinas Kominfo", "--province", "DKI Jakarta"]
        );
        assert_eq!(split_words(r#"classify """#).unwrap(), vec!["classify", ""]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert!(split_words("classify \"Internet").is_err());
    }
}
