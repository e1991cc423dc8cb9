//! Interactive loop over stdin.

use std::io::Write as _;
use std::sync::Arc;

use byedb_ai::{BackendPool, TurnReport};
use byedb_common::{Mode, UserId};
use byedb_session::QueryService;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Memory,
    Clear,
    SetMode(Mode),
    Tables,
    Stats,
    Help,
    Question(String),
    Empty,
}

pub const HELP: &str = "Commands:
  /agent    let the model run SQL (writes need approval)
  /ask      explain only, never run SQL
  /tables   list tables in your database
  /memory   show remembered conversations
  /clear    forget conversations and any pending operation
  /stats    backend load and token usage
  /quit     exit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(name) = line.strip_prefix('/') else {
        return Ok(Command::Question(line.to_string()));
    };
    match name.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Ok(Command::Quit),
        "memory" => Ok(Command::Memory),
        "clear" => Ok(Command::Clear),
        "agent" => Ok(Command::SetMode(Mode::Agent)),
        "ask" => Ok(Command::SetMode(Mode::Ask)),
        "tables" => Ok(Command::Tables),
        "stats" => Ok(Command::Stats),
        "help" => Ok(Command::Help),
        other => Err(format!("unknown command /{other} (try /help)")),
    }
}

/// Answers to an approval prompt. Anything but yes rejects.
pub fn parse_approval(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub struct Repl {
    service: QueryService,
    pool: Arc<BackendPool>,
    user: UserId,
    mode: Mode,
    lines: Lines<BufReader<Stdin>>,
}

impl Repl {
    pub fn new(service: QueryService, pool: Arc<BackendPool>, user: UserId, mode: Mode) -> Self {
        Self {
            service,
            pool,
            user,
            mode,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(mut self) {
        println!("ByeDB v{} ({} mode). Type /help for commands.", env!("CARGO_PKG_VERSION"), self.mode);
        loop {
            let Some(line) = self.read_line(&format!("byedb ({})> ", self.mode)).await else {
                break;
            };
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };
            match command {
                Command::Quit => break,
                Command::Empty => {}
                Command::Help => println!("{HELP}"),
                Command::SetMode(mode) => {
                    self.mode = mode;
                    println!("Switched to {mode} mode.");
                }
                Command::Memory => self.show_memory().await,
                Command::Clear => {
                    self.service.clear_memory(&self.user).await;
                    println!("Memory cleared.");
                }
                Command::Tables => match self.service.list_tables(&self.user).await {
                    Ok(tables) if tables.is_empty() => println!("No tables yet."),
                    Ok(tables) => println!("{}", tables.join("\n")),
                    Err(e) => eprintln!("Error: {e}"),
                },
                Command::Stats => print_json(&self.pool.snapshot()),
                Command::Question(question) => {
                    if !self.ask(&question).await {
                        break;
                    }
                }
            }
        }
        self.service.shutdown().await;
        tracing::info!("Session closed");
    }

    /// Run one question through to a terminal report, prompting for every
    /// approval on the way. Returns false when stdin closed mid-approval.
    async fn ask(&mut self, question: &str) -> bool {
        let mut report = match self
            .service
            .submit_question(&self.user, question, self.mode)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: {e}");
                return true;
            }
        };

        loop {
            print_report(&report);
            if !report.requires_approval() {
                return true;
            }
            let Some(answer) = self.read_line("Approve? [y/n] ").await else {
                return false;
            };
            report = match self
                .service
                .confirm_pending(&self.user, parse_approval(&answer))
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return true;
                }
            };
        }
    }

    async fn show_memory(&self) {
        let conversations = self.service.memory_summary(&self.user).await;
        if conversations.is_empty() {
            println!("No conversations remembered.");
        }
        for (i, conversation) in conversations.iter().enumerate() {
            println!("Conversation {}:\n{conversation}", i + 1);
        }
    }

    async fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                None
            }
        }
    }
}

fn print_report(report: &TurnReport) {
    println!("{}", report.response);
    if let Some(pending) = &report.pending {
        println!("Pending {}: {}", pending.name, pending.arguments);
    }
    if let Some(data) = &report.data {
        print_json(data);
    }
    tracing::debug!(
        prompt_tokens = report.usage.prompt_tokens,
        total_tokens = report.usage.total_tokens,
        status = ?report.status,
        "report"
    );
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_command("  how many users?  ").unwrap(),
            Command::Question("how many users?".into())
        );
        assert_eq!(parse_command("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_command("/quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("/ASK").unwrap(), Command::SetMode(Mode::Ask));
        assert_eq!(parse_command("/agent").unwrap(), Command::SetMode(Mode::Agent));
        assert_eq!(parse_command("/stats").unwrap(), Command::Stats);
        assert_eq!(parse_command("/tables").unwrap(), Command::Tables);
        assert_eq!(parse_command("/memory").unwrap(), Command::Memory);
        assert_eq!(parse_command("/clear").unwrap(), Command::Clear);
        assert!(parse_command("/drop").is_err());
    }

    #[test]
    fn only_yes_approves() {
        assert!(parse_approval("y"));
        assert!(parse_approval(" YES "));
        assert!(!parse_approval("n"));
        assert!(!parse_approval(""));
        assert!(!parse_approval("sure"));
    }
}
