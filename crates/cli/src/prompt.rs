//! Terminal interaction: duplicate decisions and quota confirmation.

use std::io::Write;

use async_trait::async_trait;
use hoard_core::duplicate::ResolutionAction;
use hoard_pipeline::image_pipeline::{QuotaDecision, QuotaPrompt, QuotaRequest};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// A user decision while the duplicate wizard is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Resolve(ResolutionAction),
    /// Jump to another candidate (0-based).
    Select(usize),
    /// Close the wizard; the rest count as skipped.
    Cancel,
}

/// Asks for duplicate decisions.
#[async_trait]
pub trait ResolutionPrompt: Send + Sync {
    /// `screen` is the rendered candidate; `pending` lists unresolved
    /// candidate indices.
    async fn choose(&self, screen: &str, pending: &[usize]) -> Choice;

    /// Whether to retry a commit that failed with `message`.
    async fn retry_commit(&self, message: &str) -> bool;

    /// Whether to keep the wizard open after a decision failed with
    /// `message`. Only prompts that can answer differently should say yes.
    async fn keep_resolving(&self, _message: &str) -> bool {
        false
    }
}

/// Parse one line of wizard input. `None` means "ask again".
pub fn parse_choice(input: &str) -> Option<Choice> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "s" | "skip" => Some(Choice::Resolve(ResolutionAction::Skip)),
        "a" | "add" => Some(Choice::Resolve(ResolutionAction::AddAsNew)),
        "r" | "replace" => Some(Choice::Resolve(ResolutionAction::Replace)),
        "c" | "cancel" | "q" => Some(Choice::Cancel),
        other => {
            let number: usize = other.trim_start_matches('#').parse().ok()?;
            number.checked_sub(1).map(Choice::Select)
        }
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

// ---------------------------------------------------------------------------
// Interactive
// ---------------------------------------------------------------------------

/// Reads answers from standard input.
pub struct StdinPrompt {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl StdinPrompt {
    /// Print `question` and read one line. `None` on end of input.
    async fn ask(&self, question: &str) -> Option<String> {
        print!("{question} ");
        let _ = std::io::stdout().flush();
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from stdin");
                None
            }
        }
    }
}

#[async_trait]
impl ResolutionPrompt for StdinPrompt {
    async fn choose(&self, screen: &str, pending: &[usize]) -> Choice {
        println!("{screen}");
        if pending.len() > 1 {
            let numbers: Vec<String> = pending.iter().map(|i| format!("#{}", i + 1)).collect();
            println!("Unresolved: {}", numbers.join(" "));
        }
        loop {
            let Some(line) = self.ask("[s]kip, [a]dd as new, [r]eplace, #n to jump, [c]ancel:").await else {
                return Choice::Cancel;
            };
            match parse_choice(&line) {
                Some(choice) => return choice,
                None => println!("Unrecognized answer '{}'", line.trim()),
            }
        }
    }

    async fn retry_commit(&self, message: &str) -> bool {
        println!("{message}");
        self.ask("Retry? [y/N]").await.is_some_and(|l| is_yes(&l))
    }
    async fn keep_resolving(&self, message: &str) -> bool {
        println!("{message}");
        true
    }
}

#[async_trait]
impl QuotaPrompt for StdinPrompt {
    async fn confirm_increase(&self, request: QuotaRequest) -> QuotaDecision {
        let question = format!(
            "Image storage needs {} B but the limit is {} B. Raise the limit to {} B? [y/N]",
            request.required, request.current_limit, request.new_limit
        );
        match self.ask(&question).await {
            Some(line) if is_yes(&line) => QuotaDecision::Proceed,
            _ => QuotaDecision::Abort,
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Answers every question the same way, for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy {
    pub action: ResolutionAction,
    pub quota: QuotaDecision,
}

#[async_trait]
impl ResolutionPrompt for FixedPolicy {
    async fn choose(&self, _screen: &str, _pending: &[usize]) -> Choice {
        Choice::Resolve(self.action)
    }

    async fn retry_commit(&self, _message: &str) -> bool {
        false
    }
}

#[async_trait]
impl QuotaPrompt for FixedPolicy {
    async fn confirm_increase(&self, _request: QuotaRequest) -> QuotaDecision {
        self.quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_actions_and_jumps() {
        assert_eq!(parse_choice("R\n"), Some(Choice::Resolve(ResolutionAction::Replace)));
        assert_eq!(parse_choice(" add "), Some(Choice::Resolve(ResolutionAction::AddAsNew)));
        assert_eq!(parse_choice("#3"), Some(Choice::Select(2)));
        assert_eq!(parse_choice("1"), Some(Choice::Select(0)));
        assert_eq!(parse_choice("cancel"), Some(Choice::Cancel));
    }

    #[test]
    fn parse_rejects_nonsense() {
        assert_eq!(parse_choice("maybe"), None);
        assert_eq!(parse_choice("#0"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("Y"));
        assert!(is_yes(" yes\n"));
        assert!(!is_yes("n"));
    }
}
