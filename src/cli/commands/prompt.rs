//! Interactive prompts on the controlling terminal.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::error::Result;
use crate::sync::{AutoPrompt, Prompt};

/// Reads answers from stdin, writing questions to stderr so stdout stays
/// clean for `--json`.
pub struct TerminalPrompt<R> {
    input: R,
}

impl TerminalPrompt<io::StdinLock<'static>> {
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> TerminalPrompt<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// One trimmed line, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead> Prompt for TerminalPrompt<R> {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        let mut err = io::stderr();
        write!(err, "{message} {} ", "[y/N]".dimmed())?;
        err.flush()?;

        let answer = self.read_line()?.unwrap_or_default().to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    fn select(&mut self, message: &str, options: &[&str], default: usize) -> Result<usize> {
        let mut err = io::stderr();
        writeln!(err, "\n{message}\n")?;
        for (i, option) in options.iter().enumerate() {
            let marker = if i == default { "*" } else { " " };
            writeln!(err, " {marker} {}. {option}", i + 1)?;
        }

        loop {
            write!(err, "Choice [{}]: ", default + 1)?;
            err.flush()?;

            let Some(answer) = self.read_line()? else {
                return Ok(default);
            };
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(err, "{}", format!("Enter a number from 1 to {}", options.len()).red())?,
            }
        }
    }
}

/// Prompt chosen from the global flags: `--yes` answers everything,
/// otherwise the terminal is asked.
pub enum CliPrompt {
    Auto(AutoPrompt),
    Terminal(TerminalPrompt<io::StdinLock<'static>>),
}

impl CliPrompt {
    #[must_use]
    pub fn new(yes: bool) -> Self {
        if yes {
            Self::Auto(AutoPrompt::yes())
        } else {
            Self::Terminal(TerminalPrompt::stdin())
        }
    }
}

impl Prompt for CliPrompt {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        match self {
            Self::Auto(p) => p.confirm(message),
            Self::Terminal(p) => p.confirm(message),
        }
    }

    fn select(&mut self, message: &str, options: &[&str], default: usize) -> Result<usize> {
        match self {
            Self::Auto(p) => p.select(message, options, default),
            Self::Terminal(p) => p.select(message, options, default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm_answers() {
        let mut prompt = TerminalPrompt::new(Cursor::new("y\nNo\nYES\n\n"));
        assert!(prompt.confirm("one?").unwrap());
        assert!(!prompt.confirm("two?").unwrap());
        assert!(prompt.confirm("three?").unwrap());
        assert!(!prompt.confirm("four?").unwrap());
        // end of input declines
        assert!(!prompt.confirm("five?").unwrap());
    }

    #[test]
    fn test_select_retries_until_valid() {
        let mut prompt = TerminalPrompt::new(Cursor::new("9\nabc\n2\n"));
        assert_eq!(prompt.select("pick", &["a", "b", "c"], 0).unwrap(), 1);
    }

    #[test]
    fn test_select_default_on_empty_or_eof() {
        let mut prompt = TerminalPrompt::new(Cursor::new("\n"));
        assert_eq!(prompt.select("pick", &["a", "b", "c"], 2).unwrap(), 2);
        assert_eq!(prompt.select("pick", &["a", "b", "c"], 1).unwrap(), 1);
    }
}
