//! User confirmation port.
//!
//! Library code asks questions through [`Prompt`]; the CLI supplies a
//! terminal implementation and tests use [`AutoPrompt`].

use crate::error::Result;

/// Asks the user to confirm or choose.
pub trait Prompt {
    /// Yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&mut self, message: &str) -> Result<bool>;

    /// Pick one of `options`, returning its index. `default` is used when the
    /// user just presses enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn select(&mut self, message: &str, options: &[&str], default: usize) -> Result<usize>;
}

/// Answers every question the same way without asking.
///
/// `AutoPrompt::yes()` backs `--yes`; `AutoPrompt::no()` is for
/// non-interactive runs that must not mutate anything that needs consent.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    accept: bool,
}

impl AutoPrompt {
    #[must_use]
    pub fn yes() -> Self {
        Self { accept: true }
    }

    #[must_use]
    pub fn no() -> Self {
        Self { accept: false }
    }
}

impl Prompt for AutoPrompt {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        tracing::debug!(accept = self.accept, "Auto-answering: {message}");
        Ok(self.accept)
    }

    fn select(&mut self, _message: &str, _options: &[&str], default: usize) -> Result<usize> {
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prompt() {
        assert!(AutoPrompt::yes().confirm("go?").unwrap());
        assert!(!AutoPrompt::no().confirm("go?").unwrap());
        assert_eq!(AutoPrompt::yes().select("pick", &["a", "b", "c"], 2).unwrap(), 2);
    }
}
