//! Error types and the diagnostic funnel.
//!
//! Every recoverable condition in the pipeline goes through [`Reporter::report`],
//! which either logs a warning (best-effort mode) or fails the compilation
//! (halt-on-errors mode). This gives callers a single toggle between strict and
//! lenient semantics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Halted(String),

    #[error("failed to parse HTML input: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// The injected logging funnel. In lenient mode diagnostics are logged and
/// compilation continues with best-effort output; in strict mode the first
/// diagnostic aborts the compilation.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    halt_on_errors: bool,
}

impl Reporter {
    pub fn new(halt_on_errors: bool) -> Self {
        Reporter { halt_on_errors }
    }

    pub fn halts(&self) -> bool {
        self.halt_on_errors
    }

    pub fn report(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if self.halt_on_errors {
            Err(CompileError::Halted(message))
        } else {
            log::warn!("{}", message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_reporter_continues() {
        let reporter = Reporter::new(false);
        assert!(reporter.report("something minor").is_ok());
    }

    #[test]
    fn strict_reporter_halts_with_message() {
        let reporter = Reporter::new(true);
        let err = reporter.report("bad input").unwrap_err();
        match err {
            CompileError::Halted(message) => assert_eq!(message, "bad input"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
