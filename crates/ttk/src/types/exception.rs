use thiserror::Error;

/// A runtime error raised while rendering a template.
///
/// Exceptions are the only error channel visible to templates: `THROW`
/// creates them and `TRY`/`CATCH` inspects them. The `kind` is a dotted
/// hierarchy (`file.not_found`), and a `CATCH file` clause matches any kind
/// equal to or nested under `file`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error - {info}")]
pub struct Exception {
    kind: String,
    info: String,
}

impl Exception {
    /// Kind raised by `STOP`; swallowed at the top level.
    pub const STOP: &'static str = "stop";
    /// Kind used for errors raised by host code without a more specific type.
    pub const UNDEF: &'static str = "undef";

    pub fn new(kind: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            info: info.into(),
        }
    }

    /// Shorthand for an `undef` exception, the kind given to untyped failures.
    pub fn undef(info: impl Into<String>) -> Self {
        Self::new(Self::UNDEF, info)
    }

    pub fn stop() -> Self {
        Self::new(Self::STOP, "")
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn is_stop(&self) -> bool {
        self.kind == Self::STOP
    }

    /// Returns true if this exception is caught by a `CATCH signature` clause.
    ///
    /// ```
    /// use ttk::Exception;
    ///
    /// let e = Exception::new("bar.baz", "x");
    /// assert!(e.matches("bar"));
    /// assert!(e.matches("bar.baz"));
    /// assert!(!e.matches("ba"));
    /// ```
    pub fn matches(&self, signature: &str) -> bool {
        match self.kind.strip_prefix(signature) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}
