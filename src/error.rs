//! Error taxonomy for descriptor compilation.
//!
//! Every validation failure aborts the current class. The error carries the
//! class being compiled, the member or annotation that triggered it, and a
//! message quoting the offending raw value.

use std::fmt;

use thiserror::Error;

use crate::core::AnnotationKind;

/// Where a compile error was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSite {
    pub class: String,
    pub member: Option<String>,
    pub annotation: Option<AnnotationKind>,
}

impl ErrorSite {
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.class)?;
        if let Some(member) = &self.member {
            write!(f, ", member {}", member)?;
        }
        if let Some(annotation) = &self.annotation {
            write!(f, ", @{}", annotation)?;
        }
        Ok(())
    }
}

/// Coarse category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Structural,
    Conflict,
    Value,
    Signature,
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Structural => write!(f, "structural"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Value => write!(f, "value"),
            ErrorKind::Signature => write!(f, "signature"),
            ErrorKind::State => write!(f, "state"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The class has no primary (service-bearing) entry, or more than one.
    #[error("{site}: {message}")]
    Structural { site: ErrorSite, message: String },

    /// Duplicate dependency name, controller ordering or mixed callback
    /// styles.
    #[error("{site}: {message}")]
    Conflict { site: ErrorSite, message: String },

    /// A property or attribute value does not validate.
    #[error("{site}: {message}")]
    Value { site: ErrorSite, message: String },

    /// Member shape mismatch or invalid filter syntax.
    #[error("{site}: {message}")]
    Signature { site: ErrorSite, message: String },

    /// Registered/unregistered without a provided service, ambiguous aspect
    /// target.
    #[error("{site}: {message}")]
    State { site: ErrorSite, message: String },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Structural { .. } => ErrorKind::Structural,
            CompileError::Conflict { .. } => ErrorKind::Conflict,
            CompileError::Value { .. } => ErrorKind::Value,
            CompileError::Signature { .. } => ErrorKind::Signature,
            CompileError::State { .. } => ErrorKind::State,
        }
    }

    pub fn site(&self) -> &ErrorSite {
        match self {
            CompileError::Structural { site, .. }
            | CompileError::Conflict { site, .. }
            | CompileError::Value { site, .. }
            | CompileError::Signature { site, .. }
            | CompileError::State { site, .. } => site,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Structural { message, .. }
            | CompileError::Conflict { message, .. }
            | CompileError::Value { message, .. }
            | CompileError::Signature { message, .. }
            | CompileError::State { message, .. } => message,
        }
    }

    /// Builds an error of the given kind.
    pub fn new(kind: ErrorKind, site: ErrorSite, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Structural => CompileError::Structural { site, message },
            ErrorKind::Conflict => CompileError::Conflict { site, message },
            ErrorKind::Value => CompileError::Value { site, message },
            ErrorKind::Signature => CompileError::Signature { site, message },
            ErrorKind::State => CompileError::State { site, message },
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
