//! Member type-signature templates.
//!
//! Signatures are raw JVM descriptors (`(Lcom/acme/Api;)V`, `Lcom/acme/Api;`).
//! Each template is matched against the whole descriptor; templates that
//! embed a type name expose it through a capture group, returned in dotted
//! form.

use std::{fmt, sync::LazyLock};

use regex::Regex;

static COMPOSITION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\)\[Ljava/lang/Object;$").unwrap());

// bind(Type), bind(Map, Type), bind(BundleContext, Type)
static BIND_CLASS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((L[^;]+;)?L([^;]+);\)V$").unwrap());

static CLASS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^L([^;]+);$").unwrap());

static RUNNABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Ljava/lang/Runnable;$").unwrap());

static BUNDLE_CONTEXT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Lorg/osgi/framework/BundleContext;$").unwrap());

static DEPENDENCY_MANAGER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Ldm[./]DependencyManager;$").unwrap());

static COMPONENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Ldm[./]Component;$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePattern {
    /// `()[Ljava/lang/Object;`: composition accessor.
    Composition,
    /// One or two reference arguments returning void; the last argument is
    /// the bound service type.
    BindClass,
    /// A single declared reference type.
    Class,
    /// A `java.lang.Runnable` field (lifecycle controller).
    Runnable,
    /// An `org.osgi.framework.BundleContext` field.
    BundleContext,
    /// A `dm.DependencyManager` field.
    DependencyManager,
    /// A `dm.Component` field.
    Component,
}

impl SignaturePattern {
    fn regex(self) -> &'static Regex {
        match self {
            SignaturePattern::Composition => &COMPOSITION_REGEX,
            SignaturePattern::BindClass => &BIND_CLASS_REGEX,
            SignaturePattern::Class => &CLASS_REGEX,
            SignaturePattern::Runnable => &RUNNABLE_REGEX,
            SignaturePattern::BundleContext => &BUNDLE_CONTEXT_REGEX,
            SignaturePattern::DependencyManager => &DEPENDENCY_MANAGER_REGEX,
            SignaturePattern::Component => &COMPONENT_REGEX,
        }
    }

    /// Capture group holding the embedded type name, if the template has one.
    fn type_group(self) -> Option<usize> {
        match self {
            SignaturePattern::Class => Some(1),
            SignaturePattern::BindClass => Some(2),
            _ => None,
        }
    }

    pub fn matches(self, descriptor: &str) -> bool {
        self.regex().is_match(descriptor)
    }
}

/// What kind of thing failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Method,
    Field,
    Class,
}

/// A descriptor that does not fit the expected template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMismatch {
    pub subject: Subject,
    /// Member name; empty for class descriptors.
    pub name: String,
    pub descriptor: String,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject {
            Subject::Method => write!(
                f,
                "invalid method {}, wrong signature: {}",
                self.name, self.descriptor
            ),
            Subject::Field => write!(
                f,
                "invalid field {}, wrong signature: {}",
                self.name, self.descriptor
            ),
            Subject::Class => write!(f, "invalid class descriptor: {}", self.descriptor),
        }
    }
}

/// Extract the type name embedded in `descriptor` by `pattern`, translating
/// `/` package separators to dots.
///
/// `pattern` must be a template with an embedded type ([`SignaturePattern::Class`]
/// or [`SignaturePattern::BindClass`]).
pub fn parse_class(descriptor: &str, pattern: SignaturePattern) -> Result<String, SignatureMismatch> {
    let mismatch = || SignatureMismatch {
        subject: Subject::Class,
        name: String::new(),
        descriptor: descriptor.to_string(),
    };
    let group = pattern.type_group().ok_or_else(mismatch)?;
    pattern
        .regex()
        .captures(descriptor)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().replace('/', "."))
        .ok_or_else(mismatch)
}

/// Check that a method descriptor fits `pattern`.
pub fn check_method(
    method: &str,
    descriptor: &str,
    pattern: SignaturePattern,
) -> Result<(), SignatureMismatch> {
    check(Subject::Method, method, descriptor, pattern)
}

/// Check that a field descriptor fits `pattern`.
pub fn check_field(
    field: &str,
    descriptor: &str,
    pattern: SignaturePattern,
) -> Result<(), SignatureMismatch> {
    check(Subject::Field, field, descriptor, pattern)
}

fn check(
    subject: Subject,
    name: &str,
    descriptor: &str,
    pattern: SignaturePattern,
) -> Result<(), SignatureMismatch> {
    if pattern.matches(descriptor) {
        Ok(())
    } else {
        Err(SignatureMismatch {
            subject,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }
}
