//! Annotation kinds and typed attribute readers.
//!
//! The scanner reports each annotation occurrence as a kind plus a bag of
//! attributes. Only the closed set of kinds in [`AnnotationKind`] is
//! recognized; anything else is ignored by the collector.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Package of the annotation API, used to accept fully qualified kind names.
pub const ANNOTATION_PACKAGE: &str = "dm.annotation.api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    // Entry-producing, primary
    Component,
    AspectService,
    AdapterService,
    BundleAdapterService,
    ResourceAdapterService,
    FactoryConfigurationAdapterService,
    // Entry-producing, dependencies
    ServiceDependency,
    ConfigurationDependency,
    BundleDependency,
    ResourceDependency,
    // Pending callback state only
    Init,
    Start,
    Registered,
    Stop,
    Unregistered,
    Destroy,
    Composition,
    LifecycleController,
    Inject,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 19] = [
        AnnotationKind::Component,
        AnnotationKind::AspectService,
        AnnotationKind::AdapterService,
        AnnotationKind::BundleAdapterService,
        AnnotationKind::ResourceAdapterService,
        AnnotationKind::FactoryConfigurationAdapterService,
        AnnotationKind::ServiceDependency,
        AnnotationKind::ConfigurationDependency,
        AnnotationKind::BundleDependency,
        AnnotationKind::ResourceDependency,
        AnnotationKind::Init,
        AnnotationKind::Start,
        AnnotationKind::Registered,
        AnnotationKind::Stop,
        AnnotationKind::Unregistered,
        AnnotationKind::Destroy,
        AnnotationKind::Composition,
        AnnotationKind::LifecycleController,
        AnnotationKind::Inject,
    ];

    pub fn simple_name(self) -> &'static str {
        match self {
            AnnotationKind::Component => "Component",
            AnnotationKind::AspectService => "AspectService",
            AnnotationKind::AdapterService => "AdapterService",
            AnnotationKind::BundleAdapterService => "BundleAdapterService",
            AnnotationKind::ResourceAdapterService => "ResourceAdapterService",
            AnnotationKind::FactoryConfigurationAdapterService => {
                "FactoryConfigurationAdapterService"
            }
            AnnotationKind::ServiceDependency => "ServiceDependency",
            AnnotationKind::ConfigurationDependency => "ConfigurationDependency",
            AnnotationKind::BundleDependency => "BundleDependency",
            AnnotationKind::ResourceDependency => "ResourceDependency",
            AnnotationKind::Init => "Init",
            AnnotationKind::Start => "Start",
            AnnotationKind::Registered => "Registered",
            AnnotationKind::Stop => "Stop",
            AnnotationKind::Unregistered => "Unregistered",
            AnnotationKind::Destroy => "Destroy",
            AnnotationKind::Composition => "Composition",
            AnnotationKind::LifecycleController => "LifecycleController",
            AnnotationKind::Inject => "Inject",
        }
    }

    /// Resolve a kind from either its simple name (`Component`) or its fully
    /// qualified name (`dm.annotation.api.Component`).
    pub fn from_name(name: &str) -> Option<Self> {
        let simple = match name.strip_prefix(ANNOTATION_PACKAGE) {
            Some(rest) => rest.strip_prefix('.')?,
            None => name,
        };
        Self::ALL.into_iter().find(|k| k.simple_name() == simple)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

/// A single attribute value as reported by the scanner.
///
/// Untagged so scanner JSON maps naturally: `true`, `3`, `"x"`, `["a"]`,
/// `{..}`, `[{..}]`. Integers that fit in `i32` come back as `Int`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Str(String),
    StrArray(Vec<String>),
    Nested(Attributes),
    NestedArray(Vec<Attributes>),
}

impl AttrValue {
    fn shape(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "boolean",
            AttrValue::Int(_) => "integer",
            AttrValue::Long(_) => "long",
            AttrValue::Str(_) => "string",
            AttrValue::StrArray(_) => "string array",
            AttrValue::Nested(_) => "annotation",
            AttrValue::NestedArray(_) => "annotation array",
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Int(i) => Some(i.to_string()),
            AttrValue::Long(l) => Some(l.to_string()),
            AttrValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// An attribute read with the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrError {
    pub attribute: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attribute \"{}\" must be a {}, found a {}",
            self.attribute, self.expected, self.found
        )
    }
}

/// Attribute reader for one annotation occurrence (or a nested one).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for scanners and tests.
    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: AttrValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn mismatch(name: &str, expected: &'static str, found: &AttrValue) -> AttrError {
        AttrError {
            attribute: name.to_string(),
            expected,
            found: found.shape(),
        }
    }

    /// Scalar attribute rendered as text. Numbers and booleans are rendered
    /// with their canonical decimal/`true`/`false` form.
    pub fn string(&self, name: &str) -> Result<Option<String>, AttrError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .scalar_text()
                .map(Some)
                .ok_or_else(|| Self::mismatch(name, "scalar", value)),
        }
    }

    /// Array attribute as text values. A lone scalar reads as a one-element
    /// array, as annotation arrays with a single element are written that way.
    pub fn strings(&self, name: &str) -> Result<Option<Vec<String>>, AttrError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttrValue::StrArray(values)) => Ok(Some(values.clone())),
            Some(value) => value
                .scalar_text()
                .map(|s| Some(vec![s]))
                .ok_or_else(|| Self::mismatch(name, "string array", value)),
        }
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, AttrError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttrValue::Int(i)) => Ok(Some(i64::from(*i))),
            Some(AttrValue::Long(l)) => Ok(Some(*l)),
            Some(value) => Err(Self::mismatch(name, "number", value)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<Option<bool>, AttrError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttrValue::Bool(b)) => Ok(Some(*b)),
            Some(AttrValue::Str(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(AttrValue::Str(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(value) => Err(Self::mismatch(name, "boolean", value)),
        }
    }

    /// Nested annotation array. A single nested annotation reads as a
    /// one-element slice.
    pub fn nested(&self, name: &str) -> Result<Option<&[Attributes]>, AttrError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttrValue::NestedArray(items)) => Ok(Some(items.as_slice())),
            Some(AttrValue::Nested(item)) => Ok(Some(std::slice::from_ref(item))),
            Some(AttrValue::StrArray(items)) if items.is_empty() => Ok(Some(&[])),
            Some(value) => Err(Self::mismatch(name, "annotation array", value)),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
