//! Descriptor entries.
//!
//! An [`Entry`] is one descriptor record: a type tag plus parameters kept in
//! insertion order. The order is part of the serialized output.

use std::{collections::BTreeSet, fmt};

use super::{
    annotation::{AttrError, Attributes},
    property::PropertyTable,
    signature::{SignatureMismatch, SignaturePattern, parse_class},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Component,
    ServiceDependency,
    ConfigurationDependency,
    BundleDependency,
    ResourceDependency,
    AspectService,
    AdapterService,
    BundleAdapterService,
    ResourceAdapterService,
    FactoryConfigurationAdapterService,
}

impl EntryType {
    /// Service-bearing variants; a class has exactly one entry of these.
    pub fn is_primary(self) -> bool {
        !matches!(
            self,
            EntryType::ServiceDependency
                | EntryType::ConfigurationDependency
                | EntryType::BundleDependency
                | EntryType::ResourceDependency
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Component => "Component",
            EntryType::ServiceDependency => "ServiceDependency",
            EntryType::ConfigurationDependency => "ConfigurationDependency",
            EntryType::BundleDependency => "BundleDependency",
            EntryType::ResourceDependency => "ResourceDependency",
            EntryType::AspectService => "AspectService",
            EntryType::AdapterService => "AdapterService",
            EntryType::BundleAdapterService => "BundleAdapterService",
            EntryType::ResourceAdapterService => "ResourceAdapterService",
            EntryType::FactoryConfigurationAdapterService => "FactoryConfigurationAdapterService",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter keys. The same names are used as annotation attribute names
/// wherever an attribute is copied straight into the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryParam {
    Init,
    Start,
    Registered,
    Stop,
    Unregistered,
    Destroy,
    Composition,
    Starter,
    Stopper,
    BundleContextField,
    DependencyManagerField,
    ComponentField,
    Impl,
    Provides,
    Properties,
    FactorySet,
    FactoryConfigure,
    FactoryMethod,
    Service,
    AutoConfig,
    Filter,
    DefaultImpl,
    Added,
    Changed,
    Removed,
    Swap,
    Timeout,
    Required,
    Name,
    Propagate,
    Pid,
    Updated,
    Ranking,
    Field,
    AdapteeFilter,
    AdapteeService,
    StateMask,
    FactoryPid,
}

impl EntryParam {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryParam::Init => "init",
            EntryParam::Start => "start",
            EntryParam::Registered => "registered",
            EntryParam::Stop => "stop",
            EntryParam::Unregistered => "unregistered",
            EntryParam::Destroy => "destroy",
            EntryParam::Composition => "composition",
            EntryParam::Starter => "starter",
            EntryParam::Stopper => "stopper",
            EntryParam::BundleContextField => "bundleContextField",
            EntryParam::DependencyManagerField => "dependencyManagerField",
            EntryParam::ComponentField => "componentField",
            EntryParam::Impl => "impl",
            EntryParam::Provides => "provides",
            EntryParam::Properties => "properties",
            EntryParam::FactorySet => "factorySet",
            EntryParam::FactoryConfigure => "factoryConfigure",
            EntryParam::FactoryMethod => "factoryMethod",
            EntryParam::Service => "service",
            EntryParam::AutoConfig => "autoConfig",
            EntryParam::Filter => "filter",
            EntryParam::DefaultImpl => "defaultImpl",
            EntryParam::Added => "added",
            EntryParam::Changed => "changed",
            EntryParam::Removed => "removed",
            EntryParam::Swap => "swap",
            EntryParam::Timeout => "timeout",
            EntryParam::Required => "required",
            EntryParam::Name => "name",
            EntryParam::Propagate => "propagate",
            EntryParam::Pid => "pid",
            EntryParam::Updated => "updated",
            EntryParam::Ranking => "ranking",
            EntryParam::Field => "field",
            EntryParam::AdapteeFilter => "adapteeFilter",
            EntryParam::AdapteeService => "adapteeService",
            EntryParam::StateMask => "stateMask",
            EntryParam::FactoryPid => "factoryPid",
        }
    }
}

impl fmt::Display for EntryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    Text(String),
    /// Type names, rendered comma-separated.
    List(Vec<String>),
    Properties(PropertyTable),
}

impl EntryValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntryValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Failure while copying an attribute into an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    Attribute(AttrError),
    Signature(SignatureMismatch),
}

impl From<AttrError> for EntryError {
    fn from(err: AttrError) -> Self {
        EntryError::Attribute(err)
    }
}

impl From<SignatureMismatch> for EntryError {
    fn from(err: SignatureMismatch) -> Self {
        EntryError::Signature(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    entry_type: EntryType,
    params: Vec<(EntryParam, EntryValue)>,
}

impl Entry {
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            params: Vec::new(),
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn params(&self) -> &[(EntryParam, EntryValue)] {
        &self.params
    }

    pub fn get(&self, param: EntryParam) -> Option<&EntryValue> {
        self.params.iter().find(|(p, _)| *p == param).map(|(_, v)| v)
    }

    /// Text value of a parameter, if set.
    pub fn text(&self, param: EntryParam) -> Option<&str> {
        self.get(param).and_then(EntryValue::as_text)
    }

    fn set(&mut self, param: EntryParam, value: EntryValue) {
        match self.params.iter_mut().find(|(p, _)| *p == param) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((param, value)),
        }
    }

    /// Put a literal value unconditionally.
    pub fn put(&mut self, param: EntryParam, value: impl Into<String>) {
        self.set(param, EntryValue::Text(value.into()));
    }

    /// Copy the attribute named after `param`, or `default` when absent.
    /// Returns the value written, if any.
    pub fn put_string(
        &mut self,
        attrs: &Attributes,
        param: EntryParam,
        default: Option<&str>,
    ) -> Result<Option<String>, AttrError> {
        let value = attrs
            .string(param.as_str())?
            .or_else(|| default.map(str::to_string));
        if let Some(value) = &value {
            self.put(param, value.clone());
        }
        Ok(value)
    }

    /// Copy a class-descriptor attribute as a dotted type name, or `default`
    /// when absent.
    pub fn put_class(
        &mut self,
        attrs: &Attributes,
        param: EntryParam,
        default: Option<&str>,
    ) -> Result<Option<String>, EntryError> {
        let value = match attrs.string(param.as_str())? {
            Some(descriptor) => Some(parse_class(&descriptor, SignaturePattern::Class)?),
            None => default.map(str::to_string),
        };
        if let Some(value) = &value {
            self.put(param, value.clone());
        }
        Ok(value)
    }

    /// Copy a class-descriptor array attribute, falling back to `fallback`
    /// (already dotted) when absent. Every written name is added to
    /// `exported`. Returns how many names were written.
    pub fn put_class_array(
        &mut self,
        attrs: &Attributes,
        param: EntryParam,
        fallback: &[String],
        exported: &mut BTreeSet<String>,
    ) -> Result<usize, EntryError> {
        let names = match attrs.strings(param.as_str())? {
            Some(descriptors) => descriptors
                .iter()
                .map(|d| parse_class(d, SignaturePattern::Class))
                .collect::<Result<Vec<_>, _>>()?,
            None => fallback.to_vec(),
        };
        if names.is_empty() {
            return Ok(0);
        }
        exported.extend(names.iter().cloned());
        let count = names.len();
        self.set(param, EntryValue::List(names));
        Ok(count)
    }

    pub fn put_properties(&mut self, param: EntryParam, table: PropertyTable) {
        self.set(param, EntryValue::Properties(table));
    }
}
