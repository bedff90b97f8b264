//! Configuration metadata (MetaType) graph.
//!
//! Configuration and factory-configuration annotations may carry a
//! `metadata` block describing the attributes of their configuration. Each
//! such block becomes one [`Ocd`] plus one [`Designate`] binding it to the
//! configuration PID. The graph is serializable for a downstream metadata
//! writer; persisting it is not done here.

use std::fmt;

use serde::Serialize;

use super::{
    annotation::{AttrError, Attributes},
    property::PrimitiveType,
};

/// One selectable value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeOption {
    pub value: String,
    pub label: String,
}

/// Attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ad {
    pub id: String,
    #[serde(rename = "type", serialize_with = "serialize_type")]
    pub ty: PrimitiveType,
    pub defaults: Vec<String>,
    pub heading: Option<String>,
    pub description: Option<String>,
    pub cardinality: i64,
    pub required: bool,
    pub options: Vec<AttributeOption>,
}

fn serialize_type<S: serde::Serializer>(ty: &PrimitiveType, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(ty.type_name())
}

/// Object class definition for one configuration PID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ocd {
    pub pid: String,
    pub heading: Option<String>,
    pub description: Option<String>,
    pub attributes: Vec<Ad>,
}

/// Binds an [`Ocd`] to a configuration identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Designate {
    pub pid: String,
    pub factory: bool,
}

/// Append-only MetaType registry shared by a whole build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaTypeRegistry {
    ocds: Vec<Ocd>,
    designates: Vec<Designate>,
}

impl MetaTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ocd(&mut self, ocd: Ocd) {
        self.ocds.push(ocd);
    }

    pub fn add_designate(&mut self, designate: Designate) {
        self.designates.push(designate);
    }

    /// Append everything `other` collected, keeping its order.
    pub fn merge(&mut self, other: MetaTypeRegistry) {
        self.ocds.extend(other.ocds);
        self.designates.extend(other.designates);
    }

    pub fn ocds(&self) -> &[Ocd] {
        &self.ocds
    }

    pub fn designates(&self) -> &[Designate] {
        &self.designates
    }

    pub fn is_empty(&self) -> bool {
        self.ocds.is_empty() && self.designates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaTypeError {
    MissingId,
    UnknownType { id: String, token: String },
    /// Option labels and values must be both present or both absent, and of
    /// equal length.
    MismatchedOptions {
        id: String,
        labels: Option<usize>,
        values: Option<usize>,
    },
    Attribute(AttrError),
}

impl fmt::Display for MetaTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaTypeError::MissingId => write!(f, "property metadata without an id"),
            MetaTypeError::UnknownType { id, token } => {
                write!(f, "invalid type {} for property metadata {}", token, id)
            }
            MetaTypeError::MismatchedOptions { id, labels, values } => {
                let count = |n: &Option<usize>| match n {
                    Some(n) => n.to_string(),
                    None => "none".to_string(),
                };
                write!(
                    f,
                    "invalid option labels/values specified for property {} ({} labels, {} values)",
                    id,
                    count(labels),
                    count(values)
                )
            }
            MetaTypeError::Attribute(err) => write!(f, "{}", err),
        }
    }
}

impl From<AttrError> for MetaTypeError {
    fn from(err: AttrError) -> Self {
        MetaTypeError::Attribute(err)
    }
}

/// Build the OCD and Designate for an annotation carrying a `metadata`
/// block. Returns `None` when there is no such block.
pub fn parse_metatype(
    annotation: &Attributes,
    pid: &str,
    factory: bool,
) -> Result<Option<(Ocd, Designate)>, MetaTypeError> {
    let Some(metadata) = annotation.nested("metadata")? else {
        return Ok(None);
    };

    let mut ocd = Ocd {
        pid: pid.to_string(),
        heading: annotation.string("heading")?,
        description: annotation.string("description")?,
        attributes: Vec::with_capacity(metadata.len()),
    };

    for property in metadata {
        ocd.attributes.push(parse_attribute(property)?);
    }

    let designate = Designate {
        pid: pid.to_string(),
        factory,
    };
    Ok(Some((ocd, designate)))
}

fn parse_attribute(property: &Attributes) -> Result<Ad, MetaTypeError> {
    let id = property.string("id")?.ok_or(MetaTypeError::MissingId)?;

    let ty = match property.string("type")? {
        None => PrimitiveType::String,
        Some(token) => PrimitiveType::resolve(&token).ok_or_else(|| MetaTypeError::UnknownType {
            id: id.clone(),
            token,
        })?,
    };

    let labels = property.strings("optionLabels")?;
    let values = property.strings("optionValues")?;
    let options = match (labels, values) {
        (None, None) => Vec::new(),
        (Some(labels), Some(values)) if labels.len() == values.len() => values
            .into_iter()
            .zip(labels)
            .map(|(value, label)| AttributeOption { value, label })
            .collect(),
        (labels, values) => {
            return Err(MetaTypeError::MismatchedOptions {
                id,
                labels: labels.map(|l| l.len()),
                values: values.map(|v| v.len()),
            });
        }
    };

    Ok(Ad {
        id,
        ty,
        defaults: property.strings("defaults")?.unwrap_or_default(),
        heading: property.string("heading")?,
        description: property.string("description")?,
        cardinality: property.int("cardinality")?.unwrap_or(0),
        required: property.boolean("required")?.unwrap_or(true),
        options,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::annotation::AttrValue;

    fn strs(values: &[&str]) -> AttrValue {
        AttrValue::StrArray(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_no_metadata_block() {
        assert_eq!(parse_metatype(&Attributes::new(), "pid", false).unwrap(), None);
    }

    #[test]
    fn test_full_attribute() {
        let property = Attributes::new()
            .with("id", AttrValue::Str("size".into()))
            .with("type", AttrValue::Str("Ljava/lang/Integer;".into()))
            .with("defaults", strs(&["10"]))
            .with("heading", AttrValue::Str("Size".into()))
            .with("cardinality", AttrValue::Int(2))
            .with("required", AttrValue::Bool(false))
            .with("optionLabels", strs(&["Ten", "Twenty"]))
            .with("optionValues", strs(&["10", "20"]));
        let annotation = Attributes::new()
            .with("heading", AttrValue::Str("Pool".into()))
            .with("metadata", AttrValue::NestedArray(vec![property]));

        let (ocd, designate) = parse_metatype(&annotation, "com.acme.Pool", true)
            .unwrap()
            .unwrap();

        assert_eq!(ocd.pid, "com.acme.Pool");
        assert_eq!(ocd.heading.as_deref(), Some("Pool"));
        assert_eq!(ocd.description, None);
        let ad = &ocd.attributes[0];
        assert_eq!(ad.ty, PrimitiveType::Integer);
        assert_eq!(ad.defaults, vec!["10"]);
        assert_eq!(ad.cardinality, 2);
        assert!(!ad.required);
        assert_eq!(
            ad.options[1],
            AttributeOption {
                value: "20".to_string(),
                label: "Twenty".to_string()
            }
        );
        assert_eq!(
            designate,
            Designate {
                pid: "com.acme.Pool".to_string(),
                factory: true
            }
        );
    }

    #[test]
    fn test_attribute_defaults() {
        let property = Attributes::new().with("id", AttrValue::Str("name".into()));
        let annotation = Attributes::new().with("metadata", AttrValue::Nested(property));
        let (ocd, _) = parse_metatype(&annotation, "p", false).unwrap().unwrap();
        let ad = &ocd.attributes[0];
        assert_eq!(ad.ty, PrimitiveType::String);
        assert!(ad.required);
        assert_eq!(ad.cardinality, 0);
        assert!(ad.options.is_empty());
    }

    #[test]
    fn test_mismatched_options() {
        let only_labels = Attributes::new()
            .with("id", AttrValue::Str("a".into()))
            .with("optionLabels", strs(&["A"]));
        let uneven = Attributes::new()
            .with("id", AttrValue::Str("b".into()))
            .with("optionLabels", strs(&["A"]))
            .with("optionValues", strs(&["1", "2"]));

        for property in [only_labels, uneven] {
            let annotation = Attributes::new().with("metadata", AttrValue::Nested(property));
            let err = parse_metatype(&annotation, "p", false).unwrap_err();
            assert!(matches!(err, MetaTypeError::MismatchedOptions { .. }));
        }
    }

    #[test]
    fn test_registry_merge_keeps_order() {
        let mut first = MetaTypeRegistry::new();
        first.add_designate(Designate {
            pid: "a".into(),
            factory: false,
        });
        let mut second = MetaTypeRegistry::new();
        second.add_designate(Designate {
            pid: "b".into(),
            factory: true,
        });

        first.merge(second);
        let pids: Vec<_> = first.designates().iter().map(|d| d.pid.as_str()).collect();
        assert_eq!(pids, vec!["a", "b"]);
    }

    #[test]
    fn test_serializes_type_name() {
        let ad = Ad {
            id: "x".into(),
            ty: PrimitiveType::Long,
            defaults: vec![],
            heading: None,
            description: None,
            cardinality: 0,
            required: true,
            options: vec![],
        };
        let json = serde_json::to_value(&ad).unwrap();
        assert_eq!(json["type"], "java.lang.Long");
    }
}
