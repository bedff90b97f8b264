//! Component property tables.
//!
//! A `properties` attribute is an array of nested property annotations. Each
//! one names a property and supplies its value(s) through exactly one of a
//! fixed list of slots. Values are validated against their primitive type and
//! encoded canonically:
//!
//! ```text
//! "string-param"       : "string-value"
//! "string-array-param" : ["str1", "str2"]
//! "long-param"         : {"type":"java.lang.Long","value":"1"}
//! "long-array-param"   : {"type":"java.lang.Long","value":["1","2"]}
//! ```

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};

use super::{
    annotation::{AttrError, Attributes},
    signature::{SignaturePattern, parse_class},
};

/// Primitive (boxed) property types a value may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Long,
    Double,
    Float,
    Integer,
    Byte,
    Character,
    Boolean,
    Short,
}

impl PrimitiveType {
    const ALL: [PrimitiveType; 9] = [
        PrimitiveType::String,
        PrimitiveType::Long,
        PrimitiveType::Double,
        PrimitiveType::Float,
        PrimitiveType::Integer,
        PrimitiveType::Byte,
        PrimitiveType::Character,
        PrimitiveType::Boolean,
        PrimitiveType::Short,
    ];

    /// Fully qualified type name used in encoded output.
    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveType::String => "java.lang.String",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Double => "java.lang.Double",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Integer => "java.lang.Integer",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Character => "java.lang.Character",
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Short => "java.lang.Short",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Long => "long",
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Integer => "int",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Character => "char",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Short => "short",
        }
    }

    /// Resolve a type token: a class descriptor (`Ljava/lang/Long;`), a
    /// dotted name (`java.lang.Long`), or a primitive keyword (`long`).
    pub fn resolve(token: &str) -> Option<Self> {
        let name = if token.starts_with('L') && token.ends_with(';') {
            parse_class(token, SignaturePattern::Class).ok()?
        } else {
            token.to_string()
        };
        Self::ALL
            .into_iter()
            .find(|t| t.type_name() == name || t.keyword() == name)
    }

    /// Check that `raw` is a valid literal of this type and return its
    /// canonical text. Characters that are not already numeric are converted
    /// to their code point; they must fit in a single UTF-16 unit.
    pub fn canonicalize(self, raw: &str) -> Option<String> {
        let valid = match self {
            PrimitiveType::String => true,
            PrimitiveType::Long => raw.parse::<i64>().is_ok(),
            PrimitiveType::Integer => raw.parse::<i32>().is_ok(),
            PrimitiveType::Short => raw.parse::<i16>().is_ok(),
            PrimitiveType::Byte => raw.parse::<i8>().is_ok(),
            PrimitiveType::Double => parse_floating(raw).is_some(),
            PrimitiveType::Float => parse_floating(raw).is_some(),
            PrimitiveType::Boolean => {
                raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false")
            }
            PrimitiveType::Character => {
                if raw.parse::<i32>().is_ok() {
                    true
                } else {
                    let mut chars = raw.chars();
                    return match (chars.next(), chars.next()) {
                        (Some(c), None) if c.len_utf16() == 1 => Some(u32::from(c).to_string()),
                        _ => None,
                    };
                }
            }
        };
        valid.then(|| raw.to_string())
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Floating literals accept surrounding whitespace and a trailing `f`/`d`
/// suffix. The only non-numeric spellings are `NaN` and `Infinity`, case
/// sensitive and without suffix.
fn parse_floating(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return match unsigned {
            "NaN" => Some(f64::NAN),
            "Infinity" if trimmed.starts_with('-') => Some(f64::NEG_INFINITY),
            "Infinity" => Some(f64::INFINITY),
            _ => None,
        };
    }
    let body = trimmed
        .strip_suffix(['f', 'F', 'd', 'D'])
        .filter(|b| !b.is_empty() && !b.ends_with(['e', 'E', '+', '-']))
        .unwrap_or(trimmed);
    body.parse::<f64>().ok()
}

/// A scalar or array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Scalar(String),
    Array(Vec<String>),
}

impl Literal {
    /// Single-element arrays collapse to a scalar.
    fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Literal::Scalar(values.remove(0))
        } else {
            Literal::Array(values)
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::Scalar(value) => serializer.serialize_str(value),
            Literal::Array(values) => values.serialize(serializer),
        }
    }
}

/// Canonical property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(String),
    Array(Vec<String>),
    /// Any non-string type carries its type name alongside the literal.
    Typed { ty: PrimitiveType, value: Literal },
}

impl PropertyValue {
    pub fn new(ty: PrimitiveType, values: Vec<String>) -> Self {
        match (ty, Literal::from_values(values)) {
            (PrimitiveType::String, Literal::Scalar(value)) => PropertyValue::Scalar(value),
            (PrimitiveType::String, Literal::Array(values)) => PropertyValue::Array(values),
            (ty, value) => PropertyValue::Typed { ty, value },
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Scalar(value) => serializer.serialize_str(value),
            PropertyValue::Array(values) => values.serialize(serializer),
            PropertyValue::Typed { ty, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", ty.type_name())?;
                map.serialize_entry("value", value)?;
                map.end()
            }
        }
    }
}

/// Slots consulted, in order, for a property's value. The first present
/// one wins.
const VALUE_SLOTS: [(&str, Option<PrimitiveType>); 10] = [
    ("value", None),
    ("values", None), // deprecated alias of `value`
    ("longValue", Some(PrimitiveType::Long)),
    ("doubleValue", Some(PrimitiveType::Double)),
    ("floatValue", Some(PrimitiveType::Float)),
    ("intValue", Some(PrimitiveType::Integer)),
    ("byteValue", Some(PrimitiveType::Byte)),
    ("charValue", Some(PrimitiveType::Character)),
    ("booleanValue", Some(PrimitiveType::Boolean)),
    ("shortValue", Some(PrimitiveType::Short)),
];

/// Why a property could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    MissingName,
    MissingValue { name: String },
    UnknownType { name: String, token: String },
    InvalidValue { name: String, ty: PrimitiveType, value: String },
    Attribute(AttrError),
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::MissingName => write!(f, "property without a name"),
            PropertyError::MissingValue { name } => {
                write!(f, "missing value for property \"{}\"", name)
            }
            PropertyError::UnknownType { name, token } => {
                write!(f, "invalid type {} for property \"{}\"", token, name)
            }
            PropertyError::InvalidValue { name, ty, value } => write!(
                f,
                "property \"{}\" does not contain a valid {} value ({})",
                name, ty, value
            ),
            PropertyError::Attribute(err) => write!(f, "{}", err),
        }
    }
}

impl From<AttrError> for PropertyError {
    fn from(err: AttrError) -> Self {
        PropertyError::Attribute(err)
    }
}

/// Ordered property name to canonical value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a table from nested property annotations.
    pub fn parse(properties: &[Attributes]) -> Result<Self, PropertyError> {
        let mut table = Self::new();
        for property in properties {
            let (name, value) = parse_property(property)?;
            table.insert(name, value);
        }
        Ok(table)
    }

    /// Canonical JSON text of the table.
    pub fn encode(&self) -> String {
        // Serializing strings and maps of strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for PropertyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn parse_property(property: &Attributes) -> Result<(String, PropertyValue), PropertyError> {
    let name = property.string("name")?.ok_or(PropertyError::MissingName)?;

    let declared = match property.string("type")? {
        None => PrimitiveType::String,
        Some(token) => PrimitiveType::resolve(&token).ok_or_else(|| PropertyError::UnknownType {
            name: name.clone(),
            token,
        })?,
    };

    for (slot, fixed) in VALUE_SLOTS {
        let Some(raw) = property.strings(slot)? else {
            continue;
        };
        let ty = fixed.unwrap_or(declared);
        let values = raw
            .into_iter()
            .map(|value| {
                ty.canonicalize(&value)
                    .ok_or_else(|| PropertyError::InvalidValue {
                        name: name.clone(),
                        ty,
                        value,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((name, PropertyValue::new(ty, values)));
    }

    Err(PropertyError::MissingValue { name })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::annotation::AttrValue;

    fn property(name: &str, slot: &str, values: &[&str]) -> Attributes {
        Attributes::new()
            .with("name", AttrValue::Str(name.to_string()))
            .with(
                slot,
                AttrValue::StrArray(values.iter().map(|v| v.to_string()).collect()),
            )
    }

    #[test]
    fn test_string_values_encode_raw() {
        let table = PropertyTable::parse(&[
            property("single", "value", &["a"]),
            property("many", "value", &["a", "b"]),
        ])
        .unwrap();
        assert_eq!(table.encode(), r#"{"single":"a","many":["a","b"]}"#);
    }

    #[test]
    fn test_typed_values_encode_as_object() {
        let long_array = property("x", "values", &["1", "2"])
            .with("type", AttrValue::Str("Ljava/lang/Long;".to_string()));
        let table = PropertyTable::parse(&[long_array, property("b", "booleanValue", &["TRUE"])])
            .unwrap();
        assert_eq!(
            table.encode(),
            r#"{"x":{"type":"java.lang.Long","value":["1","2"]},"b":{"type":"java.lang.Boolean","value":"TRUE"}}"#
        );
    }

    #[test]
    fn test_encoding_is_stable() {
        let input = [property("x", "values", &["1", "2"])
            .with("type", AttrValue::Str("java.lang.Long".to_string()))];
        let first = PropertyTable::parse(&input).unwrap().encode();
        let second = PropertyTable::parse(&input).unwrap().encode();
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_present_slot_wins() {
        let both = property("p", "intValue", &["7"]).with("value", AttrValue::Str("v".into()));
        let table = PropertyTable::parse(&[both]).unwrap();
        assert_eq!(table.get("p"), Some(&PropertyValue::Scalar("v".to_string())));
    }

    #[test]
    fn test_character_values() {
        let table = PropertyTable::parse(&[property("c", "charValue", &["A", "66"])]).unwrap();
        assert_eq!(
            table.get("c"),
            Some(&PropertyValue::Typed {
                ty: PrimitiveType::Character,
                value: Literal::Array(vec!["65".to_string(), "66".to_string()]),
            })
        );

        let err = PropertyTable::parse(&[property("c", "charValue", &["AB"])]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "property \"c\" does not contain a valid java.lang.Character value (AB)"
        );
    }

    #[test]
    fn test_numeric_validation() {
        let err = PropertyTable::parse(&[property("n", "longValue", &["1", "abc"])]).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValue { ref name, .. } if name == "n"));

        assert!(PropertyTable::parse(&[property("b", "byteValue", &["128"])]).is_err());
        assert!(PropertyTable::parse(&[property("s", "shortValue", &["-32768"])]).is_ok());
        assert!(PropertyTable::parse(&[property("d", "doubleValue", &["1.5e3", "2d"])]).is_ok());
        assert!(PropertyTable::parse(&[property("f", "floatValue", &["x1"])]).is_err());
        assert!(PropertyTable::parse(&[property("z", "booleanValue", &["yes"])]).is_err());
    }

    #[test]
    fn test_floating_special_values() {
        for ty in [PrimitiveType::Float, PrimitiveType::Double] {
            for accepted in ["NaN", "Infinity", "-Infinity", "+NaN", " 1.5f "] {
                assert!(ty.canonicalize(accepted).is_some(), "{} {}", ty, accepted);
            }
            for rejected in ["nan", "NAN", "infinity", "inf", "-inf", "Infinityf", "NaNd"] {
                assert!(ty.canonicalize(rejected).is_none(), "{} {}", ty, rejected);
            }
        }
    }

    #[test]
    fn test_character_outside_basic_plane() {
        assert_eq!(PrimitiveType::Character.canonicalize("é"), Some("233".to_string()));
        assert_eq!(PrimitiveType::Character.canonicalize("\u{1F600}"), None);
    }

    #[test]
    fn test_missing_value_and_unknown_type() {
        let no_value = Attributes::new().with("name", AttrValue::Str("p".into()));
        assert_eq!(
            PropertyTable::parse(&[no_value]).unwrap_err(),
            PropertyError::MissingValue {
                name: "p".to_string()
            }
        );

        let bad_type = property("p", "value", &["1"])
            .with("type", AttrValue::Str("Ljava/util/Date;".into()));
        assert!(matches!(
            PropertyTable::parse(&[bad_type]).unwrap_err(),
            PropertyError::UnknownType { .. }
        ));
    }

    #[test]
    fn test_resolve_type_tokens() {
        assert_eq!(PrimitiveType::resolve("Ljava/lang/Short;"), Some(PrimitiveType::Short));
        assert_eq!(PrimitiveType::resolve("java.lang.Integer"), Some(PrimitiveType::Integer));
        assert_eq!(PrimitiveType::resolve("char"), Some(PrimitiveType::Character));
        assert_eq!(PrimitiveType::resolve("java.lang.Object"), None);
    }

    #[test]
    fn test_duplicate_property_keeps_position() {
        let table = PropertyTable::parse(&[
            property("a", "value", &["1"]),
            property("b", "value", &["2"]),
            property("a", "value", &["3"]),
        ])
        .unwrap();
        assert_eq!(table.encode(), r#"{"a":"3","b":"2"}"#);
    }
}
