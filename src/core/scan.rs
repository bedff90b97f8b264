//! Scanner records.
//!
//! Class-file scanning happens outside this crate. The scanner hands over one
//! JSON record per class, which [`replay`] feeds to an [`AnnotationCollector`]
//! in the event order the collector expects.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use super::{
    annotation::{AnnotationKind, Attributes},
    collector::AnnotationCollector,
};
use crate::error::CompileResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Simple or fully qualified annotation name.
    pub kind: String,
    #[serde(default)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub kind: MemberKind,
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<ClassRecord>),
    One(Box<ClassRecord>),
}

/// Drive `collector` through one class. Returns what
/// [`AnnotationCollector::finalize_class`] returns.
pub fn replay(record: &ClassRecord, collector: &mut AnnotationCollector<'_>) -> CompileResult<bool> {
    collector.begin_class(&record.name);
    collector.declare_interfaces(record.interfaces.as_slice());

    for member in &record.members {
        match member.kind {
            MemberKind::Field => collector.visit_field(&member.name, &member.signature),
            MemberKind::Method => collector.visit_method(&member.name, &member.signature),
        }
        visit_all(collector, &member.annotations)?;
    }

    collector.leave_member();
    visit_all(collector, &record.annotations)?;

    collector.finalize_class()
}

fn visit_all(collector: &mut AnnotationCollector<'_>, annotations: &[AnnotationRecord]) -> CompileResult<()> {
    for annotation in annotations {
        match AnnotationKind::from_name(&annotation.kind) {
            Some(kind) => collector.visit_annotation(kind, &annotation.attrs)?,
            None => debug!(annotation = %annotation.kind, "ignoring foreign annotation"),
        }
    }
    Ok(())
}

/// Parse a record file holding either one record or an array of them.
pub fn parse_records(content: &str) -> serde_json::Result<Vec<ClassRecord>> {
    Ok(match serde_json::from_str(content)? {
        RecordFile::Many(records) => records,
        RecordFile::One(record) => vec![*record],
    })
}

/// Collect `*.json` record files under `paths`. Files given explicitly are
/// taken as-is; directories are walked recursively. The result is sorted
/// per input path so builds are reproducible.
pub fn find_record_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json") {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Load every record reachable from `paths`, in file order.
pub fn load_records(paths: &[PathBuf]) -> Result<Vec<ClassRecord>> {
    let mut records = Vec::new();
    for file in find_record_files(paths)? {
        records.extend(read_record_file(&file)?);
    }
    Ok(records)
}

fn read_record_file(path: &Path) -> Result<Vec<ClassRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = parse_records(&content)
        .with_context(|| format!("Failed to parse class records: {}", path.display()))?;
    debug!(file = %path.display(), count = records.len(), "loaded class records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::core::{
        annotation::AttrValue,
        entry::EntryParam,
        filter::LdapFilterVerifier,
    };

    const RECORD: &str = r#"{
        "name": "com.acme.Impl",
        "interfaces": ["com.acme.Api"],
        "members": [
            {
                "kind": "field",
                "name": "bar",
                "signature": "Lcom/acme/Bar;",
                "annotations": [{ "kind": "ServiceDependency", "attrs": { "required": false } }]
            },
            {
                "kind": "method",
                "name": "toString",
                "signature": "()Ljava/lang/String;",
                "annotations": [{ "kind": "java.lang.Override" }]
            }
        ],
        "annotations": [{ "kind": "dm.annotation.api.Component", "attrs": {} }]
    }"#;

    #[test]
    fn test_parse_single_and_array() {
        let one = parse_records(RECORD).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].members[0].kind, MemberKind::Field);
        assert_eq!(
            one[0].members[0].annotations[0].attrs.get("required"),
            Some(&AttrValue::Bool(false))
        );

        let many = parse_records(&format!("[{}, {}]", RECORD, RECORD)).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_attribute_shapes() {
        let attrs: Attributes = serde_json::from_str(
            r#"{ "ranking": 3, "big": 5000000000, "provides": ["La;"], "properties": [{ "name": "p", "value": "v" }] }"#,
        )
        .unwrap();
        assert_eq!(attrs.get("ranking"), Some(&AttrValue::Int(3)));
        assert_eq!(attrs.get("big"), Some(&AttrValue::Long(5_000_000_000)));
        assert_eq!(attrs.strings("provides").unwrap(), Some(vec!["La;".to_string()]));
        assert_eq!(attrs.nested("properties").unwrap().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_replay_compiles_class() {
        let record = &parse_records(RECORD).unwrap()[0];
        let mut collector = AnnotationCollector::new(&LdapFilterVerifier);

        assert!(replay(record, &mut collector).unwrap());
        assert_eq!(
            collector.emit(),
            "Component impl=\"com.acme.Impl\" provides=\"com.acme.Api\"\nServiceDependency service=\"com.acme.Bar\" autoConfig=\"bar\" required=\"false\"\n"
        );
        assert_eq!(
            collector.auxiliary_entries()[0].text(EntryParam::Required),
            Some("false")
        );
    }

    #[test]
    fn test_replay_unannotated_class() {
        let record: ClassRecord = serde_json::from_str(r#"{ "name": "com.acme.Plain" }"#).unwrap();
        let mut collector = AnnotationCollector::new(&LdapFilterVerifier);
        assert!(!replay(&record, &mut collector).unwrap());
    }

    #[test]
    fn test_find_record_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), RECORD).unwrap();
        fs::write(dir.path().join("nested").join("a.json"), RECORD).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = find_record_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.json"));

        let records = load_records(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_path_fails() {
        let dir = tempdir().unwrap();
        let err = find_record_files(&[dir.path().join("nope")]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_bad_json_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_records(&[path]).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
