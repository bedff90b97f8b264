//! Per-class state accumulated by the collector.

use std::collections::{BTreeSet, HashSet};

use crate::core::entry::{Entry, EntryParam};

/// The member most recently reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberContext {
    pub name: String,
    /// Raw JVM descriptor.
    pub signature: String,
    pub is_field: bool,
}

/// What is known about the class being compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassContext {
    pub name: String,
    /// Implemented interfaces, dotted, ignored ones removed.
    pub interfaces: Vec<String>,
    pub member: Option<MemberContext>,
}

/// Callback and injection names recorded by simple annotations, waiting to
/// be copied into the next primary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingCallbacks {
    pub init: Option<String>,
    pub start: Option<String>,
    pub registered: Option<String>,
    pub stop: Option<String>,
    pub unregistered: Option<String>,
    pub destroy: Option<String>,
    pub composition: Option<String>,
    pub starter: Option<String>,
    pub stopper: Option<String>,
    pub bundle_context_field: Option<String>,
    pub dependency_manager_field: Option<String>,
    pub component_field: Option<String>,
}

impl PendingCallbacks {
    /// Parameters in descriptor order.
    fn params(&self) -> [(EntryParam, &Option<String>); 12] {
        [
            (EntryParam::Init, &self.init),
            (EntryParam::Start, &self.start),
            (EntryParam::Registered, &self.registered),
            (EntryParam::Stop, &self.stop),
            (EntryParam::Unregistered, &self.unregistered),
            (EntryParam::Destroy, &self.destroy),
            (EntryParam::Composition, &self.composition),
            (EntryParam::Starter, &self.starter),
            (EntryParam::Stopper, &self.stopper),
            (EntryParam::BundleContextField, &self.bundle_context_field),
            (EntryParam::DependencyManagerField, &self.dependency_manager_field),
            (EntryParam::ComponentField, &self.component_field),
        ]
    }

    /// Copy every recorded name into `entry`.
    pub fn copy_into(&self, entry: &mut Entry) {
        for (param, value) in self.params() {
            if let Some(value) = value {
                entry.put(param, value.clone());
            }
        }
    }
}

/// Dependency names used so far in the current class.
#[derive(Debug, Clone, Default)]
pub struct DependencyNameRegistry {
    names: HashSet<String>,
}

impl DependencyNameRegistry {
    /// Returns false if the name was already taken.
    pub fn register(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

/// Service type names consumed and provided across a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNameSets {
    pub imported: BTreeSet<String>,
    pub exported: BTreeSet<String>,
}

impl ServiceNameSets {
    pub fn merge(&mut self, other: ServiceNameSets) {
        self.imported.extend(other.imported);
        self.exported.extend(other.exported);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::EntryType;

    #[test]
    fn test_pending_copy_order() {
        let pending = PendingCallbacks {
            stop: Some("halt".to_string()),
            init: Some("setup".to_string()),
            component_field: Some("self".to_string()),
            ..Default::default()
        };
        let mut entry = Entry::new(EntryType::Component);
        pending.copy_into(&mut entry);

        let keys: Vec<_> = entry.params().iter().map(|(p, _)| *p).collect();
        assert_eq!(
            keys,
            vec![EntryParam::Init, EntryParam::Stop, EntryParam::ComponentField]
        );
    }

    #[test]
    fn test_dependency_names_are_unique() {
        let mut names = DependencyNameRegistry::default();
        assert!(names.register("log"));
        assert!(!names.register("log"));
        names.clear();
        assert!(names.register("log"));
    }

    #[test]
    fn test_service_sets_merge() {
        let mut sets = ServiceNameSets::default();
        sets.exported.insert("a.A".to_string());
        let mut other = ServiceNameSets::default();
        other.exported.insert("a.A".to_string());
        other.imported.insert("b.B".to_string());

        sets.merge(other);
        assert_eq!(sets.exported.len(), 1);
        assert!(sets.imported.contains("b.B"));
    }
}
