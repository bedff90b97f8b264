//! Annotation collector: compiles one class's annotations into descriptor
//! entries.
//!
//! The scanner drives the collector with a fixed event sequence:
//!
//! ```text
//! begin_class
//! declare_interfaces
//! (visit_method | visit_field) visit_annotation*   -- repeated per member
//! leave_member visit_annotation*                    -- class-level annotations
//! finalize_class
//! emit
//! ```
//!
//! Simple lifecycle annotations (`Init`, `Start`, `Inject`, ...) only record a
//! name in [`PendingCallbacks`]. Entry-producing annotations build an
//! [`Entry`]; the primary ones copy the pending callbacks recorded *so far*,
//! so they must be visited after the callback annotations they should
//! capture. Class-level annotations come last in class-file order, which
//! satisfies this.
//!
//! # Usage
//!
//! ```ignore
//! let mut collector = AnnotationCollector::new(&LdapFilterVerifier);
//! collector.begin_class("com.acme.Impl");
//! collector.declare_interfaces(&["com.acme.Api"]);
//! collector.leave_member();
//! collector.visit_annotation(AnnotationKind::Component, &Attributes::new())?;
//! if collector.finalize_class()? {
//!     print!("{}", collector.emit());
//! }
//! ```

mod handlers;
mod state;


use std::{collections::BTreeSet, mem};

use glob::Pattern;
use tracing::{debug, info};

pub use state::{
    ClassContext, DependencyNameRegistry, MemberContext, PendingCallbacks, ServiceNameSets,
};

use crate::{
    core::{
        annotation::{AnnotationKind, AttrError, Attributes},
        entry::{Entry, EntryError, EntryType},
        filter::FilterVerifier,
        metatype::{MetaTypeError, MetaTypeRegistry},
        property::PropertyError,
        signature::SignatureMismatch,
        writer::render_descriptor,
    },
    error::{CompileError, CompileResult, ErrorKind, ErrorSite},
};

const PRIMARY_TYPES: [EntryType; 6] = [
    EntryType::Component,
    EntryType::AspectService,
    EntryType::AdapterService,
    EntryType::BundleAdapterService,
    EntryType::ResourceAdapterService,
    EntryType::FactoryConfigurationAdapterService,
];

pub struct AnnotationCollector<'a> {
    filters: &'a dyn FilterVerifier,
    ignored_interfaces: &'a [Pattern],

    // === Per-class state, reset by begin_class ===
    class: ClassContext,
    pending: PendingCallbacks,
    dependency_names: DependencyNameRegistry,
    /// The single service-bearing entry.
    primary: Option<Entry>,
    /// Dependency entries in discovery order.
    auxiliary: Vec<Entry>,
    last_created: Option<EntryType>,
    /// Whether any recognized annotation was seen.
    annotated: bool,
    /// Services and MetaType data found in the current class. Committed to
    /// the build-wide state only when the class finalizes successfully.
    class_services: ServiceNameSets,
    class_metatype: MetaTypeRegistry,
    /// First error raised by an annotation of the current class.
    failure: Option<CompileError>,

    // === Accumulated across finalized classes ===
    services: ServiceNameSets,
    metatype: MetaTypeRegistry,
}

impl<'a> AnnotationCollector<'a> {
    pub fn new(filters: &'a dyn FilterVerifier) -> Self {
        Self {
            filters,
            ignored_interfaces: &[],
            class: ClassContext::default(),
            pending: PendingCallbacks::default(),
            dependency_names: DependencyNameRegistry::default(),
            primary: None,
            auxiliary: Vec::new(),
            last_created: None,
            annotated: false,
            class_services: ServiceNameSets::default(),
            class_metatype: MetaTypeRegistry::new(),
            failure: None,
            services: ServiceNameSets::default(),
            metatype: MetaTypeRegistry::new(),
        }
    }

    /// Interfaces matching any of `patterns` are dropped by
    /// [`declare_interfaces`](Self::declare_interfaces).
    pub fn with_ignored_interfaces(mut self, patterns: &'a [Pattern]) -> Self {
        self.ignored_interfaces = patterns;
        self
    }

    pub fn begin_class(&mut self, name: &str) {
        debug!(class = name, "class begin");
        self.class = ClassContext {
            name: name.replace('/', "."),
            ..Default::default()
        };
        self.pending = PendingCallbacks::default();
        self.dependency_names.clear();
        self.primary = None;
        self.auxiliary.clear();
        self.last_created = None;
        self.annotated = false;
        self.class_services = ServiceNameSets::default();
        self.class_metatype = MetaTypeRegistry::new();
        self.failure = None;
    }

    pub fn declare_interfaces<S: AsRef<str>>(&mut self, names: &[S]) {
        let ignored = self.ignored_interfaces;
        self.class.interfaces = names
            .iter()
            .map(|name| name.as_ref().replace('/', "."))
            .filter(|name| !ignored.iter().any(|p| p.matches(name)))
            .collect();
        debug!(class = %self.class.name, interfaces = ?self.class.interfaces, "implements");
    }

    pub fn visit_method(&mut self, name: &str, signature: &str) {
        debug!(method = name, signature, "parsed method");
        self.class.member = Some(MemberContext {
            name: name.to_string(),
            signature: signature.to_string(),
            is_field: false,
        });
    }

    pub fn visit_field(&mut self, name: &str, signature: &str) {
        debug!(field = name, signature, "parsed field");
        self.class.member = Some(MemberContext {
            name: name.to_string(),
            signature: signature.to_string(),
            is_field: true,
        });
    }

    /// Forget the current member; following annotations apply to the class.
    pub fn leave_member(&mut self) {
        self.class.member = None;
    }

    /// Dispatch one annotation occurrence on the current member (or class).
    ///
    /// An error fails the whole class: [`finalize_class`](Self::finalize_class)
    /// reports it again even if later annotations succeed.
    pub fn visit_annotation(&mut self, kind: AnnotationKind, attrs: &Attributes) -> CompileResult<()> {
        debug!(annotation = %kind, class = %self.class.name, "parsing annotation");
        self.annotated = true;

        let result = self.dispatch(kind, attrs);
        if let Err(err) = &result
            && self.failure.is_none()
        {
            self.failure = Some(err.clone());
        }
        result
    }

    fn dispatch(&mut self, kind: AnnotationKind, attrs: &Attributes) -> CompileResult<()> {
        match kind {
            AnnotationKind::Component => self.parse_component(attrs),
            AnnotationKind::AspectService => self.parse_aspect_service(attrs),
            AnnotationKind::AdapterService => self.parse_adapter_service(attrs),
            AnnotationKind::BundleAdapterService => self.parse_bundle_adapter_service(attrs),
            AnnotationKind::ResourceAdapterService => self.parse_resource_adapter_service(attrs),
            AnnotationKind::FactoryConfigurationAdapterService => {
                self.parse_factory_configuration_adapter_service(attrs)
            }
            AnnotationKind::ServiceDependency => self.parse_service_dependency(attrs),
            AnnotationKind::ConfigurationDependency => self.parse_configuration_dependency(attrs),
            AnnotationKind::BundleDependency => self.parse_bundle_dependency(attrs),
            AnnotationKind::ResourceDependency => self.parse_resource_dependency(attrs),
            AnnotationKind::Init => {
                self.pending.init = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Start => {
                self.pending.start = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Registered => {
                self.pending.registered = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Stop => {
                self.pending.stop = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Unregistered => {
                self.pending.unregistered = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Destroy => {
                self.pending.destroy = Some(self.method_name(kind)?);
                Ok(())
            }
            AnnotationKind::Composition => self.parse_composition(),
            AnnotationKind::LifecycleController => self.parse_lifecycle_controller(attrs),
            AnnotationKind::Inject => self.parse_inject(),
        }
    }

    /// Finish the class. Returns `Ok(true)` when a descriptor is ready, in
    /// which case the class's imported/exported services and MetaType data
    /// join the accumulated state. A class that fails contributes nothing.
    ///
    /// A class carrying no recognized annotation at all is deliberately not
    /// an error: it yields `Ok(false)`, so a scanner can hand over every class
    /// of a bundle and only the annotated ones produce descriptors.
    ///
    /// Fails when annotations were found but the last entry created is not a
    /// primary one (which covers annotated classes with no entry at all).
    pub fn finalize_class(&mut self) -> CompileResult<bool> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if !self.annotated {
            info!(class = %self.class.name, "no components found");
            return Ok(false);
        }

        let primary_last = self.last_created.is_some_and(EntryType::is_primary);
        if !primary_last || self.primary.is_none() {
            let types: Vec<&str> = PRIMARY_TYPES.iter().map(|t| t.as_str()).collect();
            return Err(CompileError::new(
                ErrorKind::Structural,
                ErrorSite::class(&self.class.name),
                format!(
                    "the class must be annotated with either one of the following types: [{}]",
                    types.join(", ")
                ),
            ));
        }

        info!(
            class = %self.class.name,
            descriptor = %self.emit().trim_end(),
            "parsed annotations"
        );
        self.services.merge(mem::take(&mut self.class_services));
        self.metatype.merge(mem::take(&mut self.class_metatype));
        Ok(true)
    }

    /// Descriptor text for the current class: the primary entry, then the
    /// other entries in reverse discovery order. Empty when there is no
    /// primary entry.
    pub fn emit(&self) -> String {
        match &self.primary {
            Some(primary) => render_descriptor(primary, &self.auxiliary),
            None => String::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn primary_entry(&self) -> Option<&Entry> {
        self.primary.as_ref()
    }

    /// Dependency entries in discovery order.
    pub fn auxiliary_entries(&self) -> &[Entry] {
        &self.auxiliary
    }

    /// Service types required by the dependencies of finalized classes.
    pub fn imported_services(&self) -> &BTreeSet<String> {
        &self.services.imported
    }

    /// Service types provided by the primary entries of finalized classes.
    pub fn exported_services(&self) -> &BTreeSet<String> {
        &self.services.exported
    }

    /// MetaType data of finalized classes.
    pub fn metatype(&self) -> &MetaTypeRegistry {
        &self.metatype
    }

    /// Give up the accumulated service sets and MetaType registry.
    pub fn into_parts(self) -> (ServiceNameSets, MetaTypeRegistry) {
        (self.services, self.metatype)
    }

    // ============================================================
    // Shared helpers for handlers
    // ============================================================

    fn site(&self, kind: AnnotationKind) -> ErrorSite {
        ErrorSite {
            class: self.class.name.clone(),
            member: self.class.member.as_ref().map(|m| m.name.clone()),
            annotation: Some(kind),
        }
    }

    fn fail(&self, error: ErrorKind, kind: AnnotationKind, message: impl Into<String>) -> CompileError {
        CompileError::new(error, self.site(kind), message)
    }

    fn attr_error(&self, kind: AnnotationKind, err: AttrError) -> CompileError {
        self.fail(ErrorKind::Value, kind, err.to_string())
    }

    fn signature_error(&self, kind: AnnotationKind, err: SignatureMismatch) -> CompileError {
        self.fail(ErrorKind::Signature, kind, err.to_string())
    }

    fn entry_error(&self, kind: AnnotationKind, err: EntryError) -> CompileError {
        match err {
            EntryError::Attribute(err) => self.attr_error(kind, err),
            EntryError::Signature(err) => self.signature_error(kind, err),
        }
    }

    fn property_error(&self, kind: AnnotationKind, err: PropertyError) -> CompileError {
        self.fail(ErrorKind::Value, kind, err.to_string())
    }

    fn metatype_error(&self, kind: AnnotationKind, err: MetaTypeError) -> CompileError {
        self.fail(ErrorKind::Value, kind, err.to_string())
    }

    /// Name of the current member, which must be a method.
    fn method_name(&self, kind: AnnotationKind) -> CompileResult<String> {
        match &self.class.member {
            Some(member) if !member.is_field => Ok(member.name.clone()),
            _ => Err(self.fail(
                ErrorKind::Signature,
                kind,
                format!("@{} must be applied on a method", kind),
            )),
        }
    }

    /// The current member, which must be a field.
    fn field(&self, kind: AnnotationKind) -> CompileResult<&MemberContext> {
        match &self.class.member {
            Some(member) if member.is_field => Ok(member),
            _ => Err(self.fail(
                ErrorKind::Signature,
                kind,
                format!("@{} must be applied on a field", kind),
            )),
        }
    }

    /// The current member, field or method.
    fn member(&self, kind: AnnotationKind) -> CompileResult<&MemberContext> {
        self.class.member.as_ref().ok_or_else(|| {
            self.fail(
                ErrorKind::Signature,
                kind,
                format!("@{} must be applied on a field or a method", kind),
            )
        })
    }

    fn push_entry(&mut self, kind: AnnotationKind, entry: Entry) -> CompileResult<()> {
        let entry_type = entry.entry_type();
        if entry_type.is_primary() {
            if let Some(existing) = &self.primary {
                return Err(self.fail(
                    ErrorKind::Structural,
                    kind,
                    format!(
                        "a class may declare only one service; already declared as {}",
                        existing.entry_type()
                    ),
                ));
            }
            self.primary = Some(entry);
        } else {
            self.auxiliary.push(entry);
        }
        self.last_created = Some(entry_type);
        Ok(())
    }
}
