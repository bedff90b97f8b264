//! One handler per annotation kind.
//!
//! Attribute order within each entry is part of the descriptor format; the
//! handlers write parameters in a fixed order per kind.

use tracing::info;

use super::AnnotationCollector;
use crate::{
    core::{
        annotation::{AnnotationKind, Attributes},
        entry::{Entry, EntryParam, EntryType},
        metatype::parse_metatype,
        property::PropertyTable,
        signature::{SignaturePattern, check_field, check_method, parse_class},
    },
    error::{CompileResult, ErrorKind},
};

/// Installed, resolved and active bundle states (2 | 4 | 32).
const DEFAULT_STATE_MASK: &str = "38";

/// Type registered when a component declares a factory set.
const FACTORY_SET_SERVICE: &str = "java.util.Set";

impl AnnotationCollector<'_> {
    // ============================================================
    // Primary entries
    // ============================================================

    pub(super) fn parse_component(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::Component;
        let mut entry = Entry::new(EntryType::Component);
        self.add_common_params(kind, &mut entry)?;

        entry.put(EntryParam::Impl, self.class.name.clone());
        self.put_properties(kind, attrs, &mut entry)?;
        self.put_provides(kind, attrs, &mut entry)?;

        let factory_set = entry
            .put_string(attrs, EntryParam::FactorySet, None)
            .map_err(|e| self.attr_error(kind, e))?;
        if factory_set.is_some() {
            // The factory set itself is published as a service.
            self.class_services.exported.insert(FACTORY_SET_SERVICE.to_string());
        }
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::FactoryConfigure, EntryParam::FactoryMethod])?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_aspect_service(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::AspectService;
        let mut entry = Entry::new(EntryType::AspectService);
        self.add_common_params(kind, &mut entry)?;

        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;

        let ranking = attrs
            .int(EntryParam::Ranking.as_str())
            .map_err(|e| self.attr_error(kind, e))?
            .ok_or_else(|| self.fail(ErrorKind::Value, kind, "missing ranking attribute"))?;
        entry.put(EntryParam::Ranking, ranking.to_string());

        entry.put(EntryParam::Impl, self.class.name.clone());
        self.put_properties(kind, attrs, &mut entry)?;
        self.put_callback_methods(kind, attrs, &mut entry)?;

        if attrs.contains(EntryParam::Service.as_str()) {
            entry
                .put_class(attrs, EntryParam::Service, None)
                .map_err(|e| self.entry_error(kind, e))?;
        } else {
            let service = match self.class.interfaces.as_slice() {
                [single] => single.clone(),
                [] => {
                    return Err(self.fail(
                        ErrorKind::State,
                        kind,
                        "the service attribute has not been set and the class does not implement any interfaces",
                    ));
                }
                many => {
                    return Err(self.fail(
                        ErrorKind::State,
                        kind,
                        format!(
                            "the service attribute has not been set and the class implements more than one interface ({})",
                            many.join(", ")
                        ),
                    ));
                }
            };
            entry.put(EntryParam::Service, service);
        }

        self.put_strings(kind, attrs, &mut entry, &[EntryParam::FactoryMethod])?;
        self.push_entry(kind, entry)
    }

    pub(super) fn parse_adapter_service(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::AdapterService;
        let mut entry = Entry::new(EntryType::AdapterService);
        self.add_common_params(kind, &mut entry)?;

        entry.put(EntryParam::Impl, self.class.name.clone());
        self.put_filter(kind, attrs, &mut entry, EntryParam::AdapteeFilter)?;
        entry
            .put_class(attrs, EntryParam::AdapteeService, None)
            .map_err(|e| self.entry_error(kind, e))?;
        self.put_properties(kind, attrs, &mut entry)?;
        self.put_provides(kind, attrs, &mut entry)?;
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::FactoryMethod])?;
        self.put_callback_methods(kind, attrs, &mut entry)?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_bundle_adapter_service(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::BundleAdapterService;
        let mut entry = Entry::new(EntryType::BundleAdapterService);
        self.add_common_params(kind, &mut entry)?;

        entry.put(EntryParam::Impl, self.class.name.clone());
        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;
        entry
            .put_string(attrs, EntryParam::StateMask, Some(DEFAULT_STATE_MASK))
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_properties(kind, attrs, &mut entry)?;
        self.put_provides(kind, attrs, &mut entry)?;
        entry
            .put_string(attrs, EntryParam::Propagate, Some("false"))
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::FactoryMethod])?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_resource_adapter_service(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::ResourceAdapterService;
        let mut entry = Entry::new(EntryType::ResourceAdapterService);
        self.add_common_params(kind, &mut entry)?;

        entry.put(EntryParam::Impl, self.class.name.clone());
        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;
        self.put_properties(kind, attrs, &mut entry)?;
        self.put_provides(kind, attrs, &mut entry)?;
        entry
            .put_string(attrs, EntryParam::Propagate, Some("false"))
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::Changed])?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_factory_configuration_adapter_service(
        &mut self,
        attrs: &Attributes,
    ) -> CompileResult<()> {
        let kind = AnnotationKind::FactoryConfigurationAdapterService;
        let mut entry = Entry::new(EntryType::FactoryConfigurationAdapterService);
        self.add_common_params(kind, &mut entry)?;

        entry.put(EntryParam::Impl, self.class.name.clone());
        let class_name = self.class.name.clone();
        let factory_pid = entry
            .put_string(attrs, EntryParam::FactoryPid, Some(&class_name))
            .map_err(|e| self.attr_error(kind, e))?
            .unwrap_or(class_name);
        entry
            .put_string(attrs, EntryParam::Updated, Some("updated"))
            .map_err(|e| self.attr_error(kind, e))?;
        entry
            .put_string(attrs, EntryParam::Propagate, Some("false"))
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_provides(kind, attrs, &mut entry)?;
        self.put_properties(kind, attrs, &mut entry)?;
        self.parse_metatypes(kind, attrs, &factory_pid, true)?;
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::FactoryMethod])?;

        self.push_entry(kind, entry)
    }

    // ============================================================
    // Dependency entries
    // ============================================================

    pub(super) fn parse_service_dependency(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::ServiceDependency;
        let mut entry = Entry::new(EntryType::ServiceDependency);

        let service = match attrs
            .string(EntryParam::Service.as_str())
            .map_err(|e| self.attr_error(kind, e))?
        {
            Some(descriptor) => parse_class(&descriptor, SignaturePattern::Class),
            None => {
                let member = self.member(kind)?;
                let pattern = if member.is_field {
                    SignaturePattern::Class
                } else {
                    SignaturePattern::BindClass
                };
                parse_class(&member.signature, pattern)
            }
        }
        .map_err(|e| self.signature_error(kind, e))?;
        entry.put(EntryParam::Service, service.clone());
        self.class_services.imported.insert(service);

        let (field, method) = self.member_names();
        if let Some(field) = &field {
            entry.put(EntryParam::AutoConfig, field.clone());
        }
        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;
        entry
            .put_class(attrs, EntryParam::DefaultImpl, None)
            .map_err(|e| self.entry_error(kind, e))?;
        entry
            .put_string(attrs, EntryParam::Added, method.as_deref())
            .map_err(|e| self.attr_error(kind, e))?;

        entry
            .put_string(attrs, EntryParam::Timeout, None)
            .map_err(|e| self.attr_error(kind, e))?;
        let timeout = attrs
            .int(EntryParam::Timeout.as_str())
            .map_err(|e| self.attr_error(kind, e))?;
        if let Some(timeout) = timeout.filter(|t| *t < -1) {
            return Err(self.fail(ErrorKind::Value, kind, format!("invalid timeout value {}", timeout)));
        }

        self.put_strings(kind, attrs, &mut entry, &[EntryParam::Required, EntryParam::Changed, EntryParam::Removed])?;
        self.put_dependency_name(kind, attrs, &mut entry)?;
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::Propagate])?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_configuration_dependency(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::ConfigurationDependency;
        let method = self.method_name(kind)?;
        let mut entry = Entry::new(EntryType::ConfigurationDependency);

        let class_name = self.class.name.clone();
        let pid = entry
            .put_string(attrs, EntryParam::Pid, Some(&class_name))
            .map_err(|e| self.attr_error(kind, e))?
            .unwrap_or(class_name);
        entry.put(EntryParam::Updated, method);
        self.put_strings(kind, attrs, &mut entry, &[EntryParam::Propagate])?;
        self.parse_metatypes(kind, attrs, &pid, false)?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_bundle_dependency(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::BundleDependency;
        let mut entry = Entry::new(EntryType::BundleDependency);

        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;
        let (_, method) = self.member_names();
        entry
            .put_string(attrs, EntryParam::Added, method.as_deref())
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_strings(
            kind,
            attrs,
            &mut entry,
            &[
                EntryParam::Changed,
                EntryParam::Removed,
                EntryParam::Required,
                EntryParam::StateMask,
                EntryParam::Propagate,
            ],
        )?;
        self.put_dependency_name(kind, attrs, &mut entry)?;

        self.push_entry(kind, entry)
    }

    pub(super) fn parse_resource_dependency(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::ResourceDependency;
        let mut entry = Entry::new(EntryType::ResourceDependency);

        self.put_filter(kind, attrs, &mut entry, EntryParam::Filter)?;
        let (field, method) = self.member_names();
        if let Some(field) = &field {
            entry.put(EntryParam::AutoConfig, field.clone());
        }
        entry
            .put_string(attrs, EntryParam::Added, method.as_deref())
            .map_err(|e| self.attr_error(kind, e))?;
        self.put_strings(
            kind,
            attrs,
            &mut entry,
            &[
                EntryParam::Changed,
                EntryParam::Removed,
                EntryParam::Required,
                EntryParam::Propagate,
                EntryParam::FactoryMethod,
            ],
        )?;
        self.put_dependency_name(kind, attrs, &mut entry)?;

        self.push_entry(kind, entry)
    }

    // ============================================================
    // Pending callback state
    // ============================================================

    pub(super) fn parse_composition(&mut self) -> CompileResult<()> {
        let kind = AnnotationKind::Composition;
        let method = self.method_name(kind)?;
        let signature = self.member(kind)?.signature.clone();
        check_method(&method, &signature, SignaturePattern::Composition)
            .map_err(|e| self.signature_error(kind, e))?;
        self.pending.composition = Some(method);
        Ok(())
    }

    pub(super) fn parse_lifecycle_controller(&mut self, attrs: &Attributes) -> CompileResult<()> {
        let kind = AnnotationKind::LifecycleController;
        let field = self.field(kind)?;
        check_field(&field.name, &field.signature, SignaturePattern::Runnable)
            .map_err(|e| self.signature_error(kind, e))?;
        let field = field.name.clone();

        let start = attrs
            .boolean(EntryParam::Start.as_str())
            .map_err(|e| self.attr_error(kind, e))?
            .unwrap_or(true);
        let slot = if start {
            &self.pending.starter
        } else {
            &self.pending.stopper
        };
        if let Some(existing) = slot {
            return Err(self.fail(
                ErrorKind::Conflict,
                kind,
                format!("lifecycle controller already defined on field {}", existing),
            ));
        }

        if start {
            self.pending.starter = Some(field);
        } else {
            self.pending.stopper = Some(field);
        }
        Ok(())
    }

    pub(super) fn parse_inject(&mut self) -> CompileResult<()> {
        let kind = AnnotationKind::Inject;
        let field = self.field(kind)?;
        let (name, signature) = (field.name.clone(), field.signature.clone());

        if SignaturePattern::BundleContext.matches(&signature) {
            self.pending.bundle_context_field = Some(name);
        } else if SignaturePattern::DependencyManager.matches(&signature) {
            self.pending.dependency_manager_field = Some(name);
        } else if SignaturePattern::Component.matches(&signature) {
            self.pending.component_field = Some(name);
        } else {
            return Err(self.fail(
                ErrorKind::Signature,
                kind,
                format!("@Inject can't be applied on the field \"{}\" of type {}", name, signature),
            ));
        }
        Ok(())
    }

    // ============================================================
    // Helpers
    // ============================================================

    /// Copy pending callbacks into a primary entry.
    fn add_common_params(&self, kind: AnnotationKind, entry: &mut Entry) -> CompileResult<()> {
        if let Some(stopper) = &self.pending.stopper
            && self.pending.starter.is_none()
        {
            return Err(self.fail(
                ErrorKind::Conflict,
                kind,
                format!(
                    "lifecycle controller {} stops the component but no lifecycle controller starts it",
                    stopper
                ),
            ));
        }
        self.pending.copy_into(entry);
        Ok(())
    }

    /// `(field, method)` name of the current member; exactly one is set when
    /// there is a member.
    fn member_names(&self) -> (Option<String>, Option<String>) {
        match &self.class.member {
            Some(member) if member.is_field => (Some(member.name.clone()), None),
            Some(member) => (None, Some(member.name.clone())),
            None => (None, None),
        }
    }

    fn put_strings(
        &self,
        kind: AnnotationKind,
        attrs: &Attributes,
        entry: &mut Entry,
        params: &[EntryParam],
    ) -> CompileResult<()> {
        for param in params {
            entry
                .put_string(attrs, *param, None)
                .map_err(|e| self.attr_error(kind, e))?;
        }
        Ok(())
    }

    fn put_filter(
        &self,
        kind: AnnotationKind,
        attrs: &Attributes,
        entry: &mut Entry,
        param: EntryParam,
    ) -> CompileResult<()> {
        let Some(filter) = attrs
            .string(param.as_str())
            .map_err(|e| self.attr_error(kind, e))?
        else {
            return Ok(());
        };
        self.filters.verify(&filter).map_err(|reason| {
            self.fail(
                ErrorKind::Signature,
                kind,
                format!("invalid filter {}: {}", filter, reason),
            )
        })?;
        entry.put(param, filter);
        Ok(())
    }

    fn put_properties(&self, kind: AnnotationKind, attrs: &Attributes, entry: &mut Entry) -> CompileResult<()> {
        let Some(properties) = attrs
            .nested(EntryParam::Properties.as_str())
            .map_err(|e| self.attr_error(kind, e))?
        else {
            return Ok(());
        };
        let table = PropertyTable::parse(properties).map_err(|e| self.property_error(kind, e))?;
        entry.put_properties(EntryParam::Properties, table);
        Ok(())
    }

    /// Write `provides` (defaulting to the implemented interfaces). A
    /// primary entry that provides nothing may not use registration
    /// callbacks.
    fn put_provides(&mut self, kind: AnnotationKind, attrs: &Attributes, entry: &mut Entry) -> CompileResult<()> {
        let count = entry
            .put_class_array(
                attrs,
                EntryParam::Provides,
                &self.class.interfaces,
                &mut self.class_services.exported,
            )
            .map_err(|e| self.entry_error(kind, e))?;
        if count == 0 {
            self.check_registration_callbacks_absent(kind)?;
        }
        Ok(())
    }

    fn check_registration_callbacks_absent(&self, kind: AnnotationKind) -> CompileResult<()> {
        for (annotation, method) in [
            ("@Registered", &self.pending.registered),
            ("@Unregistered", &self.pending.unregistered),
        ] {
            if let Some(method) = method {
                return Err(self.fail(
                    ErrorKind::State,
                    kind,
                    format!(
                        "{} (method {}) can't be used on a component which does not provide a service",
                        annotation, method
                    ),
                ));
            }
        }
        Ok(())
    }

    /// `field` and `added/changed/removed/swap` are two exclusive ways of
    /// receiving the decorated service.
    fn put_callback_methods(
        &self,
        kind: AnnotationKind,
        attrs: &Attributes,
        entry: &mut Entry,
    ) -> CompileResult<()> {
        let methods = [
            EntryParam::Added,
            EntryParam::Changed,
            EntryParam::Removed,
            EntryParam::Swap,
        ];
        if attrs.contains(EntryParam::Field.as_str())
            && methods.iter().any(|p| attrs.contains(p.as_str()))
        {
            return Err(self.fail(
                ErrorKind::Conflict,
                kind,
                "can't mix \"field\" attribute with \"added/changed/removed/swap\" attributes",
            ));
        }

        self.put_strings(kind, attrs, entry, &[EntryParam::Field])?;
        self.put_strings(kind, attrs, entry, &methods)
    }

    fn put_dependency_name(
        &mut self,
        kind: AnnotationKind,
        attrs: &Attributes,
        entry: &mut Entry,
    ) -> CompileResult<()> {
        let Some(name) = attrs
            .string(EntryParam::Name.as_str())
            .map_err(|e| self.attr_error(kind, e))?
        else {
            return Ok(());
        };
        if !self.dependency_names.register(&name) {
            return Err(self.fail(
                ErrorKind::Conflict,
                kind,
                format!("duplicate dependency name {}", name),
            ));
        }
        entry.put(EntryParam::Name, name);
        Ok(())
    }

    fn parse_metatypes(
        &mut self,
        kind: AnnotationKind,
        attrs: &Attributes,
        pid: &str,
        factory: bool,
    ) -> CompileResult<()> {
        let parsed = parse_metatype(attrs, pid, factory).map_err(|e| self.metatype_error(kind, e))?;
        if let Some((ocd, designate)) = parsed {
            self.class_metatype.add_ocd(ocd);
            self.class_metatype.add_designate(designate);
            info!(class = %self.class.name, pid, "parsed metatype properties");
        }
        Ok(())
    }
}
