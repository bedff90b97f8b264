//! Multi-class build.
//!
//! Every record gets its own collector, so classes compile independently
//! and in parallel. Results are merged back in input order, which keeps the
//! output deterministic regardless of scheduling.

use anyhow::Result;
use glob::Pattern;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    config::Config,
    core::{
        AcceptAllFilters, AnnotationCollector, ClassRecord, FilterVerifier, LdapFilterVerifier,
        MetaTypeRegistry, ServiceNameSets, scan::replay,
    },
    error::CompileError,
};

pub struct BuildSettings {
    pub ignored_interfaces: Vec<Pattern>,
    pub filters: Box<dyn FilterVerifier>,
    pub continue_on_error: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            ignored_interfaces: Vec::new(),
            filters: Box::new(LdapFilterVerifier),
            continue_on_error: false,
        }
    }
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let filters: Box<dyn FilterVerifier> = if config.verify_filters {
            Box::new(LdapFilterVerifier)
        } else {
            Box::new(AcceptAllFilters)
        };
        Ok(Self {
            ignored_interfaces: config.ignored_interface_patterns()?,
            filters,
            continue_on_error: config.continue_on_error,
        })
    }
}

/// The compiled descriptor of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub class: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFailure {
    pub class: String,
    pub error: CompileError,
}

#[derive(Debug, Default)]
pub struct BuildOutput {
    pub descriptors: Vec<ClassDescriptor>,
    pub failures: Vec<ClassFailure>,
    pub services: ServiceNameSets,
    pub metatype: MetaTypeRegistry,
    /// Records without any recognized annotation.
    pub skipped: usize,
    /// True when a failure stopped the build; nothing should be written.
    pub aborted: bool,
}

impl BuildOutput {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum ClassOutcome {
    Compiled {
        descriptor: ClassDescriptor,
        services: ServiceNameSets,
        metatype: MetaTypeRegistry,
    },
    Skipped,
    Failed(ClassFailure),
}

fn compile_one(record: &ClassRecord, settings: &BuildSettings) -> ClassOutcome {
    let mut collector = AnnotationCollector::new(settings.filters.as_ref())
        .with_ignored_interfaces(&settings.ignored_interfaces);

    match replay(record, &mut collector) {
        Ok(true) => {
            let descriptor = ClassDescriptor {
                class: collector.class_name().to_string(),
                text: collector.emit(),
            };
            let (services, metatype) = collector.into_parts();
            ClassOutcome::Compiled {
                descriptor,
                services,
                metatype,
            }
        }
        Ok(false) => ClassOutcome::Skipped,
        Err(error) => ClassOutcome::Failed(ClassFailure {
            class: record.name.replace('/', "."),
            error,
        }),
    }
}

/// Compile every record and merge the results in input order.
pub fn compile_all(records: &[ClassRecord], settings: &BuildSettings) -> BuildOutput {
    let outcomes: Vec<ClassOutcome> = records
        .par_iter()
        .map(|record| compile_one(record, settings))
        .collect();

    let mut output = BuildOutput::default();
    for outcome in outcomes {
        match outcome {
            ClassOutcome::Compiled {
                descriptor,
                services,
                metatype,
            } => {
                output.descriptors.push(descriptor);
                output.services.merge(services);
                output.metatype.merge(metatype);
            }
            ClassOutcome::Skipped => output.skipped += 1,
            ClassOutcome::Failed(failure) => {
                if !settings.continue_on_error {
                    return BuildOutput {
                        failures: vec![failure],
                        aborted: true,
                        ..Default::default()
                    };
                }
                warn!(class = %failure.class, error = %failure.error, "class failed, continuing");
                output.failures.push(failure);
            }
        }
    }

    info!(
        compiled = output.descriptors.len(),
        failed = output.failures.len(),
        skipped = output.skipped,
        "build finished"
    );
    output
}
