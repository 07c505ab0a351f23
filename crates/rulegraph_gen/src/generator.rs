//! The parallel build-file generator.

use std::collections::BTreeSet;

use rayon::prelude::*;
use rulegraph_cache::fsutil;
use rulegraph_compose::{compose_prebuilts, PluginDeduplicator, RuleDescriptor};
use rulegraph_model::{normalize_module_path, Coordinate, Module, PluginBacking, PluginUid};
use tracing::{debug, info, warn};

use crate::discovery::TargetDiscovery;
use crate::error::GenerateError;
use crate::render::RuleRenderer;
use crate::session::{build_file_path, Session};

/// What happened to one build file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The file was created or its contents changed.
    Written,
    /// The file already held the rendered text and was left untouched.
    Unchanged,
    /// There were no rules, so nothing was written.
    Skipped,
}

/// A build file produced (or skipped) by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the project root.
    pub path: String,
    /// Number of rules in the file.
    pub rules: usize,
    /// Whether the file was written.
    pub status: WriteStatus,
}

/// Outcome for one module, or for one shared file.
#[derive(Debug)]
pub struct ModuleReport {
    /// Module path, or the package of a shared file.
    pub module: String,
    /// The written file, or why the module failed.
    pub outcome: Result<FileReport, GenerateError>,
}

/// Result of a generation run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Per-module outcomes, in discovery order.
    pub modules: Vec<ModuleReport>,
    /// Outcomes of the shared prebuilt and processor files.
    pub shared: Vec<ModuleReport>,
}

impl GenerateReport {
    /// Every failed module or shared file.
    pub fn failed(&self) -> impl Iterator<Item = &ModuleReport> {
        self.modules
            .iter()
            .chain(self.shared.iter())
            .filter(|r| r.outcome.is_err())
    }

    /// Returns `true` if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Number of files whose contents changed.
    pub fn written(&self) -> usize {
        self.modules
            .iter()
            .chain(self.shared.iter())
            .filter(|r| matches!(&r.outcome, Ok(f) if f.status == WriteStatus::Written))
            .count()
    }
}

/// Generates build files for every module a [`TargetDiscovery`] yields.
///
/// Generation runs in two parallel passes: every module is discovered
/// first (interning its artifacts), then composed, rendered and written.
/// Composition therefore sees the whole run's cache, so a rule name claimed
/// by two different artifacts fails every module that references it no
/// matter which module was discovered first. A failure in one module is
/// recorded in its [`ModuleReport`] and never affects another module's
/// file. Files are only rewritten when their text changes, so an unchanged
/// project leaves the tree untouched.
#[derive(Debug)]
pub struct GraphGenerator<'a, R: RuleRenderer> {
    session: &'a Session,
    renderer: R,
}

impl<'a, R: RuleRenderer> GraphGenerator<'a, R> {
    /// Creates a generator writing through `session`.
    pub fn new(session: &'a Session, renderer: R) -> Self {
        Self { session, renderer }
    }

    /// Runs generation over every module of `discovery`.
    ///
    /// Only a failure to start the worker pool is returned as an error;
    /// everything else is reported per module.
    pub fn generate(&self, discovery: &dyn TargetDiscovery) -> Result<GenerateReport, GenerateError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.session.config().generate.jobs)
            .build()
            .map_err(|e| GenerateError::ThreadPool {
                reason: e.to_string(),
            })?;

        let modules = discovery.modules();
        info!(modules = modules.len(), threads = pool.current_num_threads(), "generating build files");

        let modules: Vec<ModuleReport> = pool.install(|| {
            let discovered: Vec<(String, Result<Module, GenerateError>)> = modules
                .par_iter()
                .map(|module| {
                    let outcome = discovery
                        .discover(module, self.session)
                        .and_then(|m| self.check_changing(m));
                    (normalize_module_path(module), outcome)
                })
                .collect();
            discovered
                .into_par_iter()
                .map(|(path, discovered)| self.generate_module(path, discovered))
                .collect()
        });

        let shared = vec![self.write_prebuilts(), self.write_processors()];
        for report in &shared {
            if let Err(e) = &report.outcome {
                warn!(package = %report.module, error = %e, "shared build file failed");
            }
        }

        let report = GenerateReport { modules, shared };
        info!(
            written = report.written(),
            failed = report.failed().count(),
            "generation finished"
        );
        Ok(report)
    }

    fn generate_module(&self, path: String, discovered: Result<Module, GenerateError>) -> ModuleReport {
        let relative = build_file_path(&path, &self.session.config().paths.build_file);
        let outcome = discovered
            .and_then(|m| {
                self.session
                    .composer()
                    .compose_module(&m)
                    .map_err(GenerateError::from)
            })
            .and_then(|rules| self.write(&relative, &rules));

        match &outcome {
            Ok(file) => debug!(module = %path, status = ?file.status, rules = file.rules, "module done"),
            Err(e) => {
                warn!(module = %path, error = %e, "module failed");
                self.session.keep_build_file(&relative);
            }
        }
        ModuleReport {
            module: path,
            outcome,
        }
    }

    /// Warns about snapshot and dynamic versions the module depends on, or
    /// fails the module when the run forbids them.
    fn check_changing(&self, module: Module) -> Result<Module, GenerateError> {
        let coordinates = changing_coordinates(&module, self.session.plugins());
        if coordinates.is_empty() {
            return Ok(module);
        }
        if self.session.config().generate.fail_on_changing_deps {
            return Err(GenerateError::ChangingDependencies { coordinates });
        }
        warn!(
            module = %module.path(),
            coordinates = %coordinates.join(", "),
            "module depends on changing versions"
        );
        Ok(module)
    }

    fn write_prebuilts(&self) -> ModuleReport {
        let packages = self.session.packages();
        let relative = build_file_path(&packages.cache, &self.session.config().paths.build_file);
        let outcome = compose_prebuilts(
            &self.session.cache().entries(),
            &packages.cache,
            &self.session.config().generate.visibility,
        )
        .map_err(GenerateError::from)
        .and_then(|rules| self.write(&relative, &rules));
        self.shared_report(packages.cache, relative, outcome)
    }

    fn write_processors(&self) -> ModuleReport {
        let packages = self.session.packages();
        let relative = build_file_path(&packages.processor, &self.session.config().paths.build_file);
        let plugins = self.session.plugins();
        let cache = self.session.cache();
        // Plugins backed by a conflicting artifact already failed their modules.
        let uids: Vec<PluginUid> = plugins
            .uids()
            .into_iter()
            .filter(|uid| match plugins.get(uid).map(|d| d.backing) {
                Some(PluginBacking::External(id)) => !cache.is_conflicted(&id),
                _ => true,
            })
            .collect();
        let outcome = plugins
            .rules_for(
                uids.iter(),
                self.session.cache(),
                &packages,
                &self.session.config().generate.visibility,
            )
            .map_err(GenerateError::from)
            .and_then(|rules| self.write(&relative, &rules));
        self.shared_report(packages.processor, relative, outcome)
    }

    fn shared_report(
        &self,
        package: String,
        relative: String,
        outcome: Result<FileReport, GenerateError>,
    ) -> ModuleReport {
        if outcome.is_err() {
            self.session.keep_build_file(&relative);
        }
        ModuleReport {
            module: package,
            outcome,
        }
    }

    /// Renders and writes one build file if its text changed.
    fn write(&self, relative: &str, rules: &[RuleDescriptor]) -> Result<FileReport, GenerateError> {
        if rules.is_empty() {
            return Ok(FileReport {
                path: relative.to_string(),
                rules: 0,
                status: WriteStatus::Skipped,
            });
        }
        let text = self.renderer.render(rules);
        let changed = fsutil::write_if_changed(&self.session.root().join(relative), &text)?;
        self.session.record_build_file(relative);
        Ok(FileReport {
            path: relative.to_string(),
            rules: rules.len(),
            status: if changed {
                WriteStatus::Written
            } else {
                WriteStatus::Unchanged
            },
        })
    }
}

/// Sorted, distinct coordinates with changing versions among a module's
/// external dependencies and the artifacts backing its plugins.
fn changing_coordinates(module: &Module, plugins: &PluginDeduplicator) -> Vec<String> {
    let mut changing = BTreeSet::new();
    for target in module.targets() {
        for (_, scope) in target.scopes() {
            let backings = scope
                .plugins()
                .iter()
                .filter_map(|uid| plugins.get(uid))
                .filter_map(|d| match d.backing {
                    PluginBacking::External(id) => Some(id.coordinate),
                    PluginBacking::Internal(_) => None,
                });
            let direct = scope.all_external().map(|id| id.coordinate.clone());
            changing.extend(
                direct
                    .chain(backings)
                    .filter(Coordinate::is_changing)
                    .map(|c| c.to_string()),
            );
        }
    }
    changing.into_iter().collect()
}
