//! The target discovery seam.

use rulegraph_model::Module;

use crate::error::GenerateError;
use crate::session::Session;

/// Supplies the project graph to the generator.
///
/// Implementations translate whatever describes the project (a manifest
/// file, a host build system's object graph) into resolved [`Module`]s.
/// External artifacts are interned through the session's dependency cache
/// and processor plugins are identified through its plugin registry while
/// a module is discovered, so that composition only ever resolves.
///
/// `discover` is called concurrently for different modules.
pub trait TargetDiscovery: Sync {
    /// Module paths in discovery order.
    fn modules(&self) -> Vec<String>;

    /// Builds the resolved model of one module.
    fn discover(&self, module: &str, session: &Session) -> Result<Module, GenerateError>;
}
