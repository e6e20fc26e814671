//! Service container for dependency injection
//!
//! Wires up the store and services with their dependencies. The type rule
//! table is loaded eagerly and fail-fast; every service shares the same
//! read-only copy.

use std::sync::Arc;

use crate::application::{ApplicationResult, OrganizationService, ReportService};
use crate::config::{load_type_rules, Settings};
use crate::domain::TypeRules;
use crate::infrastructure::store::OrgStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Organization document store
    pub store: Arc<OrgStore>,

    /// Unit type nesting rules (process-wide, read-only)
    pub rules: Arc<TypeRules>,

    /// Editing operations
    pub organization: OrganizationService,

    /// Dashboard roll-ups
    pub report: ReportService,
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("settings", &self.settings)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> ApplicationResult<Self> {
        let settings = Arc::new(settings);
        let rules = Arc::new(load_type_rules(&settings.type_rules_file)?);
        let store = Arc::new(OrgStore::new(Arc::clone(&fs), &settings));

        let organization = OrganizationService::new(Arc::clone(&store), Arc::clone(&rules));
        let report = ReportService::new(
            Arc::clone(&store),
            Arc::clone(&rules),
            settings.metrics_file.clone(),
            settings.thresholds_file.clone(),
        );

        Ok(Self {
            settings,
            fs,
            store,
            rules,
            organization,
            report,
        })
    }
}
