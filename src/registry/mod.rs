//! Process-wide catalog of registered test cases.
//!
//! Test files attach themselves with [`register_test!`](crate::register_test),
//! which submits a [`Registration`] to `inventory`. The global [`Registry`] is
//! built from those submissions the first time [`global`] is called, so no
//! central list of tests exists anywhere.

use crate::case::{TestCase, TestDescriptor};
use crate::core::error::Result;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Constructs a fresh instance of a registered test.
pub type Factory = fn() -> Box<dyn TestCase>;

fn construct<T: TestCase + Default + 'static>() -> Box<dyn TestCase> {
    Box::new(T::default())
}

/// Errors detected while building the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two tests share a name.
    #[error("duplicate test name '{name}' (registered in {first} and {second})")]
    Duplicate {
        name: String,
        first: String,
        second: String,
    },
}

/// Registration proxy for one test type, collected by `inventory`.
pub struct Registration {
    factory: Factory,
}

impl Registration {
    /// Proxy for a test type that is constructed with `Default`.
    pub const fn of<T: TestCase + Default + 'static>() -> Self {
        Self {
            factory: construct::<T>,
        }
    }

    /// Proxy for an arbitrary factory.
    pub const fn new(factory: Factory) -> Self {
        Self { factory }
    }

    /// Build the registry entry for this proxy.
    pub fn entry(&self) -> RegistryEntry {
        RegistryEntry::new(self.factory)
    }
}

inventory::collect!(Registration);

/// Register a test type in the global registry.
///
/// ```
/// use cts_harness::{register_test, test_descriptor, CaseResult, Logger, TestCase, TestEnv};
///
/// #[derive(Default)]
/// struct AlwaysPasses;
///
/// impl TestCase for AlwaysPasses {
///     fn descriptor(&self) -> cts_harness::TestDescriptor {
///         test_descriptor!("doc_always_passes")
///     }
///
///     fn run(&self, _env: &TestEnv, log: &mut Logger) -> CaseResult {
///         log.pass();
///         Ok(())
///     }
/// }
///
/// register_test!(AlwaysPasses);
/// ```
#[macro_export]
macro_rules! register_test {
    ($ty:ty) => {
        $crate::__private::inventory::submit! {
            $crate::registry::Registration::of::<$ty>()
        }
    };
}

/// A registered test: its descriptor and how to construct it.
#[derive(Clone)]
pub struct RegistryEntry {
    descriptor: TestDescriptor,
    factory: Factory,
}

impl RegistryEntry {
    /// Create an entry, querying the descriptor from a fresh instance.
    pub fn new(factory: Factory) -> Self {
        let descriptor = factory().descriptor();
        Self {
            descriptor,
            factory,
        }
    }

    /// Entry for a `Default`-constructible test type.
    pub fn of<T: TestCase + Default + 'static>() -> Self {
        Self::new(construct::<T>)
    }

    /// Descriptor of the registered test.
    pub fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    /// Name of the registered test.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Factory that constructs the test.
    pub fn factory(&self) -> Factory {
        self.factory
    }

    /// Construct a new instance of the test.
    pub fn instantiate(&self) -> Box<dyn TestCase> {
        (self.factory)()
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered catalog of tests with unique names.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from proxies, ordered by test name.
    pub fn from_registrations<'a>(
        registrations: impl IntoIterator<Item = &'a Registration>,
    ) -> std::result::Result<Self, RegistryError> {
        let mut entries: Vec<RegistryEntry> =
            registrations.into_iter().map(Registration::entry).collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));

        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry)?;
        }
        Ok(registry)
    }

    /// Add an entry. Rejects names that are already registered.
    pub fn register(&mut self, entry: RegistryEntry) -> std::result::Result<(), RegistryError> {
        if let Some(&existing) = self.index.get(entry.name()) {
            return Err(RegistryError::Duplicate {
                name: entry.name().to_string(),
                first: self.entries[existing].descriptor.source_location.clone(),
                second: entry.descriptor.source_location.clone(),
            });
        }

        self.index
            .insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// All entries, in registration order.
    pub fn enumerate(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Look up an entry by exact name.
    pub fn find(&self, name: &str) -> Option<&RegistryEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tests are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The process-wide registry, built from every [`register_test!`] on first use.
///
/// A duplicate name is reported on every call, before any test can run.
pub fn global() -> Result<&'static Registry> {
    static GLOBAL: OnceLock<std::result::Result<Registry, RegistryError>> = OnceLock::new();

    let built = GLOBAL.get_or_init(|| {
        let registry = Registry::from_registrations(inventory::iter::<Registration>);
        match &registry {
            Ok(r) => tracing::debug!(tests = r.len(), "built global test registry"),
            Err(e) => tracing::error!("failed to build global test registry: {e}"),
        }
        registry
    });

    built.as_ref().map_err(|e| e.clone().into())
}
