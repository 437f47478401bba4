//! Named configurations and the configuration registry.
//!
//! A `DbConfig` pairs a [`Dialect`] with a [`ConnectionProvider`] and a
//! record [`ContainerFactory`] under a name. The registry maps names to
//! configurations: it is populated during initialization, treated as
//! immutable during steady-state operation, and handed to the engine
//! explicitly rather than living in ambient global state. Mutating it
//! (register/remove) must not be interleaved with in-flight calls.

use crate::db::connection::ConnectionProvider;
use crate::db::engine::Db;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::models::record::{ContainerFactory, OrderedContainerFactory};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One named configuration: dialect + connection provider + record
/// container factory.
pub struct DbConfig {
    name: String,
    dialect: Arc<dyn Dialect>,
    provider: Arc<dyn ConnectionProvider>,
    container: Arc<dyn ContainerFactory>,
}

impl DbConfig {
    /// Start building a configuration. The container factory defaults to
    /// [`OrderedContainerFactory`].
    pub fn builder(name: impl Into<String>) -> DbConfigBuilder {
        DbConfigBuilder {
            name: name.into(),
            dialect: None,
            provider: None,
            container: Arc::new(OrderedContainerFactory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn provider(&self) -> &dyn ConnectionProvider {
        self.provider.as_ref()
    }

    pub fn container(&self) -> &dyn ContainerFactory {
        self.container.as_ref()
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig").field("name", &self.name).finish()
    }
}

pub struct DbConfigBuilder {
    name: String,
    dialect: Option<Arc<dyn Dialect>>,
    provider: Option<Arc<dyn ConnectionProvider>>,
    container: Arc<dyn ContainerFactory>,
}

impl DbConfigBuilder {
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Some(Arc::new(dialect));
        self
    }

    pub fn dialect_arc(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn provider(mut self, provider: impl ConnectionProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn provider_arc(mut self, provider: Arc<dyn ConnectionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn container(mut self, container: impl ContainerFactory + 'static) -> Self {
        self.container = Arc::new(container);
        self
    }

    pub fn build(self) -> DbResult<DbConfig> {
        let dialect = self.dialect.ok_or_else(|| {
            DbError::configuration(format!("config '{}' has no dialect", self.name))
        })?;
        let provider = self.provider.ok_or_else(|| {
            DbError::configuration(format!("config '{}' has no connection provider", self.name))
        })?;
        Ok(DbConfig {
            name: self.name,
            dialect,
            provider,
            container: self.container,
        })
    }
}

#[derive(Default)]
struct RegistryInner {
    configs: HashMap<String, Arc<DbConfig>>,
    main: Option<String>,
}

/// Name-to-configuration registry. The first registered configuration
/// becomes the main one.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration and return its engine handle. A
    /// duplicate name is a configuration error.
    pub fn register(&self, config: DbConfig) -> DbResult<Db> {
        let mut inner = self.inner.write();
        let name = config.name().to_string();
        if inner.configs.contains_key(&name) {
            return Err(DbError::configuration(format!(
                "config '{name}' is already registered"
            )));
        }
        let config = Arc::new(config);
        inner.configs.insert(name.clone(), config.clone());
        if inner.main.is_none() {
            inner.main = Some(name);
        }
        Ok(Db::new(config))
    }

    /// Engine handle for a named configuration.
    pub fn get(&self, name: &str) -> DbResult<Db> {
        let inner = self.inner.read();
        inner
            .configs
            .get(name)
            .cloned()
            .map(Db::new)
            .ok_or_else(|| DbError::configuration(format!("config not found: {name}")))
    }

    /// Engine handle for the main (first registered) configuration.
    pub fn main(&self) -> DbResult<Db> {
        let inner = self.inner.read();
        let name = inner
            .main
            .as_ref()
            .ok_or_else(|| DbError::configuration("no configuration registered"))?;
        inner
            .configs
            .get(name)
            .cloned()
            .map(Db::new)
            .ok_or_else(|| DbError::configuration(format!("config not found: {name}")))
    }

    /// Remove a configuration. Initialization-time only: not safe to
    /// interleave with steady-state calls on the removed name.
    pub fn remove(&self, name: &str) -> DbResult<()> {
        let mut inner = self.inner.write();
        if inner.configs.remove(name).is_none() {
            return Err(DbError::configuration(format!("config not found: {name}")));
        }
        if inner.main.as_deref() == Some(name) {
            inner.main = None;
        }
        Ok(())
    }

    /// Registered configuration names.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().configs.keys().cloned().collect()
    }
}
