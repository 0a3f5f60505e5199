//! Operator registry.
//!
//! Maps operator names to constructors so the parser can instantiate the
//! right behavior for a call, and so modules can extend the language
//! without touching the engine. Template (macro) calls register here late,
//! after configuration has parsed their definitions.

use std::sync::Arc;

use indexmap::IndexMap;
use sieve_core::{CoreError, Result};

use crate::dag::Call;

type Generator = Box<dyn Fn() -> Arc<dyn Call>>;

/// Name → constructor registry for call behaviors.
#[derive(Default)]
pub struct CallFactory {
    generators: IndexMap<String, Generator>,
}

impl CallFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stateless behavior type under its own name.
    pub fn add<T: Call + Default + 'static>(&mut self) -> &mut Self {
        let shared: Arc<dyn Call> = Arc::new(T::default());
        let name = shared.name().to_owned();
        self.add_generator(name, move || shared.clone())
    }

    /// Register a constructor under an explicit name. Later registrations
    /// replace earlier ones.
    pub fn add_generator(
        &mut self,
        name: impl Into<String>,
        generator: impl Fn() -> Arc<dyn Call> + 'static,
    ) -> &mut Self {
        self.generators.insert(name.into(), Box::new(generator));
        self
    }

    /// Instantiate the behavior for `name`.
    pub fn create(&self, name: &str) -> Result<Arc<dyn Call>> {
        match self.generators.get(name) {
            Some(generator) => Ok(generator()),
            None => Err(CoreError::enoent(format!("unknown operator `{name}`"))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Registered operator names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}
