//! Hooks that run around resolution.
//!
//! Every hook receives the draft by exclusive reference and may mutate it.
//! Hooks run in registration order; the first error aborts the build.

mod named_packages;
mod validator;

pub use named_packages::NamedPackagesPlugin;
pub use validator::ValidatorPlugin;

use std::fmt;

use log::debug;

use crate::data::TransactionData;
use crate::error::TxError;

pub trait TransactionPlugin: Send + Sync {
    /// Unique within a pipeline.
    fn name(&self) -> &str;

    /// Runs first, before any resolution.
    fn before_build(&self, _data: &mut TransactionData) -> Result<(), TxError> {
        Ok(())
    }

    /// Runs after every plugin's `before_build`, still before resolution.
    fn build(&self, _data: &mut TransactionData) -> Result<(), TxError> {
        Ok(())
    }

    /// Runs on the resolved draft, right before encoding.
    fn after_build(&self, _data: &mut TransactionData) -> Result<(), TxError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Before,
    Build,
    After,
}

#[derive(Default)]
pub struct PluginPipeline {
    plugins: Vec<Box<dyn TransactionPlugin>>,
}

impl fmt::Debug for PluginPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. A plugin with the same name is replaced in place,
    /// keeping its position.
    pub fn register(&mut self, plugin: Box<dyn TransactionPlugin>) {
        match self.position(plugin.name()) {
            Some(i) => {
                debug!("replacing plugin {}", plugin.name());
                self.plugins[i] = plugin;
            }
            None => self.plugins.push(plugin),
        }
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn TransactionPlugin>> {
        self.position(name).map(|i| self.plugins.remove(i))
    }

    pub fn get(&self, name: &str) -> Option<&dyn TransactionPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    pub fn run_before(&self, data: &mut TransactionData) -> Result<(), TxError> {
        self.run(Stage::Before, data)
    }

    pub fn run_build(&self, data: &mut TransactionData) -> Result<(), TxError> {
        self.run(Stage::Build, data)
    }

    pub fn run_after(&self, data: &mut TransactionData) -> Result<(), TxError> {
        self.run(Stage::After, data)
    }

    fn run(&self, stage: Stage, data: &mut TransactionData) -> Result<(), TxError> {
        for plugin in &self.plugins {
            debug!("plugin {} {:?}", plugin.name(), stage);
            let result = match stage {
                Stage::Before => plugin.before_build(data),
                Stage::Build => plugin.build(data),
                Stage::After => plugin.after_build(data),
            };
            if let Err(e) = result {
                debug!("plugin {} failed: {e}", plugin.name());
                return Err(e);
            }
        }
        Ok(())
    }
}
