use crate::module::ModuleConfig;

/// The set of modules one daemon process exposes.
#[derive(Default)]
pub struct DaemonConfig {
    pub modules: Vec<ModuleConfig>,
}

impl DaemonConfig {
    #[must_use]
    pub fn new(modules: Vec<ModuleConfig>) -> Self {
        Self { modules }
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Modules shown by `#list`, in configuration order.
    pub fn listable_modules(&self) -> impl Iterator<Item = &ModuleConfig> {
        self.modules.iter().filter(|m| m.listable)
    }
}
