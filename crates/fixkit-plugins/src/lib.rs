pub mod descriptor;
pub mod loader;
pub mod registry;

pub use descriptor::{ActionScript, ActionSet, FlatpakRef, LicenseField, PluginDescriptor};
pub use loader::PluginLoader;
pub use registry::PluginRegistry;
