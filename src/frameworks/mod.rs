// Frameworks layer: runtime bootstrap, environment config and asset loading.

pub mod assets;
pub mod client;
pub mod config;
