mod settings;

pub use settings::{ProviderConfig, RecordConfig, RecordOverrides, Settings, UpdaterConfig};
