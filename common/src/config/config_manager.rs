use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use super::{
    ConfigContentProvider, ConfigError, ConfigSerializer, FileContentConfigProvider, Validate,
    YamlConfigSerializer,
};

pub struct ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer = YamlConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    config_serializer: TConfigSerializer,
    config_content_provider: TConfigContentProvider,
    config: Mutex<Option<TConfig>>,
}

impl<TConfig> ConfigManager<FileContentConfigProvider, TConfig, YamlConfigSerializer>
where
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
{
    pub fn from_yaml_file(file_path: &str) -> Self {
        Self::new(
            FileContentConfigProvider::new(file_path),
            YamlConfigSerializer,
        )
    }
}

impl<TConfigContentProvider, TConfig, TConfigSerializer>
    ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    pub fn new(
        config_content_provider: TConfigContentProvider,
        config_serializer: TConfigSerializer,
    ) -> Self {
        Self {
            config: Mutex::new(None),
            config_content_provider,
            config_serializer,
        }
    }

    fn cached(&self) -> MutexGuard<'_, Option<TConfig>> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Loads, validates and caches the config. A missing source yields `TConfig::default()`,
    /// which is not cached so a later `set_config` or file write is still picked up.
    pub fn get_config(&self) -> Result<TConfig, ConfigError> {
        let mut current = self.cached();

        if let Some(config) = current.as_ref() {
            return Ok(config.clone());
        }

        let Some(content) = self.config_content_provider.get_config_content()? else {
            return Ok(TConfig::default());
        };

        let config = self.config_serializer.deserialize(&content)?;
        config.validate().map_err(ConfigError::Invalid)?;

        *current = Some(config.clone());
        Ok(config)
    }

    pub fn set_config(&self, config: &TConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;

        let serialized_config = self.config_serializer.serialize(config)?;
        self.config_content_provider
            .set_config_content(&serialized_config)?;

        *self.cached() = Some(config.clone());
        Ok(())
    }

    pub fn provider(&self) -> &TConfigContentProvider {
        &self.config_content_provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigProvider;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct SampleConfig {
        rows: u32,
    }

    impl Default for SampleConfig {
        fn default() -> Self {
            Self { rows: 8 }
        }
    }

    impl Validate for SampleConfig {
        fn validate(&self) -> Result<(), String> {
            if self.rows == 0 {
                return Err("rows must be positive".to_string());
            }
            Ok(())
        }
    }

    fn manager(
        provider: MemoryConfigProvider,
    ) -> ConfigManager<MemoryConfigProvider, SampleConfig> {
        ConfigManager::new(provider, YamlConfigSerializer)
    }

    #[test]
    fn test_missing_content_falls_back_to_default() {
        let manager = manager(MemoryConfigProvider::default());
        assert_eq!(manager.get_config().unwrap(), SampleConfig::default());
    }

    #[test]
    fn test_reads_yaml_content() {
        let manager = manager(MemoryConfigProvider::with_content("rows: 12\n"));
        assert_eq!(manager.get_config().unwrap().rows, 12);
    }

    #[test]
    fn test_invalid_content_is_rejected() {
        let manager = manager(MemoryConfigProvider::with_content("rows: 0\n"));
        assert!(matches!(manager.get_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let manager = manager(MemoryConfigProvider::with_content("rows: [oops"));
        assert!(matches!(manager.get_config(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_set_config_writes_through() {
        let manager = manager(MemoryConfigProvider::default());
        manager.set_config(&SampleConfig { rows: 5 }).unwrap();

        assert_eq!(manager.get_config().unwrap().rows, 5);
        let stored = manager.provider().content().unwrap();
        assert!(stored.contains("rows: 5"));
    }

    #[test]
    fn test_set_config_refuses_invalid() {
        let manager = manager(MemoryConfigProvider::default());
        assert!(manager.set_config(&SampleConfig { rows: 0 }).is_err());
        assert!(manager.provider().content().is_none());
    }
}
