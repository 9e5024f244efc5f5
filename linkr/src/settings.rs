use std::sync::Arc;

use linkr_core::{ConfigError, LinkrConfig};
use linkr_data::PageLimits;
use linkr_hal::{EnvelopeSerializer, HalJson, LinkBase, PlainJson, HAL_JSON, PLAIN_JSON};

/// Typed view of the `linkr.*` configuration keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// `linkr.server.addr`
    pub addr: String,
    /// `linkr.links.base`
    pub link_base: String,
    /// `linkr.links.absolute`
    pub absolute_links: bool,
    /// `linkr.page.size` and `linkr.page.max`
    pub limits: PageLimits,
    /// `linkr.media.types`, default first.
    pub media_types: Vec<String>,
    /// `linkr.docs.enabled`
    pub docs: bool,
    /// `linkr.docs.title`
    pub title: String,
    /// `linkr.docs.version`
    pub version: String,
    /// `linkr.cors.enabled`
    pub cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".into(),
            link_base: "http://localhost:8080/".into(),
            absolute_links: false,
            limits: PageLimits::default(),
            media_types: vec![HAL_JSON.into(), PLAIN_JSON.into()],
            docs: true,
            title: "linkr".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            cors: false,
        }
    }
}

impl ApiSettings {
    /// Read settings, using defaults for absent keys.
    ///
    /// # Errors
    ///
    /// `ConfigError::TypeMismatch` for malformed values, `ConfigError::Invalid`
    /// for well-typed values that cannot work (bad base URL, zero page size,
    /// unknown media type).
    pub fn from_config(config: &LinkrConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let limits = PageLimits {
            default_size: config.get_or("linkr.page.size", defaults.limits.default_size)?,
            max_size: config.get_or("linkr.page.max", defaults.limits.max_size)?,
        };
        let settings = Self {
            addr: config.get_or("linkr.server.addr", defaults.addr)?,
            link_base: config.get_or("linkr.links.base", defaults.link_base)?,
            absolute_links: config.get_or("linkr.links.absolute", defaults.absolute_links)?,
            limits,
            media_types: config.get_or("linkr.media.types", defaults.media_types)?,
            docs: config.get_or("linkr.docs.enabled", defaults.docs)?,
            title: config.get_or("linkr.docs.title", defaults.title)?,
            version: config.get_or("linkr.docs.version", defaults.version)?,
            cors: config.get_or("linkr.cors.enabled", defaults.cors)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.default_size == 0 {
            return Err(invalid("linkr.page.size", "must be at least 1"));
        }
        if self.limits.max_size < self.limits.default_size {
            return Err(invalid("linkr.page.max", "must not be below linkr.page.size"));
        }
        self.link_base()?;
        self.serializers()?;
        Ok(())
    }

    pub fn link_base(&self) -> Result<LinkBase, ConfigError> {
        LinkBase::new(&self.link_base, self.absolute_links)
            .map_err(|e| invalid("linkr.links.base", &e.to_string()))
    }

    /// Serializers for the configured media types, in preference order.
    pub fn serializers(&self) -> Result<Vec<Arc<dyn EnvelopeSerializer>>, ConfigError> {
        if self.media_types.is_empty() {
            return Err(invalid("linkr.media.types", "at least one media type is required"));
        }
        self.media_types
            .iter()
            .map(|m| match m.trim().to_ascii_lowercase().as_str() {
                HAL_JSON => Ok(Arc::new(HalJson) as Arc<dyn EnvelopeSerializer>),
                PLAIN_JSON => Ok(Arc::new(PlainJson) as Arc<dyn EnvelopeSerializer>),
                other => Err(invalid("linkr.media.types", &format!("unsupported media type '{other}'"))),
            })
            .collect()
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let settings = ApiSettings::from_config(&LinkrConfig::empty()).unwrap();
        assert_eq!(settings, ApiSettings::default());
        assert_eq!(settings.serializers().unwrap().len(), 2);
    }

    #[test]
    fn keys_override_defaults() {
        let config = LinkrConfig::from_yaml_str(
            r#"
linkr:
  server:
    addr: "127.0.0.1:9000"
  links:
    base: "https://sport.example.org/api/"
    absolute: true
  page:
    size: 5
    max: 50
  media:
    types: [application/json]
  docs:
    enabled: false
"#,
            "test",
        )
        .unwrap();
        let settings = ApiSettings::from_config(&config).unwrap();
        assert_eq!(settings.addr, "127.0.0.1:9000");
        assert!(settings.absolute_links);
        assert_eq!(settings.limits, PageLimits { default_size: 5, max_size: 50 });
        assert_eq!(settings.media_types, vec!["application/json".to_string()]);
        assert!(!settings.docs);
        assert!(settings.link_base().unwrap().is_absolute());
    }

    #[test]
    fn rejects_unusable_values() {
        let cases = [
            ("linkr:\n  page:\n    size: 0\n", "linkr.page.size"),
            ("linkr:\n  page:\n    size: 50\n    max: 10\n", "linkr.page.max"),
            ("linkr:\n  media:\n    types: [text/html]\n", "linkr.media.types"),
            ("linkr:\n  links:\n    base: \"not a url\"\n", "linkr.links.base"),
        ];
        for (yaml, expected_key) in cases {
            let config = LinkrConfig::from_yaml_str(yaml, "test").unwrap();
            match ApiSettings::from_config(&config) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("expected invalid {expected_key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_values_are_type_mismatches() {
        let config = LinkrConfig::from_yaml_str("linkr:\n  docs:\n    enabled: maybe\n", "test").unwrap();
        assert!(matches!(
            ApiSettings::from_config(&config),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }
}
