//! Syntax validators for content files. Only well-formedness is checked, no schema.

use crate::catalog::ContentLanguage;
use crate::error::BundleError;
use std::collections::HashMap;
use std::sync::OnceLock;

pub trait ContentValidator: Send + Sync {
    fn language(&self) -> ContentLanguage;

    fn is_valid(&self, content: &str) -> bool;
}

pub struct JsonContentValidator;

impl ContentValidator for JsonContentValidator {
    fn language(&self) -> ContentLanguage {
        ContentLanguage::Json
    }

    fn is_valid(&self, content: &str) -> bool {
        let valid = serde_json::from_str::<serde_json::Value>(content).is_ok();
        tracing::debug!(valid, "json content validation");
        valid
    }
}

/// Requires a full parse and a non-null document; empty input is invalid.
pub struct YamlContentValidator;

impl ContentValidator for YamlContentValidator {
    fn language(&self) -> ContentLanguage {
        ContentLanguage::Yaml
    }

    fn is_valid(&self, content: &str) -> bool {
        let valid = match serde_yaml::from_str::<serde_yaml::Value>(content) {
            Ok(value) => !value.is_null(),
            Err(e) => {
                tracing::debug!(error = %e, "yaml parse failed");
                false
            }
        };
        tracing::debug!(valid, "yaml content validation");
        valid
    }
}

/// Validators by language. Adding a language means adding an entry here.
pub struct ValidatorRegistry {
    by_language: HashMap<ContentLanguage, Box<dyn ContentValidator>>,
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        ValidatorRegistry {
            by_language: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(JsonContentValidator));
        registry.register(Box::new(YamlContentValidator));
        registry
    }

    pub fn register(&mut self, validator: Box<dyn ContentValidator>) {
        self.by_language.insert(validator.language(), validator);
    }

    /// Fails closed: a language without a registered validator is an error.
    pub fn get(&self, language: ContentLanguage) -> Result<&dyn ContentValidator, BundleError> {
        self.by_language
            .get(&language)
            .map(|v| v.as_ref())
            .ok_or_else(|| BundleError::UnsupportedLanguage(language.to_string()))
    }

    pub fn validate(&self, content: &str, language: ContentLanguage) -> Result<bool, BundleError> {
        Ok(self.get(language)?.is_valid(content))
    }
}

/// Process-wide registry with the JSON and YAML validators.
pub fn validators() -> &'static ValidatorRegistry {
    static REGISTRY: OnceLock<ValidatorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ValidatorRegistry::with_defaults)
}

/// Validate `content` written in `language` with the default registry.
pub fn validate(content: &str, language: ContentLanguage) -> Result<bool, BundleError> {
    validators().validate(content, language)
}
