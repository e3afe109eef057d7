//! The skill application object.
//!
//! A [`Skill`] owns the loaded configuration and an [`IntentRegistry`], and
//! is the single entry point the transport layer calls for every request.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vox_runtime::Skill;
//!
//! // Loads vox.toml from the current directory, initializes logging and
//! // registers every #[intent] function.
//! let skill = Skill::builder().collect_registered().build()?;
//!
//! let response = skill.handle(request).await?;
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{Instrument, Level, debug, error, info, span, warn};
use vox_core::{InvokeRequest, Response};
use vox_framework::{Intent, IntentRegistry};

use crate::config::{ConfigLoader, SkillConfig, validate_config};
use crate::error::{SkillError, SkillResult};
use crate::logging;

/// Builder for [`Skill`].
pub struct SkillBuilder {
    config: Option<SkillConfig>,
    loader: Option<ConfigLoader>,
    intents: Vec<Intent>,
    collect_registered: bool,
    init_logging: bool,
}

impl Default for SkillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            loader: None,
            intents: Vec::new(),
            collect_registered: false,
            init_logging: true,
        }
    }

    /// Uses `config` instead of loading one.
    pub fn config(mut self, config: SkillConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads the configuration with a customized loader.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Registers an intent when the skill is built.
    pub fn intent(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    /// Registers every `#[intent]` function linked into the binary.
    pub fn collect_registered(mut self) -> Self {
        self.collect_registered = true;
        self
    }

    /// Whether `build` installs the global tracing subscriber (default: true).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    pub fn build(self) -> SkillResult<Skill> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.unwrap_or_default().load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let mut registry = IntentRegistry::new().with_default_silent(config.binder.silent);
        if self.collect_registered {
            registry.collect_registered()?;
        }
        for intent in self.intents {
            registry.register(intent)?;
        }

        info!(
            skill = %config.skill.name,
            version = %config.skill.version,
            intents = registry.len(),
            "Skill ready"
        );

        Ok(Skill {
            config: Arc::new(config),
            registry,
        })
    }
}

/// A voice skill: configuration plus registered intents.
///
/// Cloning is cheap.
#[derive(Clone)]
pub struct Skill {
    config: Arc<SkillConfig>,
    registry: IntentRegistry,
}

impl Skill {
    pub fn builder() -> SkillBuilder {
        SkillBuilder::new()
    }

    pub fn config(&self) -> &SkillConfig {
        &self.config
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    /// Registered intent names, sorted.
    pub fn intent_names(&self) -> Vec<&str> {
        self.registry.intent_names()
    }

    /// Handles one invocation request.
    pub async fn handle(&self, request: InvokeRequest) -> SkillResult<Response> {
        let span = span!(
            Level::INFO,
            "skill.handle",
            skill = %self.config.skill.name,
            intent = %request.intent(),
        );

        async move {
            if let Some(locale) = &request.context.locale
                && !self.config.skill.locales.iter().any(|l| l == locale)
            {
                warn!(locale = %locale, "Request locale is not supported by this skill");
            }

            match self.registry.invoke(request).await {
                Ok(response) => {
                    debug!(kind = ?response.kind, "Request handled");
                    Ok(response)
                }
                Err(e) => {
                    error!(error = %e, "Request failed");
                    Err(SkillError::Invoke(e))
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.config.skill.name)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Service<InvokeRequest> for Skill {
    type Response = Response;
    type Error = SkillError;
    type Future = Pin<Box<dyn Future<Output = SkillResult<Response>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: InvokeRequest) -> Self::Future {
        let skill = self.clone();
        Box::pin(async move { skill.handle(request).await })
    }
}
