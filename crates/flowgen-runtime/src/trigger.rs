//! Trigger lifecycle: Registered → Initialized → Started → Stopped.
//!
//! A [`Trigger`] owns its event source. Handlers are resolved once during
//! [`Trigger::initialize`]; each fired event is projected through the Output
//! contract before it reaches a handler.

use std::fmt;
use std::sync::Arc;

use flowgen_core::Record;
use serde_json::{Map, Value};

use crate::definition::TriggerDefinition;
use crate::error::RuntimeError;
use crate::logger::Logger;
use crate::metadata::TriggerMetadata;
use crate::registry::ArtifactRef;
use crate::settings::{MetadataResolver, SettingsResolver};

/// Host-side configuration of one trigger instance.
#[derive(Debug, Clone, Default)]
pub struct TriggerConfig {
    pub id: String,
    pub settings: Map<String, Value>,
}

/// A flow entry point the host binds to a trigger.
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    /// Raw handler settings as configured by the host.
    fn settings(&self) -> &Map<String, Value>;

    /// Run the bound flow with the trigger's output data.
    fn handle(&self, data: Map<String, Value>) -> Result<Map<String, Value>, RuntimeError>;
}

/// What the host hands a trigger at initialization.
#[derive(Clone, Default)]
pub struct TriggerInitContext {
    pub logger: Logger,
    pub handlers: Vec<Arc<dyn Handler>>,
}

/// A handler together with its resolved settings.
#[derive(Clone)]
pub struct HandlerBinding {
    pub handler: Arc<dyn Handler>,
    pub settings: Record,
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("handler", &self.handler.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Source of events for a running trigger.
pub trait EventSource: Send {
    fn start(&mut self, handlers: &[HandlerBinding]) -> Result<(), RuntimeError>;

    fn stop(&mut self) -> Result<(), RuntimeError>;
}

/// Produces no events. Stand-in until the author wires a real source.
#[derive(Debug, Default)]
pub struct NoopSource;

impl EventSource for NoopSource {
    fn start(&mut self, _: &[HandlerBinding]) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Registered form of a trigger type.
pub struct TriggerFactory {
    reference: ArtifactRef,
    metadata: Arc<TriggerMetadata>,
    resolver: Arc<dyn SettingsResolver>,
}

impl TriggerFactory {
    pub fn new(extension: &str, definition: &TriggerDefinition) -> Self {
        let reference = ArtifactRef::trigger(extension, &definition.name);
        Self {
            metadata: Arc::new(TriggerMetadata::new(&reference, definition)),
            reference,
            resolver: Arc::new(MetadataResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: impl SettingsResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn reference(&self) -> &ArtifactRef {
        &self.reference
    }

    pub fn metadata(&self) -> &Arc<TriggerMetadata> {
        &self.metadata
    }

    /// Build a trigger from host configuration. Trigger settings are
    /// resolved strictly here; handlers come later, in `initialize`.
    pub fn new_instance(
        &self,
        config: &TriggerConfig,
        source: Box<dyn EventSource>,
    ) -> Result<Trigger, RuntimeError> {
        let settings = self
            .resolver
            .resolve(&config.settings, &self.metadata.settings, true)?;
        Ok(Trigger {
            id: config.id.clone(),
            metadata: Arc::clone(&self.metadata),
            resolver: Arc::clone(&self.resolver),
            settings,
            source,
            handlers: Vec::new(),
            logger: Logger::root(),
            state: TriggerState::Registered,
        })
    }
}

impl fmt::Debug for TriggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerFactory")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Registered,
    Initialized,
    Started,
    Stopped,
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerState::Registered => write!(f, "registered"),
            TriggerState::Initialized => write!(f, "initialized"),
            TriggerState::Started => write!(f, "started"),
            TriggerState::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct Trigger {
    id: String,
    metadata: Arc<TriggerMetadata>,
    resolver: Arc<dyn SettingsResolver>,
    settings: Record,
    source: Box<dyn EventSource>,
    handlers: Vec<HandlerBinding>,
    logger: Logger,
    state: TriggerState,
}

impl Trigger {
    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn settings(&self) -> &Record {
        &self.settings
    }

    pub fn handlers(&self) -> &[HandlerBinding] {
        &self.handlers
    }

    pub fn metadata(&self) -> &Arc<TriggerMetadata> {
        &self.metadata
    }

    fn transition_error(&self, action: &'static str) -> RuntimeError {
        RuntimeError::InvalidTransition {
            artifact: self.id.clone(),
            action,
            state: self.state.to_string(),
        }
    }

    /// Resolve every handler's settings against the HandlerSettings contract.
    ///
    /// The first handler that fails resolution aborts initialization and is
    /// named in the error; no handlers are bound in that case.
    pub fn initialize(&mut self, ctx: &TriggerInitContext) -> Result<(), RuntimeError> {
        if self.state != TriggerState::Registered {
            return Err(self.transition_error("initialize"));
        }

        self.logger = ctx.logger.child(&self.id);
        let mut bindings = Vec::with_capacity(ctx.handlers.len());
        for handler in &ctx.handlers {
            let settings = self
                .resolver
                .resolve(handler.settings(), &self.metadata.handler_settings, true)
                .map_err(|e| {
                    self.logger.error(format_args!(
                        "Handler [{}] settings could not be resolved: {e}",
                        handler.name()
                    ));
                    RuntimeError::HandlerResolution {
                        handler: handler.name().to_string(),
                        source: Box::new(e),
                    }
                })?;
            bindings.push(HandlerBinding {
                handler: Arc::clone(handler),
                settings,
            });
        }

        self.logger.debug(format_args!("Initialized with {} handler(s)", bindings.len()));
        self.handlers = bindings;
        self.state = TriggerState::Initialized;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.state != TriggerState::Initialized {
            return Err(self.transition_error("start"));
        }
        self.source.start(&self.handlers)?;
        self.state = TriggerState::Started;
        self.logger.info("Trigger started");
        Ok(())
    }

    /// Deliver one event to the named handler.
    ///
    /// The raw event is coerced through the Output contract, so the handler
    /// sees every output field, zero-valued where the event omitted it.
    pub fn fire(
        &self,
        handler: &str,
        event: &Map<String, Value>,
    ) -> Result<Map<String, Value>, RuntimeError> {
        if self.state != TriggerState::Started {
            return Err(self.transition_error("fire"));
        }
        let binding = self
            .handlers
            .iter()
            .find(|b| b.handler.name() == handler)
            .ok_or_else(|| RuntimeError::HandlerNotFound(handler.to_string()))?;

        let output = self.metadata.output.from_map(event)?;
        binding.handler.handle(output.to_map())
    }

    /// Stop the event source. Stopping twice is a no-op; a stopped trigger
    /// cannot be restarted.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        match self.state {
            TriggerState::Stopped => Ok(()),
            TriggerState::Started => {
                self.source.stop()?;
                self.state = TriggerState::Stopped;
                self.logger.info("Trigger stopped");
                Ok(())
            }
            _ => {
                self.state = TriggerState::Stopped;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
