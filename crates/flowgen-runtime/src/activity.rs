//! Activity lifecycle: Registered → Initialized → Evaluating → Cleaned.
//!
//! The [`ActivityFactory`] sitting in the registry is the Registered state.
//! [`ActivityFactory::new_instance`] resolves settings and yields an
//! Initialized [`Activity`]. One instance serves every flow that shares its
//! configuration, so `eval` takes `&self` and each call builds its own
//! Input/Output records. `cleanup` is terminal and idempotent; it refuses new
//! invocations but does not wait for ones already running.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use flowgen_core::Record;
use serde_json::{Map, Value};

use crate::definition::ActivityDefinition;
use crate::error::RuntimeError;
use crate::logger::Logger;
use crate::metadata::ActivityMetadata;
use crate::registry::ArtifactRef;
use crate::settings::{MetadataResolver, SettingsResolver};

/// Author-supplied activity behaviour.
pub trait ActivityLogic: Send + Sync {
    fn eval(
        &self,
        settings: &Record,
        input: &Record,
        output: &mut Record,
    ) -> Result<(), RuntimeError>;
}

/// Leaves the output at its zero values until the author fills in logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubLogic;

impl ActivityLogic for StubLogic {
    fn eval(&self, _: &Record, _: &Record, _: &mut Record) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// What the host hands an activity factory at initialization.
#[derive(Debug, Clone, Default)]
pub struct ActivityInitContext {
    pub settings: Map<String, Value>,
    pub logger: Logger,
}

/// Per-invocation host context.
pub trait ActivityContext {
    /// Name of the activity within the running flow.
    fn name(&self) -> &str;

    fn inputs(&self) -> &Map<String, Value>;

    fn set_outputs(&mut self, outputs: Map<String, Value>) -> Result<(), RuntimeError>;
}

/// In-memory [`ActivityContext`], for hosts and tests that keep values in maps.
#[derive(Debug, Clone, Default)]
pub struct MapActivityContext {
    pub name: String,
    pub inputs: Map<String, Value>,
    pub outputs: Map<String, Value>,
}

impl MapActivityContext {
    pub fn new(name: impl Into<String>, inputs: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs: Map::new(),
        }
    }
}

impl ActivityContext for MapActivityContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &Map<String, Value> {
        &self.inputs
    }

    fn set_outputs(&mut self, outputs: Map<String, Value>) -> Result<(), RuntimeError> {
        self.outputs = outputs;
        Ok(())
    }
}

/// Registered form of an activity type.
pub struct ActivityFactory {
    reference: ArtifactRef,
    logger_name: String,
    metadata: Arc<ActivityMetadata>,
    logic: Arc<dyn ActivityLogic>,
    resolver: Arc<dyn SettingsResolver>,
}

impl ActivityFactory {
    pub fn new(extension: &str, definition: &ActivityDefinition) -> Self {
        let reference = ArtifactRef::activity(extension, &definition.name);
        Self {
            metadata: Arc::new(ActivityMetadata::new(&reference, definition)),
            logger_name: format!("{extension}-{}", definition.name),
            reference,
            logic: Arc::new(StubLogic),
            resolver: Arc::new(MetadataResolver),
        }
    }

    pub fn with_logic(mut self, logic: impl ActivityLogic + 'static) -> Self {
        self.logic = Arc::new(logic);
        self
    }

    pub fn with_resolver(mut self, resolver: impl SettingsResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn reference(&self) -> &ArtifactRef {
        &self.reference
    }

    pub fn metadata(&self) -> &Arc<ActivityMetadata> {
        &self.metadata
    }

    /// Resolve raw settings and produce an initialized instance.
    pub fn new_instance(&self, ctx: &ActivityInitContext) -> Result<Activity, RuntimeError> {
        let settings = self
            .resolver
            .resolve(&ctx.settings, &self.metadata.settings, true)?;

        let logger = ctx.logger.child(&self.logger_name);
        for field in self.metadata.settings.fields() {
            if let Some(value) = settings.get(&field.name) {
                logger.debug(format_args!("Setting: {} = {}", field.ident, value.to_json()));
            }
        }

        Ok(Activity {
            name: self.metadata.descriptor.name.clone(),
            logger,
            settings,
            metadata: Arc::clone(&self.metadata),
            logic: Arc::clone(&self.logic),
            in_flight: AtomicUsize::new(0),
            cleaned: AtomicBool::new(false),
        })
    }
}

impl fmt::Debug for ActivityFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityFactory")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Initialized,
    /// At least one invocation is running.
    Evaluating,
    Cleaned,
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityState::Initialized => write!(f, "initialized"),
            ActivityState::Evaluating => write!(f, "evaluating"),
            ActivityState::Cleaned => write!(f, "cleaned"),
        }
    }
}

/// An initialized activity instance.
pub struct Activity {
    name: String,
    logger: Logger,
    settings: Record,
    metadata: Arc<ActivityMetadata>,
    logic: Arc<dyn ActivityLogic>,
    in_flight: AtomicUsize,
    cleaned: AtomicBool,
}

impl Activity {
    pub fn metadata(&self) -> &Arc<ActivityMetadata> {
        &self.metadata
    }

    pub fn settings(&self) -> &Record {
        &self.settings
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn state(&self) -> ActivityState {
        if self.cleaned.load(Ordering::Acquire) {
            ActivityState::Cleaned
        } else if self.in_flight.load(Ordering::Acquire) > 0 {
            ActivityState::Evaluating
        } else {
            ActivityState::Initialized
        }
    }

    /// Run one invocation: Input from the context, author logic, Output back
    /// to the context. Returns `true` when the activity is done.
    ///
    /// An invocation admitted before `cleanup` runs to completion.
    pub fn eval(&self, ctx: &mut dyn ActivityContext) -> Result<bool, RuntimeError> {
        // Count first so `state` never reports Initialized mid-call.
        let _guard = InFlight::enter(&self.in_flight);
        if self.cleaned.load(Ordering::Acquire) {
            return Err(RuntimeError::InvalidTransition {
                artifact: self.name.clone(),
                action: "eval",
                state: ActivityState::Cleaned.to_string(),
            });
        }
        self.eval_once(ctx)
    }

    fn eval_once(&self, ctx: &mut dyn ActivityContext) -> Result<bool, RuntimeError> {
        self.logger.debug(format_args!("Executing Activity [{}]", ctx.name()));

        let input = self.metadata.input.from_map(ctx.inputs())?;
        for field in self.metadata.input.fields() {
            if let Some(value) = input.get(&field.name) {
                self.logger.debug(format_args!("Input: {} = {}", field.ident, value.to_json()));
            }
        }

        let mut output = self.metadata.output.new_record();
        self.logic.eval(&self.settings, &input, &mut output)?;

        let outputs = output.to_map();
        for (key, value) in &outputs {
            self.logger.debug(format_args!("Output: {key} = {value}"));
        }
        ctx.set_outputs(outputs)?;

        self.logger.debug(format_args!("Execution of Activity [{}] completed", ctx.name()));
        Ok(true)
    }

    /// Release the instance. Safe to call more than once.
    pub fn cleanup(&self) -> Result<(), RuntimeError> {
        if !self.cleaned.swap(true, Ordering::AcqRel) {
            let running = self.in_flight.load(Ordering::Acquire);
            if running > 0 {
                self.logger.warn(format_args!(
                    "Activity cleaned up with {running} invocation(s) running"
                ));
            } else {
                self.logger.debug("Activity cleaned up");
            }
        }
        Ok(())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activity")
            .field("name", &self.name)
            .field("logger", &self.logger)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::{FieldSpec, FieldType, Schema, TypedValue};
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    fn definition() -> ActivityDefinition {
        ActivityDefinition {
            name: "greeter".into(),
            settings: Schema::new(vec![FieldSpec::new("greeting", FieldType::String)]).unwrap(),
            input: Schema::new(vec![FieldSpec::new("name", FieldType::String)]).unwrap(),
            output: Schema::new(vec![FieldSpec::new("message", FieldType::String)]).unwrap(),
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    struct Greet;

    impl ActivityLogic for Greet {
        fn eval(
            &self,
            settings: &Record,
            input: &Record,
            output: &mut Record,
        ) -> Result<(), RuntimeError> {
            let greeting = settings.get("greeting").and_then(TypedValue::as_str).unwrap_or("");
            let name = input.get("name").and_then(TypedValue::as_str).unwrap_or("");
            output.set("message", format!("{greeting}, {name}"))?;
            Ok(())
        }
    }

    fn init(greeting: &str) -> ActivityInitContext {
        ActivityInitContext {
            settings: map(json!({ "greeting": greeting })),
            logger: Logger::root(),
        }
    }

    #[test]
    fn eval_reads_input_and_writes_output() {
        let factory = ActivityFactory::new("mylib", &definition()).with_logic(Greet);
        let activity = factory.new_instance(&init("Hello")).unwrap();
        assert_eq!(activity.logger().name(), "flowgen.mylib-greeter");

        let mut ctx = MapActivityContext::new("greet-step", map(json!({"name": "World"})));
        assert!(activity.eval(&mut ctx).unwrap());
        assert_eq!(Value::Object(ctx.outputs), json!({"message": "Hello, World"}));
        assert_eq!(activity.state(), ActivityState::Initialized);
    }

    #[test]
    fn stub_logic_writes_zero_output() {
        let activity = ActivityFactory::new("mylib", &definition())
            .new_instance(&init("Hi"))
            .unwrap();
        let mut ctx = MapActivityContext::new("step", Map::new());
        activity.eval(&mut ctx).unwrap();
        assert_eq!(Value::Object(ctx.outputs), json!({"message": ""}));
    }

    #[test]
    fn missing_settings_abort_initialization() {
        let factory = ActivityFactory::new("mylib", &definition());
        let err = factory
            .new_instance(&ActivityInitContext::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::SettingsResolution { .. }));
    }

    #[test]
    fn cleanup_is_idempotent_and_terminal() {
        let activity = ActivityFactory::new("mylib", &definition())
            .new_instance(&init("Hi"))
            .unwrap();
        activity.cleanup().unwrap();
        activity.cleanup().unwrap();
        assert_eq!(activity.state(), ActivityState::Cleaned);

        let mut ctx = MapActivityContext::new("step", Map::new());
        let err = activity.eval(&mut ctx).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidTransition { .. }));
    }

    struct Gate {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl ActivityLogic for Gate {
        fn eval(&self, _: &Record, _: &Record, _: &mut Record) -> Result<(), RuntimeError> {
            self.entered.wait();
            self.release.wait();
            Ok(())
        }
    }

    #[test]
    fn cleanup_during_eval_lets_the_running_call_finish() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let activity = Arc::new(
            ActivityFactory::new("mylib", &definition())
                .with_logic(Gate {
                    entered: Arc::clone(&entered),
                    release: Arc::clone(&release),
                })
                .new_instance(&init("Hi"))
                .unwrap(),
        );

        let running = {
            let activity = Arc::clone(&activity);
            thread::spawn(move || {
                let mut ctx = MapActivityContext::new("step", Map::new());
                activity.eval(&mut ctx)
            })
        };

        entered.wait();
        assert_eq!(activity.state(), ActivityState::Evaluating);
        activity.cleanup().unwrap();
        assert_eq!(activity.state(), ActivityState::Cleaned);

        release.wait();
        assert!(running.join().unwrap().unwrap());

        let mut ctx = MapActivityContext::new("late", Map::new());
        let err = activity.eval(&mut ctx).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidTransition { .. }));
        assert_eq!(activity.state(), ActivityState::Cleaned);
    }

    #[test]
    fn rejected_eval_leaves_no_invocation_counted() {
        let activity = ActivityFactory::new("mylib", &definition())
            .new_instance(&init("Hi"))
            .unwrap();
        activity.cleanup().unwrap();
        let mut ctx = MapActivityContext::new("step", Map::new());
        assert!(activity.eval(&mut ctx).is_err());
        assert_eq!(activity.in_flight.load(Ordering::Acquire), 0);
    }

    #[test]
    fn input_coercion_failure_reaches_caller() {
        let def = ActivityDefinition {
            input: Schema::new(vec![FieldSpec::new("count", FieldType::Int)]).unwrap(),
            ..definition()
        };
        let activity = ActivityFactory::new("mylib", &def)
            .new_instance(&init("Hi"))
            .unwrap();
        let mut ctx = MapActivityContext::new("step", map(json!({"count": "lots"})));
        let err = activity.eval(&mut ctx).unwrap_err();
        assert!(matches!(err, RuntimeError::Contract(_)));
        assert!(ctx.outputs.is_empty());
    }
}
