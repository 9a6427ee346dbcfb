//! Host-facing side of flowgen artifacts.
//!
//! Wraps compiled contracts and signatures from `flowgen-core` into the three
//! artifact lifecycles (activities, triggers and functions) and the registry
//! the host looks them up in.

pub mod activity;
pub mod definition;
pub mod error;
pub mod function;
pub mod logger;
pub mod metadata;
pub mod registry;
pub mod settings;
pub mod trigger;

pub use activity::{
    Activity, ActivityContext, ActivityFactory, ActivityInitContext, ActivityLogic,
    ActivityState, MapActivityContext, StubLogic,
};
pub use definition::{ActivityDefinition, FunctionDefinition, TriggerDefinition};
pub use error::RuntimeError;
pub use function::{Function, FunctionBody, GeneratedFunction};
pub use logger::Logger;
pub use metadata::{ActivityMetadata, Descriptor, FieldDescriptor, TriggerMetadata};
pub use registry::{Artifact, ArtifactRef, Registry};
pub use settings::{MetadataResolver, SettingsResolver};
pub use trigger::{
    EventSource, Handler, HandlerBinding, NoopSource, Trigger, TriggerConfig, TriggerFactory,
    TriggerInitContext, TriggerState,
};
