use flowgen_core::{Contract, FieldSpec, FieldType, Schema, Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::definition::{ActivityDefinition, FunctionDefinition, TriggerDefinition};
use crate::registry::ArtifactRef;

pub const ACTIVITY_TYPE: &str = "flowgen:activity";
pub const TRIGGER_TYPE: &str = "flowgen:trigger";
pub const FUNCTION_TYPE: &str = "flowgen:function";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
}

impl From<&FieldSpec> for FieldDescriptor {
    fn from(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name.clone(),
            field_type: spec.field_type,
            required: spec.required(),
        }
    }
}

fn describe(schema: &Schema) -> Vec<FieldDescriptor> {
    schema.fields().iter().map(FieldDescriptor::from).collect()
}

/// Serializable description of one artifact type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handler: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FieldDescriptor>,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<FieldType>,
    /// SHA-256 of the descriptor with this field empty.
    #[serde(default)]
    pub fingerprint: String,
}

impl Descriptor {
    fn new(name: &str, kind: &str, reference: &ArtifactRef) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            reference: reference.to_string(),
            settings: Vec::new(),
            handler: Vec::new(),
            input: Vec::new(),
            output: Vec::new(),
            args: Vec::new(),
            return_type: None,
            fingerprint: String::new(),
        }
    }

    /// Compute a stable SHA-256 over the canonical JSON form.
    pub fn compute_fingerprint(&self) -> String {
        let unsealed = Self {
            fingerprint: String::new(),
            ..self.clone()
        };
        let canonical = serde_json::to_string(&unsealed).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn sealed(mut self) -> Self {
        self.fingerprint = self.compute_fingerprint();
        self
    }
}

/// Fixed metadata of an Activity type, shared by all of its instances.
#[derive(Debug)]
pub struct ActivityMetadata {
    pub descriptor: Descriptor,
    pub settings: Contract,
    pub input: Contract,
    pub output: Contract,
}

impl ActivityMetadata {
    pub fn new(reference: &ArtifactRef, definition: &ActivityDefinition) -> Self {
        let mut descriptor = Descriptor::new(&definition.name, ACTIVITY_TYPE, reference);
        descriptor.settings = describe(&definition.settings);
        descriptor.input = describe(&definition.input);
        descriptor.output = describe(&definition.output);
        Self {
            descriptor: descriptor.sealed(),
            settings: Contract::compile("Settings", &definition.settings),
            input: Contract::compile("Input", &definition.input),
            output: Contract::compile("Output", &definition.output),
        }
    }
}

/// Fixed metadata of a Trigger type, shared by all of its instances.
#[derive(Debug)]
pub struct TriggerMetadata {
    pub descriptor: Descriptor,
    pub settings: Contract,
    pub handler_settings: Contract,
    pub output: Contract,
}

impl TriggerMetadata {
    pub fn new(reference: &ArtifactRef, definition: &TriggerDefinition) -> Self {
        let mut descriptor = Descriptor::new(&definition.name, TRIGGER_TYPE, reference);
        descriptor.settings = describe(&definition.settings);
        descriptor.handler = describe(&definition.handler);
        descriptor.output = describe(&definition.output);
        Self {
            descriptor: descriptor.sealed(),
            settings: Contract::compile("Settings", &definition.settings),
            handler_settings: Contract::compile("HandlerSettings", &definition.handler),
            output: Contract::compile("Output", &definition.output),
        }
    }
}

pub(crate) fn function_descriptor(
    reference: &ArtifactRef,
    definition: &FunctionDefinition,
    signature: &Signature,
) -> Descriptor {
    let mut descriptor = Descriptor::new(&definition.name, FUNCTION_TYPE, reference);
    descriptor.args = signature
        .params()
        .iter()
        .map(|p| FieldDescriptor {
            name: p.name.clone(),
            field_type: p.arg_type,
            required: true,
        })
        .collect();
    descriptor.return_type = Some(signature.return_type());
    descriptor.sealed()
}
