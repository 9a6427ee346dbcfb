//! Expression functions: stateless and callable concurrently.

use std::fmt;
use std::sync::Arc;

use flowgen_core::{RepresentationType, Signature, TypedValue};
use serde_json::Value;

use crate::definition::FunctionDefinition;
use crate::error::RuntimeError;
use crate::metadata::{Descriptor, function_descriptor};
use crate::registry::ArtifactRef;

/// The host-facing function protocol.
pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> &str;

    /// Parameter representation types and the variadic flag.
    fn sig(&self) -> (Vec<RepresentationType>, bool);

    fn eval(&self, params: &[Value]) -> Result<TypedValue, RuntimeError>;
}

/// Author-supplied function body, called with already coerced arguments.
pub trait FunctionBody: Send + Sync {
    fn call(&self, args: &[TypedValue]) -> Result<TypedValue, RuntimeError>;
}

impl<F> FunctionBody for F
where
    F: Fn(&[TypedValue]) -> Result<TypedValue, RuntimeError> + Send + Sync,
{
    fn call(&self, args: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
        self(args)
    }
}

/// A [`Function`] built from a declared signature.
///
/// Without a body it returns a placeholder matching the declared return type.
pub struct GeneratedFunction {
    name: String,
    category: String,
    signature: Signature,
    descriptor: Descriptor,
    body: Option<Arc<dyn FunctionBody>>,
}

impl GeneratedFunction {
    pub fn new(definition: &FunctionDefinition) -> Result<Self, RuntimeError> {
        let signature = Signature::compile(&definition.arguments, definition.return_type)?;
        let reference = ArtifactRef::function(&definition.category, &definition.name);
        let descriptor = function_descriptor(&reference, definition, &signature);
        Ok(Self {
            name: definition.name.clone(),
            category: definition.category.clone(),
            signature,
            descriptor,
            body: None,
        })
    }

    pub fn with_body(mut self, body: impl FunctionBody + 'static) -> Self {
        self.body = Some(Arc::new(body));
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl Function for GeneratedFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn sig(&self) -> (Vec<RepresentationType>, bool) {
        self.signature.sig()
    }

    fn eval(&self, params: &[Value]) -> Result<TypedValue, RuntimeError> {
        tracing::debug!(function = %self.name, category = %self.category, "Start of function");

        let args = self.signature.coerce_params(params)?;
        match &self.body {
            Some(body) => body.call(&args),
            None => Ok(self.signature.placeholder_return()),
        }
    }
}

impl fmt::Debug for GeneratedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedFunction")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("signature", &self.signature)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
