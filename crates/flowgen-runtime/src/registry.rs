use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use flowgen_core::ArtifactKind;
use serde::Serialize;

use crate::activity::ActivityFactory;
use crate::error::RuntimeError;
use crate::function::{Function, GeneratedFunction};
use crate::trigger::TriggerFactory;

/// Key an artifact is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn activity(extension: &str, name: &str) -> Self {
        Self(format!("{extension}/activity/{name}"))
    }

    pub fn trigger(extension: &str, name: &str) -> Self {
        Self(format!("{extension}/trigger/{name}"))
    }

    pub fn function(category: &str, name: &str) -> Self {
        Self(format!("{category}.{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Anything the host can look up by reference.
#[derive(Clone)]
pub enum Artifact {
    Activity(Arc<ActivityFactory>),
    Trigger(Arc<TriggerFactory>),
    Function(Arc<dyn Function>),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Activity(_) => ArtifactKind::Activity,
            Artifact::Trigger(_) => ArtifactKind::Trigger,
            Artifact::Function(_) => ArtifactKind::Function,
        }
    }

    pub fn reference(&self) -> ArtifactRef {
        match self {
            Artifact::Activity(a) => a.reference().clone(),
            Artifact::Trigger(t) => t.reference().clone(),
            Artifact::Function(f) => ArtifactRef::function(f.category(), f.name()),
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind())
            .field("reference", &self.reference())
            .finish()
    }
}

impl From<ActivityFactory> for Artifact {
    fn from(factory: ActivityFactory) -> Self {
        Artifact::Activity(Arc::new(factory))
    }
}

impl From<TriggerFactory> for Artifact {
    fn from(factory: TriggerFactory) -> Self {
        Artifact::Trigger(Arc::new(factory))
    }
}

impl From<GeneratedFunction> for Artifact {
    fn from(function: GeneratedFunction) -> Self {
        Artifact::Function(Arc::new(function))
    }
}

impl From<Arc<dyn Function>> for Artifact {
    fn from(function: Arc<dyn Function>) -> Self {
        Artifact::Function(function)
    }
}

/// Artifact registry owned by host bootstrap.
///
/// Each reference is registered at most once; there is no unregister.
pub struct Registry {
    entries: RwLock<BTreeMap<ArtifactRef, Artifact>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an artifact under its derived reference.
    ///
    /// A duplicate reference is logged and returned as
    /// [`RuntimeError::RegistrationConflict`]; the existing entry is kept.
    pub fn register(&self, artifact: impl Into<Artifact>) -> Result<ArtifactRef, RuntimeError> {
        let artifact = artifact.into();
        let reference = artifact.reference();

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&reference) {
            tracing::error!(
                artifact = %reference,
                kind = %artifact.kind(),
                "Duplicate artifact registration"
            );
            return Err(RuntimeError::RegistrationConflict(reference.to_string()));
        }

        tracing::info!(artifact = %reference, kind = %artifact.kind(), "Artifact registered");
        entries.insert(reference.clone(), artifact);
        Ok(reference)
    }

    pub fn get(&self, reference: &ArtifactRef) -> Option<Artifact> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(reference).cloned()
    }

    pub fn activity(&self, reference: &ArtifactRef) -> Result<Arc<ActivityFactory>, RuntimeError> {
        match self.get(reference) {
            Some(Artifact::Activity(a)) => Ok(a),
            _ => Err(RuntimeError::ArtifactNotFound(reference.to_string())),
        }
    }

    pub fn trigger(&self, reference: &ArtifactRef) -> Result<Arc<TriggerFactory>, RuntimeError> {
        match self.get(reference) {
            Some(Artifact::Trigger(t)) => Ok(t),
            _ => Err(RuntimeError::ArtifactNotFound(reference.to_string())),
        }
    }

    pub fn function(&self, reference: &ArtifactRef) -> Result<Arc<dyn Function>, RuntimeError> {
        match self.get(reference) {
            Some(Artifact::Function(f)) => Ok(f),
            _ => Err(RuntimeError::ArtifactNotFound(reference.to_string())),
        }
    }

    /// Registered references in sorted order.
    pub fn references(&self) -> Vec<ArtifactRef> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
