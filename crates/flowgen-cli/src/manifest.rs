use std::path::{Path, PathBuf};

use flowgen_runtime::{
    ActivityDefinition, ActivityFactory, ArtifactRef, Descriptor, FunctionDefinition,
    GeneratedFunction, Registry, RuntimeError, TriggerDefinition, TriggerFactory,
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("manifest has no extension name")]
    MissingName,
}

/// An extension: one named library of activities, triggers and functions.
#[derive(Debug, Default, Deserialize)]
pub struct ExtensionManifest {
    pub name: String,
    #[serde(default)]
    pub activity: Vec<ActivityDefinition>,
    #[serde(default)]
    pub trigger: Vec<TriggerDefinition>,
    #[serde(default)]
    pub function: Vec<FunctionDefinition>,
}

impl ExtensionManifest {
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(content)?;
        if manifest.name.trim().is_empty() {
            return Err(ManifestError::MissingName);
        }
        tracing::debug!(
            extension = %manifest.name,
            activities = manifest.activity.len(),
            triggers = manifest.trigger.len(),
            functions = manifest.function.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    pub fn activities(&self) -> impl Iterator<Item = ActivityFactory> + '_ {
        self.activity
            .iter()
            .map(|def| ActivityFactory::new(&self.name, def))
    }

    pub fn triggers(&self) -> impl Iterator<Item = TriggerFactory> + '_ {
        self.trigger
            .iter()
            .map(|def| TriggerFactory::new(&self.name, def))
    }

    pub fn functions(&self) -> Result<Vec<GeneratedFunction>, RuntimeError> {
        self.function.iter().map(GeneratedFunction::new).collect()
    }

    /// Descriptors of every declared artifact, activities first.
    pub fn descriptors(&self) -> Result<Vec<Descriptor>, RuntimeError> {
        let mut descriptors: Vec<Descriptor> = self
            .activities()
            .map(|a| a.metadata().descriptor.clone())
            .collect();
        descriptors.extend(self.triggers().map(|t| t.metadata().descriptor.clone()));
        for function in self.functions()? {
            descriptors.push(function.descriptor().clone());
        }
        Ok(descriptors)
    }

    /// Register every declared artifact, stopping at the first conflict.
    pub fn register(&self, registry: &Registry) -> Result<Vec<ArtifactRef>, RuntimeError> {
        let mut references = Vec::new();
        for activity in self.activities() {
            references.push(registry.register(activity)?);
        }
        for trigger in self.triggers() {
            references.push(registry.register(trigger)?);
        }
        for function in self.functions()? {
            references.push(registry.register(function)?);
        }
        Ok(references)
    }
}
