//! Core ModelRegistry struct and its builder.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::models::{CombinedLabelModels, RepoSpecificModel};
use crate::traits::IssueLabelModel;

use super::router::{combined_model_name, UNIVERSAL_MODEL_NAME};

/// Read-only mapping from model key to model.
pub struct ModelRegistry {
    pub(super) models: HashMap<String, Arc<dyn IssueLabelModel>>,
    pub(super) repo_models: HashMap<String, Arc<RepoSpecificModel>>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    pub fn builder(universal: Arc<dyn IssueLabelModel>) -> ModelRegistryBuilder {
        ModelRegistryBuilder {
            universal,
            org_models: BTreeMap::new(),
            repo_models: BTreeMap::new(),
        }
    }

    /// Look up a model by key, bypassing resolution.
    ///
    /// # Errors
    /// - `ModelNotFound` carrying `key` if it is not registered
    pub fn get(&self, key: &str) -> CoreResult<Arc<dyn IssueLabelModel>> {
        self.models
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::ModelNotFound {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.models.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The repo-specific member for `owner/repo`, if one was registered.
    ///
    /// Used by the consumer to refresh artifacts before predicting.
    pub fn repo_model(&self, owner: &str, repo: &str) -> Option<Arc<RepoSpecificModel>> {
        self.repo_models.get(&format!("{}/{}", owner, repo)).cloned()
    }
}

/// Collects the static model list, then derives the combined keys.
pub struct ModelRegistryBuilder {
    universal: Arc<dyn IssueLabelModel>,
    org_models: BTreeMap<String, Arc<dyn IssueLabelModel>>,
    repo_models: BTreeMap<(String, String), Arc<RepoSpecificModel>>,
}

impl ModelRegistryBuilder {
    pub fn with_org_model(mut self, org: impl Into<String>, model: Arc<dyn IssueLabelModel>) -> Self {
        self.org_models.insert(org.into(), model);
        self
    }

    pub fn with_repo_model(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        model: Arc<RepoSpecificModel>,
    ) -> Self {
        self.repo_models.insert((owner.into(), repo.into()), model);
        self
    }

    /// # Errors
    /// - `ConfigError` if an organization is named `universal`
    pub fn build(self) -> CoreResult<ModelRegistry> {
        let mut models: HashMap<String, Arc<dyn IssueLabelModel>> = HashMap::new();
        models.insert(UNIVERSAL_MODEL_NAME.to_string(), self.universal.clone());

        for (org, model) in &self.org_models {
            if org == UNIVERSAL_MODEL_NAME {
                return Err(CoreError::ConfigError(format!(
                    "organization model cannot use the reserved key {}",
                    UNIVERSAL_MODEL_NAME
                )));
            }
            let key = combined_model_name(org, None);
            let combined = CombinedLabelModels::new(key.clone(), vec![self.universal.clone(), model.clone()])?;
            models.insert(org.clone(), model.clone());
            models.insert(key, Arc::new(combined));
        }

        let mut repo_models = HashMap::new();
        for ((owner, repo), model) in self.repo_models {
            let mut members = vec![self.universal.clone()];
            if let Some(org_model) = self.org_models.get(&owner) {
                members.push(org_model.clone());
            }
            members.push(model.clone() as Arc<dyn IssueLabelModel>);

            let key = combined_model_name(&owner, Some(&repo));
            models.insert(key.clone(), Arc::new(CombinedLabelModels::new(key, members)?));
            repo_models.insert(format!("{}/{}", owner, repo), model);
        }

        info!(
            models = models.len(),
            repo_models = repo_models.len(),
            "Model registry built"
        );

        Ok(ModelRegistry {
            models,
            repo_models,
        })
    }
}
