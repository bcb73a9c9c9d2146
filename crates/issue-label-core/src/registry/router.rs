//! Model key construction and most-specific-first resolution.

use super::core::ModelRegistry;

/// Key of the global fallback model.
pub const UNIVERSAL_MODEL_NAME: &str = "universal";

/// `"<org>_combined"` or `"<org>/<repo>_combined"`.
pub fn combined_model_name(org: &str, repo: Option<&str>) -> String {
    match repo {
        Some(repo) => format!("{}/{}_combined", org, repo),
        None => format!("{}_combined", org),
    }
}

impl ModelRegistry {
    /// Most specific registered key for `org/repo`.
    ///
    /// Total: an org/repo pair with no dedicated model resolves to
    /// [`UNIVERSAL_MODEL_NAME`].
    pub fn resolve_model(&self, org: &str, repo: &str) -> String {
        [
            combined_model_name(org, Some(repo)),
            combined_model_name(org, None),
        ]
        .into_iter()
        .find(|key| self.contains(key))
        .unwrap_or_else(|| UNIVERSAL_MODEL_NAME.to_string())
    }
}
