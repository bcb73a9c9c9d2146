//! ModelRegistry: immutable mapping from model keys to models, plus routing.
//!
//! The registry is built once at process start and never mutated afterward.
//! It is handed to the prediction pipeline by `Arc`, so concurrent readers
//! need no locking.
//!
//! # Keys
//!
//! | Key | Model |
//! |-----|-------|
//! | `universal` | global fallback |
//! | `<org>` | organization model |
//! | `<org>_combined` | `[universal, <org>]` |
//! | `<org>/<repo>_combined` | `[universal, <org>?, <org>/<repo>]` |
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use issue_label_core::registry::ModelRegistry;
//! use issue_label_core::traits::IssueLabelModel;
//!
//! fn example(universal: Arc<dyn IssueLabelModel>, kubeflow: Arc<dyn IssueLabelModel>) {
//!     let registry = ModelRegistry::builder(universal)
//!         .with_org_model("kubeflow", kubeflow)
//!         .build()
//!         .unwrap();
//!
//!     assert_eq!(registry.resolve_model("kubeflow", "pipelines"), "kubeflow_combined");
//!     assert_eq!(registry.resolve_model("tensorflow", "tensorflow"), "universal");
//! }
//! ```

mod core;
mod router;


pub use self::core::{ModelRegistry, ModelRegistryBuilder};
pub use router::{combined_model_name, UNIVERSAL_MODEL_NAME};
