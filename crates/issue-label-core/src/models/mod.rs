//! Model variants implementing [`IssueLabelModel`](crate::traits::IssueLabelModel).
//!
//! | Variant | Signal | Confidence policy |
//! |---------|--------|-------------------|
//! | [`UniversalKindLabelModel`] | raw title + body | static per-class cut-off |
//! | [`OrgModel`] | raw title + body (remote classifier) | single minimum score |
//! | [`RepoSpecificModel`] | issue embedding -> MLP | calibrated [`LabelColumns`](crate::calibration::LabelColumns) |
//! | [`CombinedLabelModels`] | ordered list of the above | last model wins per label |

mod combined;
mod mlp;
mod org;
mod repo_specific;
mod universal;

pub use combined::CombinedLabelModels;
pub use mlp::{DenseLayer, MlpClassifier};
pub use org::{OrgModel, DEFAULT_ORG_MIN_SCORE};
pub use repo_specific::{LoadedRepoModel, RepoSpecificModel};
pub use universal::{
    ClassThresholds, UniversalKindLabelModel, DEFAULT_CLASS_NAMES, DEFAULT_CLASS_THRESHOLD,
    QUESTION_CLASS_THRESHOLD,
};

/// Join body and comment texts the way every text-based model sees them.
pub(crate) fn join_text(text: &[String]) -> String {
    text.join("\n")
}
