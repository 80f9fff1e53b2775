//! Reportable loader conditions.

use keel_ir::{Locator, PhysicalId};
use thiserror::Error;

use crate::Severity;

/// A condition the loader reports to its diagnostics sink.
///
/// These are never returned as `Err` from loading operations; each one is
/// turned into a [`Diagnostic`](crate::Diagnostic) at the point it is found.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// A dependency edge was pruned because waiting on it would never end.
    ///
    /// `chain` starts and ends with the module whose dependency was pruned.
    #[error("Found circular dependencies: {}", join_chain(.chain))]
    CircularDependency { chain: Vec<Locator> },

    /// An anonymous registration arrived while another one was still waiting
    /// for its fetch to supply a locator. The newer registration replaces it.
    #[error("anonymous module registered while another anonymous module is pending")]
    DuplicateAnonymous,

    /// The host could not tell which resource an anonymous registration
    /// came from; it falls back to association on fetch completion.
    #[error("failed to derive locator for anonymous module")]
    DerivationFailed { source_text: Option<String> },

    /// An identifier given to `modify` did not resolve to a locator.
    #[error("cannot resolve module identifier `{id}`")]
    Unresolvable { id: String },

    /// A fetcher dropped its completion token without completing it.
    #[error("fetch of `{physical_id}` was abandoned without completing")]
    FetchAbandoned { physical_id: PhysicalId },
}

impl LoaderError {
    /// Short stable code, for filtering logs.
    pub fn code(&self) -> &'static str {
        match self {
            LoaderError::CircularDependency { .. } => "K0001",
            LoaderError::DuplicateAnonymous => "K0002",
            LoaderError::DerivationFailed { .. } => "K0003",
            LoaderError::Unresolvable { .. } => "K0004",
            LoaderError::FetchAbandoned { .. } => "K0005",
        }
    }

    /// How loudly this condition is reported.
    pub fn severity(&self) -> Severity {
        match self {
            LoaderError::DuplicateAnonymous | LoaderError::FetchAbandoned { .. } => {
                Severity::Error
            }
            LoaderError::CircularDependency { .. }
            | LoaderError::DerivationFailed { .. }
            | LoaderError::Unresolvable { .. } => Severity::Warning,
        }
    }

    /// Extra context shown next to the message.
    pub fn detail(&self) -> Option<String> {
        match self {
            LoaderError::CircularDependency { chain } => Some(join_chain(chain)),
            LoaderError::DerivationFailed { source_text } => source_text.clone(),
            LoaderError::DuplicateAnonymous
            | LoaderError::Unresolvable { .. }
            | LoaderError::FetchAbandoned { .. } => None,
        }
    }
}

fn join_chain(chain: &[Locator]) -> String {
    chain
        .iter()
        .map(Locator::as_str)
        .collect::<Vec<_>>()
        .join(" --> ")
}
