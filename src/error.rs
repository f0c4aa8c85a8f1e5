// SPDX-License-Identifier: MPL-2.0

//! Handling errors returned by the resolver.

use thiserror::Error;

use crate::{DependencyProvider, DerivationTree};

/// There is no solution for this set of dependencies.
pub type NoSolutionError<DP> = DerivationTree<
    <DP as DependencyProvider>::P,
    <DP as DependencyProvider>::VS,
    <DP as DependencyProvider>::M,
>;

/// Errors that may occur while solving dependencies.
#[derive(Error)]
pub enum ResolveError<DP: DependencyProvider> {
    /// There is no solution for this set of dependencies.
    ///
    /// The derivation tree is the structured proof: its leaves are the
    /// external facts (root choice, missing versions, dependency edges,
    /// custom causes) and its inner nodes the incompatibilities derived from
    /// them during conflict resolution.
    #[error("no solution for this set of dependencies")]
    NoSolution(NoSolutionError<DP>),

    /// Error arising when the implementer of [DependencyProvider] returned an
    /// error in the method [get_dependencies](DependencyProvider::get_dependencies).
    #[error("failed to retrieve the dependencies of {package} {version}")]
    ErrorRetrievingDependencies {
        /// Package whose dependencies we want.
        package: DP::P,
        /// Version of the package whose dependencies we want.
        version: DP::V,
        /// Error raised by the implementer of [DependencyProvider].
        source: DP::Err,
    },

    /// Error arising when the implementer of [DependencyProvider] returned an
    /// error in the method [choose_version](DependencyProvider::choose_version).
    #[error("failed to choose a version for {package}")]
    ErrorChoosingVersion {
        /// Package whose version we were choosing.
        package: DP::P,
        /// Error raised by the implementer of [DependencyProvider].
        source: DP::Err,
    },

    /// Error arising when the implementer of [DependencyProvider] returned an
    /// error in the method [should_cancel](DependencyProvider::should_cancel).
    #[error("the solve was cancelled")]
    ErrorInShouldCancel(#[source] DP::Err),

    /// An internal invariant of the resolver was broken.
    ///
    /// This is a bug: either in this library, or in the provider (for example
    /// a version returned by `choose_version` outside the requested range).
    #[error("{0}")]
    Failure(String),
}

impl<DP: DependencyProvider> std::fmt::Debug for ResolveError<DP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSolution(arg0) => f.debug_tuple("NoSolution").field(arg0).finish(),
            Self::ErrorRetrievingDependencies {
                package,
                version,
                source,
            } => f
                .debug_struct("ErrorRetrievingDependencies")
                .field("package", package)
                .field("version", version)
                .field("source", source)
                .finish(),
            Self::ErrorChoosingVersion { package, source } => f
                .debug_struct("ErrorChoosingVersion")
                .field("package", package)
                .field("source", source)
                .finish(),
            Self::ErrorInShouldCancel(arg0) => {
                f.debug_tuple("ErrorInShouldCancel").field(arg0).finish()
            }
            Self::Failure(arg0) => f.debug_tuple("Failure").field(arg0).finish(),
        }
    }
}
