//! Error types for visitors and handlers.
//!
//! Traversal never stops at the first handler failure. Every failure is
//! collected, and the collection is returned as one [`Error`]. A single
//! failure is returned as itself; several become [`Error::Multiple`], whose
//! leaves stay individually inspectable through [`Error::errors`] and
//! [`Error::downcast_ref`].

use crate::document::tree::NodeId;
use crate::yamlpath::YamlPathError;
use std::fmt::{Debug, Display};
use thiserror::Error;

/// Result alias used throughout the visitor API.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The top-level node handed to a visitor is not a document.
    #[error("visitor can only be invoked on a document or multi-document input")]
    NotADocument,

    #[error("handler {handler} implements none of the visitor capabilities")]
    NoCapabilities { handler: String },

    #[error("no handlers provided, at least one is expected")]
    NoHandlers,

    #[error("invalid path `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: YamlPathError,
    },

    #[error("path matcher lookup failed for `{path}`: {source}")]
    PathLookup {
        path: String,
        #[source]
        source: YamlPathError,
    },

    /// A matcher bound to one tree was queried with another.
    #[error("path matcher is bound to a different tree")]
    TreeMismatch,

    /// A document node found below the top level of a walk.
    #[error("document node {0} cannot be visited as a value")]
    UnexpectedDocument(NodeId),

    /// Failure reported by a handler.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    #[error("{}", join_messages(.0))]
    Multiple(Vec<Error>),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl Error {
    /// Wraps an arbitrary message as a handler failure.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlwalk::Error;
    ///
    /// let err = Error::handler("it makes no sense");
    /// assert_eq!(err.to_string(), "it makes no sense");
    /// ```
    pub fn handler<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Error::Handler(anyhow::Error::msg(message))
    }

    /// Joins errors into one. Returns `None` when there are none.
    pub fn join(errors: impl IntoIterator<Item = Error>) -> Option<Error> {
        let mut set = ErrorSet::default();
        for err in errors {
            set.push(err);
        }
        set.into_result().err()
    }

    /// The individual errors this error stands for.
    ///
    /// A joined error yields each of its members; any other error yields
    /// itself.
    pub fn errors(&self) -> std::slice::Iter<'_, Error> {
        match self {
            Error::Multiple(errors) => errors.iter(),
            other => std::slice::from_ref(other).iter(),
        }
    }

    /// Finds the first handler failure of type `E` among the joined errors.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.errors().find_map(|err| match err {
            Error::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        })
    }
}

/// Accumulates errors from a walk without stopping it.
#[derive(Debug, Default)]
pub(crate) struct ErrorSet {
    errors: Vec<Error>,
}

impl ErrorSet {
    pub(crate) fn push(&mut self, err: Error) {
        match err {
            Error::Multiple(inner) => self.errors.extend(inner),
            other => self.errors.push(other),
        }
    }

    /// Records the error of `result`, if any. Returns true on success.
    pub(crate) fn record(&mut self, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.push(err);
                false
            }
        }
    }

    pub(crate) fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(Error::Multiple(self.errors)),
        }
    }
}
