// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Debug, PartialEq)]
        pub(crate) enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (ComponentNotFound, component_not_found),
    (InvalidConnection, invalid_connection),
    (InvalidGraph, invalid_graph)
);

/// An error that can occur during the creation or traversal of a
/// [ComponentGraph][crate::ComponentGraph].
///
/// Simulating a graph never fails, problems with the simulated network are
/// reported as [`Diagnostic`][crate::Diagnostic]s instead.
#[derive(Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}

/// Failures of building and querying a graph, named by the components and
/// wires involved.
impl Error {
    pub(crate) fn unknown_component(component_id: u64) -> Self {
        Self::component_not_found(format!("Component with id {component_id} not found."))
    }

    pub(crate) fn duplicate_component(component_id: u64) -> Self {
        Self::invalid_graph(format!(
            "Component id {component_id} is used by more than one component."
        ))
    }

    pub(crate) fn self_connection(component_id: u64) -> Self {
        Self::invalid_connection(format!(
            "Wire ({component_id}, {component_id}) connects a component to itself."
        ))
    }

    pub(crate) fn dangling_connection(source: u64, destination: u64, missing: u64) -> Self {
        Self::invalid_connection(format!(
            "Wire ({source}, {destination}) ends at component {missing}, which doesn't exist."
        ))
    }
}
