//! Identity types for the process graph.
//!
//! Every entity is referenced by a `u32` newtype instead of a pointer, so
//! back-references (variable links, incoming paths) can be kept consistent by
//! plain update functions. `TypeId` is a direct index into the type registry;
//! the other IDs are allocated from counters and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// The ID after this one.
            #[inline]
            pub fn next(self) -> Self {
                $name(self.0 + 1)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

define_id!(
    /// Index into `TypeRegistry::types`.
    TypeId
);
define_id!(
    /// Workspace-wide process identifier.
    ProcessId
);
define_id!(
    /// Step identifier, unique within its user process.
    StepId
);
define_id!(
    /// Variable identifier, unique within its user process.
    VariableId
);
define_id!(
    /// Parameter identifier, unique within its user process.
    ParamId
);
define_id!(
    /// Return path identifier, unique within its user process.
    PathId
);

/// Which side of a step a parameter sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Input,
    Output,
}

/// A parameter owned by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub step: StepId,
    pub param: ParamId,
}

/// An outgoing return path owned by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathRef {
    pub step: StepId,
    pub path: PathId,
}

/// A variable inside a particular user process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub process: ProcessId,
    pub variable: VariableId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_id() {
        let id = StepId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.next(), StepId(43));
        assert_eq!(format!("{}", id), "StepId(42)");
    }

    #[test]
    fn test_ids_are_ordered() {
        assert!(PathId(1) < PathId(2));
        assert!(TypeId(0) < TypeId(7));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&StepId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
