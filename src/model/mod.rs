//! Process graph data model.
//!
//! ```text
//! Workspace
//! ├── TypeRegistry ── DataType (single-parent chain)
//! └── Process (System | User)
//!     └── UserProcess
//!         ├── Variable ◄──links── Parameter
//!         └── Step (Start | Stop | ProcessCall)
//!             ├── Parameter (copies of the signature)
//!             └── ReturnPath ──to──► Step.incoming
//! ```

pub mod data_type;
pub mod field;
pub mod id;
pub mod process;
pub mod return_path;
pub mod step;

pub use data_type::{DataType, TypeRegistry};
pub use field::{DataField, Parameter, Variable};
pub use id::{ParamId, ParamRef, PathId, PathRef, ProcessId, Side, StepId, TypeId, VariableId, VariableRef};
pub use process::{Process, ProcessKind, Signature};
pub use return_path::{ReturnPath, RouteKey, DEFAULT_PATH_LABEL};
pub use step::{Step, StepKind};
