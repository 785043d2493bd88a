//! Pointer interaction with a process diagram.
//!
//! - [`region`]: hit regions and what they stand for
//! - [`scene`]: which regions a process exposes, and how it is painted
//! - [`dispatch`]: raw pointer events to gestures
//! - [`editor`]: gestures to workspace edits

pub mod dispatch;
pub mod editor;
pub mod region;
pub mod scene;

pub use dispatch::{Dispatch, PointerDispatcher, PointerEvent};
pub use editor::{Editor, Intent};
pub use region::{hit_test, Cursor, EventMask, HitRegion, InteractionTarget};
pub use scene::{collect_regions, draw_process, DrawOptions};
