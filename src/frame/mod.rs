//! Frame mirror: tree, worlds, lifecycle tracking and navigation.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `tree` | [`FrameTree`] parent/child bookkeeping |
//! | `state` | [`FrameState`] per-frame record |
//! | `world` | [`IsolatedWorld`], [`ExecutionContext`], [`JsHandle`] |
//! | `lifecycle` | [`LifecycleWatcher`] and wait conditions |
//! | `manager` | [`FrameManager`] event dispatch, [`NavigationWatcher`] |
//! | `core` | [`Frame`] handle and accessors |
//! | `navigation` | [`Frame::goto`], [`Frame::wait_for_navigation`] |
//! | `script` | Evaluation, content and tag injection |

// ============================================================================
// Modules
// ============================================================================

mod core;
mod lifecycle;
mod manager;
mod navigation;
mod script;
mod state;
mod tree;
mod world;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Frame;
pub use lifecycle::{
    FrameSignal, LifecycleWatcher, Termination, WaitMode, WaitUntil, WatchStatus,
};
pub use manager::{FrameManager, NavigationWatcher};
pub use navigation::{GotoOptions, WaitForNavigationOptions};
pub use script::{ScriptTagOptions, StyleTagOptions};
pub use state::FrameState;
pub use tree::FrameTree;
pub use world::{EvalArg, ExecutionContext, IsolatedWorld, JsHandle, RemoteObject, WorldKind};
