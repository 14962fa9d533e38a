//! Core object-lifecycle and event-dispatch framework for Kenai.
//!
//! The framework owns three concerns: specifications describing each kind of
//! protocol object at compile time ([`spec`]), exclusively owned wrappers
//! that release their handle on drop ([`object`]), and the registry that
//! routes untyped incoming events to typed instances ([`dispatch`]). The
//! transport itself stays outside; requests and events cross the boundary as
//! already-decoded argument lists ([`channel`]).

pub mod channel;
pub mod dispatch;
pub mod event;
pub mod fixed;
pub mod id_manager;
pub mod object;
pub mod spec;
