//! Concrete object instantiations built on the Kenai core framework.
//!
//! Each module binds one protocol interface: a specification declared with
//! [`kenai_core::interface_spec!`], the decoded event enum where the
//! interface emits events, and a typed wrapper carrying the interface's
//! requests and accumulated state.

pub mod data_device;
pub mod data_offer;
pub mod xdg_toplevel;
