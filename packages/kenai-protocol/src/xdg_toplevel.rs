//! `xdg_toplevel`: the illustrative listener-less instantiation.
//!
//! Toplevels here only carry the requests the negotiation tooling needs; a
//! windowing layer would add the configure/close event plumbing on top.

use std::ops::Deref;

use kenai_core::channel::{Arg, Channel, ObjectId, RequestMessage};
use kenai_core::object::{ObjectError, WlObject};

/// Request opcodes of `xdg_toplevel`.
mod request {
    pub const DESTROY: u16 = 0;
    pub const SET_TITLE: u16 = 2;
}

/// The `get_toplevel` request opcode on `xdg_surface`.
const XDG_SURFACE_GET_TOPLEVEL: u16 = 1;

kenai_core::interface_spec! {
    /// Specification of `xdg_toplevel`.
    pub XdgToplevelSpec {
        interface: "xdg_toplevel",
        version: 1,
        destructor: request::DESTROY,
    }
}

/// A toplevel window surface.
///
/// Listener-less, so it moves freely between owners.
#[derive(Debug)]
pub struct XdgToplevel {
    object: WlObject<XdgToplevelSpec>,
}

impl XdgToplevel {
    /// Creates a toplevel for an `xdg_surface`.
    ///
    /// Allocates the new object's id and submits `get_toplevel` on the
    /// surface with that id.
    ///
    /// # Errors
    ///
    /// Fails when the id range is exhausted or the transport side is gone.
    pub fn new(channel: &Channel, xdg_surface: ObjectId) -> Result<Self, ObjectError> {
        let object = WlObject::create(channel)?;
        channel.submit(RequestMessage {
            sender: xdg_surface,
            opcode: XDG_SURFACE_GET_TOPLEVEL,
            args: vec![Arg::NewId(object.id())],
        })?;
        Ok(Self { object })
    }

    /// Wraps an already-created raw handle.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Initialization`] when the handle is null.
    pub fn from_raw(channel: &Channel, raw: u32) -> Result<Self, ObjectError> {
        Ok(Self {
            object: WlObject::from_raw(channel, raw)?,
        })
    }

    /// Sets the window title.
    ///
    /// # Errors
    ///
    /// Fails when the transport side is gone.
    pub fn set_title(&self, title: &str) -> Result<(), ObjectError> {
        self.object
            .submit(request::SET_TITLE, vec![Arg::Str(title.to_owned())])?;
        Ok(())
    }
}

impl Deref for XdgToplevel {
    type Target = WlObject<XdgToplevelSpec>;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}
