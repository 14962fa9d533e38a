//! `wl_data_device`: the per-seat entry point for selection and drag offers.

use std::ops::Deref;

use kenai_core::channel::{Arg, Channel, ChannelError, RawId};
use kenai_core::event::{DecodeEventError, Event, PayloadReader};
use kenai_core::fixed::Fixed;
use kenai_core::object::{ObjectError, WlObject};

/// Request opcodes of `wl_data_device`.
mod request {
    pub const SET_SELECTION: u16 = 1;
    pub const RELEASE: u16 = 2;
}

kenai_core::interface_spec! {
    /// Specification of `wl_data_device`.
    pub DataDeviceSpec {
        interface: "wl_data_device",
        version: 3,
        destructor: request::RELEASE,
        events: DataDeviceEvent,
    }
}

/// Events of `wl_data_device`, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataDeviceEvent {
    /// The peer introduces a fresh offer object.
    ///
    /// Wrap the handle (and register it) before pumping further events; the
    /// offer's mime types follow immediately on the new object.
    DataOffer {
        /// Handle of the introduced offer.
        id: RawId,
    },
    /// A drag entered a surface of this client.
    Enter {
        /// Serial of the enter.
        serial: u32,
        /// The entered surface.
        surface: RawId,
        /// Surface-local x coordinate.
        x: Fixed,
        /// Surface-local y coordinate.
        y: Fixed,
        /// The offer backing the drag, or `0` for none.
        id: RawId,
    },
    /// The drag left the surface.
    Leave,
    /// The drag moved within the surface.
    Motion {
        /// Timestamp with millisecond granularity.
        time: u32,
        /// Surface-local x coordinate.
        x: Fixed,
        /// Surface-local y coordinate.
        y: Fixed,
    },
    /// The user dropped the dragged data.
    Drop,
    /// The offer now backing the selection, or `0` when it was cleared.
    ///
    /// A newly advertised offer supersedes any previous one; tracking which
    /// offer is current is the application's concern.
    Selection {
        /// Handle of the current selection offer, or `0`.
        id: RawId,
    },
}

impl Event for DataDeviceEvent {
    fn try_decode(opcode: u16, mut payload: PayloadReader) -> Result<Self, DecodeEventError> {
        match opcode {
            0 => Ok(Self::DataOffer {
                id: payload.new_id()?,
            }),
            1 => Ok(Self::Enter {
                serial: payload.uint()?,
                surface: payload.object()?,
                x: payload.fixed()?,
                y: payload.fixed()?,
                id: payload.object()?,
            }),
            2 => Ok(Self::Leave),
            3 => Ok(Self::Motion {
                time: payload.uint()?,
                x: payload.fixed()?,
                y: payload.fixed()?,
            }),
            4 => Ok(Self::Drop),
            5 => Ok(Self::Selection {
                id: payload.object()?,
            }),
            other => Err(DecodeEventError::UnknownOpcode(other)),
        }
    }
}

/// Request-side wrapper for `wl_data_device`.
///
/// What to do with the device's events — wrapping announced offers, letting
/// a new selection supersede the old one — is application policy: embed this
/// in a type implementing [`EventObject`](kenai_core::dispatch::EventObject)
/// and register that.
#[derive(Debug)]
pub struct DataDevice {
    object: WlObject<DataDeviceSpec>,
}

impl DataDevice {
    /// Wraps the raw handle obtained from the data device manager.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Initialization`] when the handle is null.
    pub fn from_raw(channel: &Channel, raw: RawId) -> Result<Self, ObjectError> {
        Ok(Self {
            object: WlObject::from_raw(channel, raw)?,
        })
    }

    /// The wrapped protocol object.
    #[must_use]
    pub const fn object(&self) -> &WlObject<DataDeviceSpec> {
        &self.object
    }

    /// Sets (or, with `source` `0`, clears) the selection for this seat.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn set_selection(&self, source: RawId, serial: u32) -> Result<(), ChannelError> {
        self.object.submit(
            request::SET_SELECTION,
            vec![Arg::Object(source), Arg::Uint(serial)],
        )
    }
}

impl Deref for DataDevice {
    type Target = WlObject<DataDeviceSpec>;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}
