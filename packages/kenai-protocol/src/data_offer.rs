//! The selection offer: `wl_data_offer` and its mime-type negotiation.

use std::collections::BTreeSet;
use std::ops::Deref;
use std::os::fd::OwnedFd;

use kenai_core::channel::{Arg, Channel, ChannelError, RawId};
use kenai_core::dispatch::EventObject;
use kenai_core::event::{DecodeEventError, Event, PayloadReader};
use kenai_core::object::{ObjectError, WlObject};

/// Request opcodes of `wl_data_offer`.
mod request {
    pub const ACCEPT: u16 = 0;
    pub const RECEIVE: u16 = 1;
    pub const DESTROY: u16 = 2;
    pub const FINISH: u16 = 3;
}

kenai_core::interface_spec! {
    /// Specification of `wl_data_offer`.
    pub DataOfferSpec {
        interface: "wl_data_offer",
        version: 3,
        destructor: request::DESTROY,
        events: DataOfferEvent,
    }
}

/// Events of `wl_data_offer`, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOfferEvent {
    /// The peer proposes one more mime type for the pending transfer.
    Offer {
        /// The proposed data format.
        mime_type: String,
    },
    /// Actions the drag-and-drop source offers (since v3).
    SourceActions {
        /// Bitmask of offered actions.
        actions: u32,
    },
    /// The drag-and-drop action the compositor settled on (since v3).
    Action {
        /// The selected action.
        action: u32,
    },
}

impl Event for DataOfferEvent {
    fn try_decode(opcode: u16, mut payload: PayloadReader) -> Result<Self, DecodeEventError> {
        match opcode {
            0 => Ok(Self::Offer {
                mime_type: payload.string()?,
            }),
            1 => Ok(Self::SourceActions {
                actions: payload.uint()?,
            }),
            2 => Ok(Self::Action {
                action: payload.uint()?,
            }),
            other => Err(DecodeEventError::UnknownOpcode(other)),
        }
    }
}

/// A peer-announced offer of data formats for a pending transfer.
///
/// The mime-type set grows monotonically as `offer` events arrive; nothing
/// ever removes an entry, and the application never mutates the set
/// directly. Ownership is exclusive — the offer cannot be duplicated:
///
/// ```compile_fail
/// use kenai_protocol::data_offer::DataOffer;
///
/// fn duplicate(offer: DataOffer) -> [DataOffer; 2] {
///     [offer.clone(), offer]
/// }
/// ```
#[derive(Debug)]
pub struct DataOffer {
    object: WlObject<DataOfferSpec>,
    mime_types: BTreeSet<String>,
}

impl DataOffer {
    /// Wraps the raw handle the peer announced.
    ///
    /// Register the result with an
    /// [`EventRegistry`](kenai_core::dispatch::EventRegistry) right away;
    /// the mime-type set only fills up while the offer is a registered event
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Initialization`] when the handle is null.
    pub fn from_raw(channel: &Channel, raw: RawId) -> Result<Self, ObjectError> {
        Ok(Self {
            object: WlObject::from_raw(channel, raw)?,
            mime_types: BTreeSet::new(),
        })
    }

    /// Iterates over the mime types accumulated so far.
    ///
    /// Read-only and restartable; set semantics only, no ordering promise
    /// beyond the set's own.
    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.mime_types.iter().map(String::as_str)
    }

    /// Whether `mime_type` has been proposed by the peer.
    #[must_use]
    pub fn offers(&self, mime_type: &str) -> bool {
        self.mime_types.contains(mime_type)
    }

    /// Asks the peer to stream the payload for `mime_type` into `fd`.
    ///
    /// Fire-and-forget: exactly one request is queued and the call never
    /// blocks or reads data itself. The bytes arrive on the other end of the
    /// pipe once the transport delivers them; membership of `mime_type` in
    /// the accumulated set is not checked here, the peer has the final word.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn receive(&self, mime_type: &str, fd: OwnedFd) -> Result<(), ChannelError> {
        self.object.submit(
            request::RECEIVE,
            vec![Arg::Str(mime_type.to_owned()), Arg::Fd(fd)],
        )
    }

    /// Tells the source which mime type the target accepts, if any.
    ///
    /// Part of the drag-and-drop handshake; `None` rejects the drop.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn accept(&self, serial: u32, mime_type: Option<&str>) -> Result<(), ChannelError> {
        let mime = mime_type.map_or(Arg::NullString, |mime| Arg::Str(mime.to_owned()));
        self.object
            .submit(request::ACCEPT, vec![Arg::Uint(serial), mime])
    }

    /// Notifies the peer that a drag-and-drop transfer completed (since v3).
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn finish(&self) -> Result<(), ChannelError> {
        self.object.submit(request::FINISH, Vec::new())
    }
}

impl Deref for DataOffer {
    type Target = WlObject<DataOfferSpec>;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl EventObject for DataOffer {
    type Spec = DataOfferSpec;

    fn object(&self) -> &WlObject<DataOfferSpec> {
        &self.object
    }

    fn handle_event(&mut self, event: DataOfferEvent) {
        match event {
            DataOfferEvent::Offer { mime_type } => {
                tracing::trace!(id = self.object.id(), mime = %mime_type, "mime type proposed");
                // Duplicate proposals are idempotent.
                self.mime_types.insert(mime_type);
            }
            // Drag-and-drop negotiation carries nothing a selection transfer needs.
            DataOfferEvent::SourceActions { .. } | DataOfferEvent::Action { .. } => {}
        }
    }
}
