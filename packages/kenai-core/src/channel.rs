//! The boundary to the lower-level transport.
//!
//! Kenai does not serialize protocol messages itself. Outgoing requests are
//! queued as already-structured [`RequestMessage`]s for a transport layer to
//! encode and send; incoming events arrive as decoded [`EventMessage`]s that
//! the application pumps into an
//! [`EventRegistry`](crate::dispatch::EventRegistry).

use std::os::fd::OwnedFd;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::fixed::Fixed;
use crate::id_manager::{IdManager, IdManagerError};

/// A unique object id.
pub type ObjectId = u32;

/// An object id exactly as handed over by the peer.
///
/// `0` is the null handle and means the peer-side allocation failed; a live
/// object never carries it.
pub type RawId = u32;

/// The receiving half of the request queue, drained by the transport layer.
pub type RequestReceiver = mpsc::UnboundedReceiver<RequestMessage>;

/// One argument of a request or event payload, in decoded form.
#[derive(Debug)]
pub enum Arg {
    /// An unsigned 32-bit integer.
    Uint(u32),
    /// A signed 32-bit integer.
    Int(i32),
    /// A 24.8 fixed-point number.
    Fixed(Fixed),
    /// A string.
    Str(String),
    /// The protocol's null string.
    NullString,
    /// A reference to an existing object; `0` references no object.
    Object(RawId),
    /// The id of an object created by this message.
    NewId(RawId),
    /// A file descriptor, transferred out-of-band by the transport.
    Fd(OwnedFd),
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::NullString, Self::NullString) => true,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::NewId(a), Self::NewId(b)) => a == b,
            // `OwnedFd` has no `PartialEq`; two distinct owned fds can never
            // share a descriptor, so raw-fd equality is exact.
            (Self::Fd(a), Self::Fd(b)) => {
                std::os::fd::AsRawFd::as_raw_fd(a) == std::os::fd::AsRawFd::as_raw_fd(b)
            }
            _ => false,
        }
    }
}

impl Arg {
    /// Name of the argument kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Fixed(_) => "fixed",
            Self::Str(_) | Self::NullString => "string",
            Self::Object(_) => "object",
            Self::NewId(_) => "new_id",
            Self::Fd(_) => "fd",
        }
    }
}

/// An outgoing request, ready for the transport layer to put on the wire.
#[derive(Debug, PartialEq)]
pub struct RequestMessage {
    /// Id of the object sending the request.
    pub sender: ObjectId,
    /// Request opcode within the sender's interface.
    pub opcode: u16,
    /// Request arguments, in protocol order.
    pub args: Vec<Arg>,
}

/// An incoming event, as decoded by the transport layer.
#[derive(Debug)]
pub struct EventMessage {
    /// Id of the object the event targets.
    pub object: ObjectId,
    /// Event opcode within the target's interface.
    pub opcode: u16,
    /// Event arguments, in protocol order.
    pub args: Vec<Arg>,
}

/// Client half of the connection to the display server.
///
/// Cheap to clone; every clone shares the request queue and the id
/// allocator. Submission never blocks: requests are queued for the transport
/// to drain.
#[derive(Debug, Clone)]
pub struct Channel {
    requests: mpsc::UnboundedSender<RequestMessage>,
    ids: IdManager,
}

impl Channel {
    /// Creates a channel together with the receiver the transport drains.
    #[must_use]
    pub fn new() -> (Self, RequestReceiver) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (
            Self {
                requests,
                ids: IdManager::new(),
            },
            receiver,
        )
    }

    /// Queues a request for the transport layer.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn submit(&self, request: RequestMessage) -> Result<(), ChannelError> {
        self.requests
            .send(request)
            .map_err(|_| ChannelError::Closed)
    }

    /// Allocates a fresh client-range object id.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::IdsExhausted`] when the client id range is
    /// fully live.
    pub fn allocate_id(&self) -> Result<ObjectId, ChannelError> {
        Ok(self.ids.alloc_id()?)
    }

    /// Returns the id of a destroyed object to the allocator.
    pub fn recycle_id(&self, id: ObjectId) {
        self.ids.recycle_id(id);
    }
}

/// Errors raised by underlying channel calls.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The transport side of the connection is gone.
    #[error("the transport side of the connection is gone")]
    Closed,
    /// The client id range is fully live.
    #[error(transparent)]
    IdsExhausted(#[from] IdManagerError),
}
