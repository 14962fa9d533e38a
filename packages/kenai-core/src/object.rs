//! Exclusively owned wrappers around live protocol objects.

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::channel::{Arg, Channel, ChannelError, ObjectId, RawId, RequestMessage};
use crate::spec::ObjectSpec;

/// A live protocol object, owned exclusively.
///
/// At most one wrapper exists per object id. The wrapper releases the handle
/// exactly once when dropped: interfaces whose specification names a
/// destructor request get that request on the wire first, then the id
/// returns to the allocator. Listener-less objects move freely between
/// owners; event-emitting objects are handed to an
/// [`EventRegistry`](crate::dispatch::EventRegistry) at construction and
/// stay put inside it.
pub struct WlObject<S: ObjectSpec> {
    id: ObjectId,
    version: u32,
    channel: Channel,
    _spec: PhantomData<fn() -> S>,
}

impl<S: ObjectSpec> WlObject<S> {
    /// Wraps a raw handle the peer handed over.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Initialization`] when the raw id is null,
    /// meaning the peer-side allocation failed.
    pub fn from_raw(channel: &Channel, raw: RawId) -> Result<Self, ObjectError> {
        if raw == 0 {
            return Err(ObjectError::Initialization {
                interface: S::INTERFACE,
            });
        }

        tracing::trace!(interface = S::INTERFACE, id = raw, "wrapped object");
        Ok(Self {
            id: raw,
            version: S::VERSION,
            channel: channel.clone(),
            _spec: PhantomData,
        })
    }

    /// Creates a fresh object by allocating a client-range id.
    ///
    /// Used by requests that create objects; the id travels in the request's
    /// `new_id` argument.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Channel`] when the id range is exhausted.
    pub fn create(channel: &Channel) -> Result<Self, ObjectError> {
        let id = channel.allocate_id()?;
        Self::from_raw(channel, id)
    }

    /// The object's id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// The interface version the object was created with.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Protocol name of the object's interface.
    #[must_use]
    pub const fn interface(&self) -> &'static str {
        S::INTERFACE
    }

    /// The channel the object lives on.
    #[must_use]
    pub const fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Sends a request on this object.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the transport side is gone.
    pub fn submit(&self, opcode: u16, args: Vec<Arg>) -> Result<(), ChannelError> {
        self.channel.submit(RequestMessage {
            sender: self.id,
            opcode,
            args,
        })
    }
}

impl<S: ObjectSpec> Drop for WlObject<S> {
    fn drop(&mut self) {
        if let Some(opcode) = S::DESTRUCTOR
            && self.submit(opcode, Vec::new()).is_err()
        {
            tracing::debug!(
                interface = S::INTERFACE,
                id = self.id,
                "transport gone before the destructor request"
            );
        }

        self.channel.recycle_id(self.id);
        tracing::trace!(interface = S::INTERFACE, id = self.id, "released object");
    }
}

impl<S: ObjectSpec> fmt::Debug for WlObject<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WlObject")
            .field("interface", &S::INTERFACE)
            .field("id", &self.id)
            .field("version", &self.version)
            .finish()
    }
}

/// Null-safe handle accessor: an absent wrapper yields the null id.
#[must_use]
pub fn raw_id<S: ObjectSpec>(object: Option<&WlObject<S>>) -> RawId {
    object.map_or(0, WlObject::id)
}

/// Errors raised while constructing or registering an object.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The peer returned a null handle; its allocation failed.
    #[error("failed to initialize {interface}: the peer returned a null handle")]
    Initialization {
        /// Interface the handle was supposed to refer to.
        interface: &'static str,
    },
    /// The event-target slot for the object's id was already bound.
    #[error("failed to register event target for {interface}#{id}: the id is already bound")]
    ListenerRegistration {
        /// Interface of the object that could not be registered.
        interface: &'static str,
        /// The contested object id.
        id: ObjectId,
    },
    /// An underlying channel call failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::{ObjectError, WlObject, raw_id};
    use crate::channel::Channel;

    crate::interface_spec! {
        /// Releases through the default path.
        PlainSpec {
            interface: "wl_plain",
            version: 1,
        }
    }

    crate::interface_spec! {
        /// Releases by sending its destructor request.
        DestructibleSpec {
            interface: "wl_destructible",
            version: 4,
            destructor: 2,
        }
    }

    #[test]
    fn a_valid_handle_is_wrapped_as_is() {
        let (channel, _requests) = Channel::new();
        let object = WlObject::<PlainSpec>::from_raw(&channel, 17).unwrap();

        assert_eq!(17, object.id());
        assert_eq!(1, object.version());
        assert_eq!("wl_plain", object.interface());
    }

    #[test]
    fn a_null_handle_fails_construction_with_no_side_effects() {
        let (channel, mut requests) = Channel::new();
        let result = WlObject::<DestructibleSpec>::from_raw(&channel, 0);

        assert!(matches!(
            result,
            Err(ObjectError::Initialization {
                interface: "wl_destructible"
            })
        ));
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());
    }

    #[test]
    fn dropping_submits_the_destructor_request_exactly_once() {
        let (channel, mut requests) = Channel::new();
        let object = WlObject::<DestructibleSpec>::from_raw(&channel, 5).unwrap();
        drop(object);

        let request = requests.try_recv().unwrap();
        assert_eq!(5, request.sender);
        assert_eq!(2, request.opcode);
        assert!(request.args.is_empty());
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());
    }

    #[test]
    fn the_default_release_path_only_recycles_the_id() {
        let (channel, mut requests) = Channel::new();
        let id = channel.allocate_id().unwrap();
        let object = WlObject::<PlainSpec>::from_raw(&channel, id).unwrap();
        drop(object);

        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());
        // The id went back into the pool.
        assert_eq!(id, channel.allocate_id().unwrap());
    }

    #[test]
    fn moving_a_listener_less_object_transfers_the_handle() {
        let (channel, mut requests) = Channel::new();
        let object = WlObject::<DestructibleSpec>::from_raw(&channel, 9).unwrap();

        let moved = object;
        assert_eq!(9, moved.id());
        // The move did not release anything.
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());

        drop(moved);
        assert_eq!(9, requests.try_recv().unwrap().sender);
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());
    }

    #[test]
    fn create_allocates_client_range_ids() {
        let (channel, _requests) = Channel::new();
        let first = WlObject::<PlainSpec>::create(&channel).unwrap();
        let second = WlObject::<PlainSpec>::create(&channel).unwrap();
        assert_eq!(1, first.id());
        assert_eq!(2, second.id());
    }

    #[test]
    fn the_null_safe_accessor_maps_absence_to_the_null_id() {
        let (channel, _requests) = Channel::new();
        let object = WlObject::<PlainSpec>::from_raw(&channel, 3).unwrap();

        assert_eq!(3, raw_id(Some(&object)));
        assert_eq!(0, raw_id::<PlainSpec>(None));
    }
}
