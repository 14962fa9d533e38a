//! Event delivery: the registry and the type-erased trampoline.
//!
//! Incoming events carry nothing but an object id, an opcode, and a payload.
//! The [`EventRegistry`] keys every event-observing instance by its object
//! id and plays the role an opaque user-data pointer plays in C listener
//! tables: registered instances stay inside the registry, at a stable
//! location, for as long as the peer may still deliver events to them.
//! Dispatch is synchronous and preserves delivery order; the registry never
//! reorders or batches.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::channel::{EventMessage, ObjectId};
use crate::event::{DecodeEventError, Event, PayloadReader};
use crate::object::{ObjectError, WlObject};
use crate::spec::{EventSpec, ObjectSpec};

/// A typed protocol object that observes its interface's events.
///
/// Implementors own the [`WlObject`] of the associated specification; the
/// registry keys the instance by that object's id and forwards each decoded
/// event to [`EventObject::handle_event`].
pub trait EventObject: Any {
    /// Specification of the wrapped object.
    type Spec: EventSpec;

    /// The wrapped object.
    fn object(&self) -> &WlObject<Self::Spec>;

    /// Handles one decoded event.
    ///
    /// Called synchronously by [`EventRegistry::dispatch`], in the order the
    /// peer delivered the events.
    fn handle_event(&mut self, event: <Self::Spec as EventSpec>::Event);
}

/// Object-safe face of a registered event target.
///
/// The blanket impl below is the trampoline: it turns an untyped delivery
/// into a typed call on the owning instance, deducing the event type from
/// the implementor's specification.
trait RawSink: Any {
    fn interface(&self) -> &'static str;
    fn deliver(&mut self, opcode: u16, payload: PayloadReader) -> Result<(), DecodeEventError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: EventObject> RawSink for T {
    fn interface(&self) -> &'static str {
        <T::Spec as ObjectSpec>::INTERFACE
    }

    fn deliver(&mut self, opcode: u16, payload: PayloadReader) -> Result<(), DecodeEventError> {
        let event = <T::Spec as EventSpec>::Event::try_decode(opcode, payload)?;
        self.handle_event(event);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Routes incoming events to their registered typed instances.
///
/// Registered instances are reachable only by reference, so relocating or
/// duplicating one is rejected at compile time:
///
/// ```compile_fail
/// use kenai_core::dispatch::{DiscardEvents, EventRegistry};
/// use kenai_core::spec::EventSpec;
///
/// fn steal<S: EventSpec>(registry: &EventRegistry, id: u32) -> DiscardEvents<S> {
///     *registry.get::<DiscardEvents<S>>(id).unwrap()
/// }
/// ```
#[derive(Default)]
pub struct EventRegistry {
    sinks: BTreeMap<ObjectId, Box<dyn RawSink>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts `object` as the event target for its own id.
    ///
    /// Registration is atomic with adoption: when the id is already bound,
    /// the object is dropped — releasing its handle through the normal
    /// destruction path — before the error surfaces, so nothing leaks on the
    /// failure path.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ListenerRegistration`] when an event target is
    /// already registered under the object's id.
    pub fn register<T: EventObject>(&mut self, object: T) -> Result<ObjectId, ObjectError> {
        let id = object.object().id();
        let interface = <T::Spec as ObjectSpec>::INTERFACE;

        if self.sinks.contains_key(&id) {
            return Err(ObjectError::ListenerRegistration { interface, id });
        }

        tracing::debug!(interface, id, "registered event target");
        self.sinks.insert(id, Box::new(object));
        Ok(id)
    }

    /// Shared access to the instance registered under `id`.
    ///
    /// `None` when the id is unbound or bound to a different type.
    #[must_use]
    pub fn get<T: EventObject>(&self, id: ObjectId) -> Option<&T> {
        self.sinks.get(&id)?.as_any().downcast_ref()
    }

    /// Exclusive access to the instance registered under `id`.
    ///
    /// `None` when the id is unbound or bound to a different type.
    #[must_use]
    pub fn get_mut<T: EventObject>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.sinks.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    /// Drops the instance registered under `id`, releasing its handle.
    ///
    /// Returns whether anything was registered there.
    pub fn release(&mut self, id: ObjectId) -> bool {
        let released = self.sinks.remove(&id).is_some();
        if released {
            tracing::debug!(id, "released event target");
        }
        released
    }

    /// Forwards one event to its registered target.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownObject`] when no target is registered
    /// under the event's id, and [`DispatchError::BadEvent`] when the
    /// payload does not decode against the target interface's events. The
    /// pump decides whether a failure is fatal.
    pub fn dispatch(&mut self, message: EventMessage) -> Result<(), DispatchError> {
        let Some(sink) = self.sinks.get_mut(&message.object) else {
            tracing::warn!(object = message.object, "event for an unknown object");
            return Err(DispatchError::UnknownObject(message.object));
        };

        sink.deliver(message.opcode, PayloadReader::new(message.args))
            .map_err(|source| DispatchError::BadEvent {
                interface: sink.interface(),
                object: message.object,
                source,
            })
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("registered", &self.sinks.len())
            .finish()
    }
}

/// Event target that decodes and discards every event.
///
/// Stands in for objects whose events the application has no interest in;
/// every delivery must still find a live target.
pub struct DiscardEvents<S: EventSpec>(pub WlObject<S>);

impl<S: EventSpec> EventObject for DiscardEvents<S> {
    type Spec = S;

    fn object(&self) -> &WlObject<S> {
        &self.0
    }

    fn handle_event(&mut self, _event: S::Event) {
        tracing::trace!(
            interface = S::INTERFACE,
            id = self.0.id(),
            "discarded event"
        );
    }
}

impl<S: EventSpec> fmt::Debug for DiscardEvents<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiscardEvents").field(&self.0).finish()
    }
}

/// Errors raised while routing an incoming event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No event target is registered under the event's object id.
    #[error("no event target registered for object {0}")]
    UnknownObject(ObjectId),
    /// The payload did not decode against the target interface's events.
    #[error("bad {interface} event for object {object}: {source}")]
    BadEvent {
        /// Interface of the registered target.
        interface: &'static str,
        /// Id of the targeted object.
        object: ObjectId,
        /// The decode failure.
        #[source]
        source: DecodeEventError,
    },
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::{DiscardEvents, DispatchError, EventObject, EventRegistry};
    use crate::channel::{Arg, Channel, EventMessage};
    use crate::event::{DecodeEventError, Event, PayloadReader};
    use crate::object::{ObjectError, WlObject};

    #[derive(Debug, PartialEq, Eq)]
    enum PingEvent {
        Ping { serial: u32 },
        Done,
    }

    impl Event for PingEvent {
        fn try_decode(opcode: u16, mut payload: PayloadReader) -> Result<Self, DecodeEventError> {
            match opcode {
                0 => Ok(Self::Ping {
                    serial: payload.uint()?,
                }),
                1 => Ok(Self::Done),
                other => Err(DecodeEventError::UnknownOpcode(other)),
            }
        }
    }

    crate::interface_spec! {
        /// Test interface that emits ping events.
        PingSpec {
            interface: "wl_ping",
            version: 1,
            destructor: 0,
            events: PingEvent,
        }
    }

    struct PingRecorder {
        object: WlObject<PingSpec>,
        serials: Vec<u32>,
    }

    impl EventObject for PingRecorder {
        type Spec = PingSpec;

        fn object(&self) -> &WlObject<PingSpec> {
            &self.object
        }

        fn handle_event(&mut self, event: PingEvent) {
            if let PingEvent::Ping { serial } = event {
                self.serials.push(serial);
            }
        }
    }

    fn ping(object: u32, serial: u32) -> EventMessage {
        EventMessage {
            object,
            opcode: 0,
            args: vec![Arg::Uint(serial)],
        }
    }

    #[test]
    fn events_are_forwarded_typed_and_in_order() {
        let (channel, _requests) = Channel::new();
        let recorder = PingRecorder {
            object: WlObject::from_raw(&channel, 7).unwrap(),
            serials: Vec::new(),
        };

        let mut registry = EventRegistry::new();
        let id = registry.register(recorder).unwrap();

        for serial in [3, 1, 2] {
            registry.dispatch(ping(id, serial)).unwrap();
        }

        let recorder = registry.get::<PingRecorder>(id).unwrap();
        assert_eq!(vec![3, 1, 2], recorder.serials);
    }

    #[test]
    fn double_registration_fails_and_releases_the_newcomer() {
        let (channel, mut requests) = Channel::new();
        let mut registry = EventRegistry::new();

        let first = PingRecorder {
            object: WlObject::from_raw(&channel, 7).unwrap(),
            serials: Vec::new(),
        };
        registry.register(first).unwrap();

        let second = PingRecorder {
            object: WlObject::from_raw(&channel, 7).unwrap(),
            serials: Vec::new(),
        };
        let result = registry.register(second);
        assert!(matches!(
            result,
            Err(ObjectError::ListenerRegistration {
                interface: "wl_ping",
                id: 7
            })
        ));

        // The rejected object went through the normal destruction path.
        let request = requests.try_recv().unwrap();
        assert_eq!(7, request.sender);
        assert_eq!(0, request.opcode);
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());
    }

    #[test]
    fn dispatch_to_an_unknown_object_is_diagnosed() {
        let mut registry = EventRegistry::new();
        let result = registry.dispatch(ping(42, 0));
        assert!(matches!(result, Err(DispatchError::UnknownObject(42))));
    }

    #[test]
    fn a_malformed_payload_is_rejected_with_a_diagnosable_error() {
        let (channel, _requests) = Channel::new();
        let mut registry = EventRegistry::new();
        let id = registry
            .register(PingRecorder {
                object: WlObject::from_raw(&channel, 4).unwrap(),
                serials: Vec::new(),
            })
            .unwrap();

        let result = registry.dispatch(EventMessage {
            object: id,
            opcode: 0,
            args: vec![Arg::Str("not a serial".to_owned())],
        });
        assert!(matches!(
            result,
            Err(DispatchError::BadEvent {
                interface: "wl_ping",
                object: 4,
                source: DecodeEventError::TypeMismatch { .. },
            })
        ));

        let result = registry.dispatch(EventMessage {
            object: id,
            opcode: 9,
            args: Vec::new(),
        });
        assert!(matches!(
            result,
            Err(DispatchError::BadEvent {
                source: DecodeEventError::UnknownOpcode(9),
                ..
            })
        ));
    }

    #[test]
    fn releasing_drops_the_target_and_its_handle() {
        let (channel, mut requests) = Channel::new();
        let mut registry = EventRegistry::new();
        let id = registry
            .register(PingRecorder {
                object: WlObject::from_raw(&channel, 11).unwrap(),
                serials: Vec::new(),
            })
            .unwrap();

        assert!(registry.release(id));
        assert!(!registry.release(id));

        // The destructor request went out exactly once.
        assert_eq!(11, requests.try_recv().unwrap().sender);
        assert_eq!(Err(TryRecvError::Empty), requests.try_recv());

        assert!(matches!(
            registry.dispatch(ping(id, 0)),
            Err(DispatchError::UnknownObject(11))
        ));
    }

    #[test]
    fn a_discarding_target_accepts_any_event() {
        let (channel, _requests) = Channel::new();
        let mut registry = EventRegistry::new();
        let id = registry
            .register(DiscardEvents::<PingSpec>(
                WlObject::from_raw(&channel, 2).unwrap(),
            ))
            .unwrap();

        registry.dispatch(ping(id, 1)).unwrap();
        registry
            .dispatch(EventMessage {
                object: id,
                opcode: 1,
                args: Vec::new(),
            })
            .unwrap();
    }
}
