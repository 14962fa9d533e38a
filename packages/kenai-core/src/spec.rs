//! Compile-time specifications for protocol object kinds.
//!
//! A specification is a never-instantiated type describing one interface:
//! its protocol name, the version this implementation speaks, and how the
//! object is torn down. Capabilities are detected at compile time — a custom
//! destructor is the [`ObjectSpec::DESTRUCTOR`] const overriding its `None`
//! default, and event support is the presence of an [`EventSpec`] impl.
//! A specification lacking either simply selects the default behavior.

use crate::event::Event;

/// Contract every object specification fulfills.
///
/// Usually implemented through [`interface_spec!`](crate::interface_spec)
/// rather than by hand.
pub trait ObjectSpec: Sized + 'static {
    /// Protocol name of the interface.
    const INTERFACE: &'static str;

    /// The interface version this implementation speaks.
    const VERSION: u32;

    /// Opcode of the interface's destructor request, if it defines one.
    ///
    /// `None` selects the default release path: on drop the object's id is
    /// recycled without a wire message.
    const DESTRUCTOR: Option<u16> = None;
}

/// Specifications of interfaces that emit events.
///
/// Objects of such specifications must have a registered event target for
/// their whole lifetime; see [`dispatch`](crate::dispatch).
pub trait EventSpec: ObjectSpec {
    /// The decoded form of every event the interface can emit.
    type Event: Event;
}

/// Declares a specification type for a protocol interface.
///
/// The `destructor` and `events` clauses are optional; leaving them out
/// selects the default release path and the listener-less behavior.
///
/// ```
/// use kenai_core::interface_spec;
///
/// interface_spec! {
///     /// Specification of `wl_region`.
///     pub WlRegionSpec {
///         interface: "wl_region",
///         version: 1,
///         destructor: 0,
///     }
/// }
/// ```
#[macro_export]
macro_rules! interface_spec {
    (
        $(#[$attr:meta])*
        $vis:vis $name:ident {
            interface: $interface:literal,
            version: $version:expr
            $(, destructor: $destructor:expr)?
            $(, events: $event:ty)?
            $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis enum $name {}

        impl $crate::spec::ObjectSpec for $name {
            const INTERFACE: &'static str = $interface;
            const VERSION: u32 = $version;
            $(const DESTRUCTOR: ::core::option::Option<u16> =
                ::core::option::Option::Some($destructor);)?
        }

        $(impl $crate::spec::EventSpec for $name {
            type Event = $event;
        })?
    };
}

#[cfg(test)]
mod tests {
    use super::ObjectSpec;

    interface_spec! {
        /// Bare specification.
        BareSpec {
            interface: "wl_bare",
            version: 2,
        }
    }

    interface_spec! {
        /// Specification with a destructor request.
        DestructibleSpec {
            interface: "wl_destructible",
            version: 1,
            destructor: 3,
        }
    }

    #[test]
    fn the_defaults_select_the_default_release_path() {
        assert_eq!("wl_bare", BareSpec::INTERFACE);
        assert_eq!(2, BareSpec::VERSION);
        assert_eq!(None, BareSpec::DESTRUCTOR);
    }

    #[test]
    fn a_destructor_clause_overrides_the_default() {
        assert_eq!(Some(3), DestructibleSpec::DESTRUCTOR);
    }
}
