//! Typed decoding of event payloads.

use std::os::fd::OwnedFd;

use thiserror::Error;

use crate::channel::{Arg, RawId};
use crate::fixed::Fixed;

/// The decoded form of every event an interface can emit.
///
/// Implemented by one enum per event-emitting interface; the trampoline in
/// [`dispatch`](crate::dispatch) calls [`Event::try_decode`] before
/// forwarding to the typed handler.
pub trait Event: Sized {
    /// Decodes a typed event from an opcode and its payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeEventError::UnknownOpcode`] for opcodes the interface
    /// does not define, and the reader's errors for malformed payloads.
    fn try_decode(opcode: u16, payload: PayloadReader) -> Result<Self, DecodeEventError>;
}

/// Cursor over an event payload, consuming arguments positionally.
#[derive(Debug)]
pub struct PayloadReader {
    args: std::vec::IntoIter<Arg>,
}

impl PayloadReader {
    /// Wraps a decoded argument list.
    #[must_use]
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            args: args.into_iter(),
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<Arg, DecodeEventError> {
        self.args
            .next()
            .ok_or(DecodeEventError::MissingArg(expected))
    }

    /// Reads an unsigned 32-bit integer argument.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn uint(&mut self) -> Result<u32, DecodeEventError> {
        match self.next("uint")? {
            Arg::Uint(value) => Ok(value),
            other => Err(DecodeEventError::mismatch("uint", &other)),
        }
    }

    /// Reads a signed 32-bit integer argument.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn int(&mut self) -> Result<i32, DecodeEventError> {
        match self.next("int")? {
            Arg::Int(value) => Ok(value),
            other => Err(DecodeEventError::mismatch("int", &other)),
        }
    }

    /// Reads a 24.8 fixed-point argument.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn fixed(&mut self) -> Result<Fixed, DecodeEventError> {
        match self.next("fixed")? {
            Arg::Fixed(value) => Ok(value),
            other => Err(DecodeEventError::mismatch("fixed", &other)),
        }
    }

    /// Reads a non-null string argument.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn string(&mut self) -> Result<String, DecodeEventError> {
        match self.next("string")? {
            Arg::Str(value) => Ok(value),
            other => Err(DecodeEventError::mismatch("string", &other)),
        }
    }

    /// Reads an object-reference argument; `0` references no object.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn object(&mut self) -> Result<RawId, DecodeEventError> {
        match self.next("object")? {
            Arg::Object(id) => Ok(id),
            other => Err(DecodeEventError::mismatch("object", &other)),
        }
    }

    /// Reads a new-object-id argument.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn new_id(&mut self) -> Result<RawId, DecodeEventError> {
        match self.next("new_id")? {
            Arg::NewId(id) => Ok(id),
            other => Err(DecodeEventError::mismatch("new_id", &other)),
        }
    }

    /// Reads a file-descriptor argument, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Fails when the payload is exhausted or the next argument has a
    /// different kind.
    pub fn fd(&mut self) -> Result<OwnedFd, DecodeEventError> {
        match self.next("fd")? {
            Arg::Fd(fd) => Ok(fd),
            other => Err(DecodeEventError::mismatch("fd", &other)),
        }
    }
}

/// Errors that can occur while decoding an event payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeEventError {
    /// The opcode is not defined by the target interface.
    #[error("unknown event opcode {0}")]
    UnknownOpcode(u16),
    /// The payload ended before the expected argument.
    #[error("event payload ended while a {0} argument was expected")]
    MissingArg(&'static str),
    /// The next argument has a different kind than the event defines.
    #[error("expected a {expected} argument, found {found}")]
    TypeMismatch {
        /// The argument kind the event defines at this position.
        expected: &'static str,
        /// The argument kind the transport actually delivered.
        found: &'static str,
    },
}

impl DecodeEventError {
    fn mismatch(expected: &'static str, found: &Arg) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Arg, DecodeEventError, PayloadReader};
    use crate::fixed::Fixed;

    #[test]
    fn arguments_are_consumed_in_order() {
        let mut payload = PayloadReader::new(vec![
            Arg::Uint(3),
            Arg::Str("text/plain".to_owned()),
            Arg::Fixed(Fixed::from(2)),
            Arg::Object(9),
        ]);

        assert_eq!(3, payload.uint().unwrap());
        assert_eq!("text/plain", payload.string().unwrap());
        assert_eq!(Fixed::from(2), payload.fixed().unwrap());
        assert_eq!(9, payload.object().unwrap());
    }

    #[test]
    fn a_short_payload_is_diagnosed() {
        let mut payload = PayloadReader::new(Vec::new());
        assert_eq!(
            Err(DecodeEventError::MissingArg("string")),
            payload.string()
        );
    }

    #[test]
    fn a_mistyped_argument_is_diagnosed() {
        let mut payload = PayloadReader::new(vec![Arg::Int(-4)]);
        assert_eq!(
            Err(DecodeEventError::TypeMismatch {
                expected: "uint",
                found: "int"
            }),
            payload.uint()
        );
    }
}
