//! Unwind payload used to abort a running stage.

use std::any::Any;

/// Why a stage callback was cut short.
///
/// Raised with `resume_unwind`, which skips the panic hook, so an abort
/// never prints a panic message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Abort {
    Fatal,
    Skip,
}

impl Abort {
    pub(crate) fn raise(self) -> ! {
        std::panic::resume_unwind(Box::new(self))
    }

    /// Split a caught payload into an abort or a genuine panic.
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Result<Abort, Box<dyn Any + Send>> {
        payload.downcast::<Abort>().map(|abort| *abort)
    }
}
