//! Protocol handler registry and dispatch
//!
//! Each protocol identifier owns at most one slot. Slots are filled during
//! subsystem setup and cleared at teardown; in between, every verified
//! frame is routed to the handler in its slot.

use crate::tx::Transmitter;

/// A protocol layered on top of the link
///
/// `handle` runs inline in the engine cycle, so it must return promptly.
/// Replies go through `tx`; while a previous frame is still draining the
/// send is refused with [`crate::SendError::Busy`].
pub trait ProtocolHandler {
    /// Process the payload of one verified frame
    fn handle(&mut self, payload: &[u8], tx: &mut Transmitter);
}

impl<F> ProtocolHandler for F
where
    F: FnMut(&[u8], &mut Transmitter),
{
    fn handle(&mut self, payload: &[u8], tx: &mut Transmitter) {
        self(payload, tx)
    }
}

/// Registry and routing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Identifier beyond the registry's range
    OutOfRange,
    /// Slot already holds a handler
    AlreadyRegistered,
    /// No handler in the slot
    NotRegistered,
}

/// Fixed table of handler slots, indexed by protocol identifier
pub struct Registry<'h, const N: usize> {
    slots: [Option<&'h mut dyn ProtocolHandler>; N],
}

impl<'h, const N: usize> Default for Registry<'h, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h, const N: usize> Registry<'h, N> {
    /// Create a registry with every slot empty
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Install `handler` for `id`
    ///
    /// An occupied slot is left untouched.
    pub fn register(
        &mut self,
        id: u8,
        handler: &'h mut dyn ProtocolHandler,
    ) -> Result<(), RegistryError> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or(RegistryError::OutOfRange)?;
        if slot.is_some() {
            return Err(RegistryError::AlreadyRegistered);
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Clear the slot for `id`, handing back whatever was in it
    pub fn unregister(&mut self, id: u8) -> Option<&'h mut dyn ProtocolHandler> {
        self.slots.get_mut(id as usize).and_then(Option::take)
    }

    /// Check if a handler is installed for `id`
    pub fn is_registered(&self, id: u8) -> bool {
        matches!(self.slots.get(id as usize), Some(Some(_)))
    }

    /// Run the handler for `id` on `payload`
    pub fn dispatch(
        &mut self,
        id: u8,
        payload: &[u8],
        tx: &mut Transmitter,
    ) -> Result<(), RegistryError> {
        match self.slots.get_mut(id as usize) {
            Some(Some(handler)) => {
                handler.handle(payload, tx);
                Ok(())
            }
            Some(None) => Err(RegistryError::NotRegistered),
            None => Err(RegistryError::OutOfRange),
        }
    }
}
