//! Interrupt handlers and the handler table.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::common::AplicError;

/// A handler invoked synchronously, in trap context, for one claimed source.
///
/// Handlers run with global interrupts disabled and must quiet their device
/// before returning; otherwise the source is claimed again in the same trap.
pub trait InterruptHandler: Send + Sync {
    /// Services the interrupt.
    fn handle(&self);
}

impl<F: Fn() + Send + Sync> InterruptHandler for F {
    #[inline]
    fn handle(&self) {
        self();
    }
}

/// Handler installed in every slot until replaced; logs the id and does nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultHandler {
    id: u32,
}

impl DefaultHandler {
    /// Creates the default handler for source `id`.
    pub const fn new(id: u32) -> Self {
        Self { id }
    }
}

impl InterruptHandler for DefaultHandler {
    fn handle(&self) {
        info!(id = self.id, "default APLIC handler");
    }
}

/// Fixed-size arena of handlers indexed by source id `0..=num_sources`.
///
/// Slots are never empty. Installing replaces the slot's handler; lookups clone
/// the handler out of the table so it can run without holding the lock.
pub struct HandlerTable {
    slots: RwLock<Vec<Arc<dyn InterruptHandler>>>,
}

impl HandlerTable {
    /// Creates a table for sources `1..=num_sources`, every slot holding the default handler.
    pub fn new(num_sources: u32) -> Self {
        Self {
            slots: RwLock::new(Self::defaults(num_sources)),
        }
    }

    fn defaults(num_sources: u32) -> Vec<Arc<dyn InterruptHandler>> {
        (0..=num_sources)
            .map(|id| Arc::new(DefaultHandler::new(id)) as Arc<dyn InterruptHandler>)
            .collect()
    }

    /// Highest source id the table holds a slot for.
    pub fn num_sources(&self) -> u32 {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.len().saturating_sub(1) as u32
    }

    /// Resets every slot to the default handler.
    pub fn default_all(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let num_sources = slots.len().saturating_sub(1) as u32;
        *slots = Self::defaults(num_sources);
    }

    /// Installs `handler` for source `id`, replacing whatever was there.
    pub fn install(&self, id: u32, handler: Arc<dyn InterruptHandler>) -> Result<(), AplicError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let max = slots.len().saturating_sub(1) as u32;
        let slot = slots
            .get_mut(id as usize)
            .ok_or(AplicError::InvalidSourceId { id, max })?;
        *slot = handler;
        Ok(())
    }

    /// Installs a closure as the handler for source `id`.
    pub fn install_fn<F>(&self, id: u32, handler: F) -> Result<(), AplicError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.install(id, Arc::new(handler))
    }

    /// Handler currently installed for `id`, or `None` if `id` is out of range.
    pub fn handler(&self, id: u32) -> Option<Arc<dyn InterruptHandler>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(id as usize).cloned()
    }

    /// Looks up and runs the handler for `id`. Returns `false` if `id` is out of range.
    pub fn dispatch(&self, id: u32) -> bool {
        self.handler(id).is_some_and(|handler| {
            handler.handle();
            true
        })
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("num_sources", &self.num_sources())
            .finish_non_exhaustive()
    }
}
