//! Generation-tagged icon cache.
//!
//! Every entity-type reload bumps the generation and reissues load requests. A load that
//! completes with a ticket from an older generation is dropped instead of landing in a
//! slot that now belongs to a different rule.

use foundation::handles::Handle;
use layers::EntityTypeSet;

/// Ask the embedder to load `source` and report back with `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    /// Slot index is the entity-type entry index.
    pub ticket: Handle,
    pub source: String,
    pub tint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot<I> {
    Pending { wants_tint: bool },
    Ready { base: I, tinted: Option<I> },
    Failed,
}

/// Loaded images for one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconImages<'a, I> {
    pub base: &'a I,
    pub tinted: Option<&'a I>,
}

#[derive(Debug, Clone)]
pub struct IconCache<I> {
    generation: u32,
    slots: Vec<Option<Slot<I>>>,
}

impl<I> Default for IconCache<I> {
    fn default() -> Self {
        Self {
            generation: 0,
            slots: Vec::new(),
        }
    }
}

impl<I> IconCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Drops every slot, starts a new generation, and returns the loads to issue.
    pub fn reset(&mut self, types: &EntityTypeSet) -> Vec<IconRequest> {
        self.generation = self.generation.wrapping_add(1);
        self.slots.clear();
        self.slots.resize_with(types.len(), || None);

        let mut requests = Vec::new();
        for (index, style) in types.icon_sources() {
            self.slots[index] = Some(Slot::Pending {
                wants_tint: style.tint.is_some(),
            });
            requests.push(IconRequest {
                ticket: Handle::new(index as u32, self.generation),
                source: style.source.clone(),
                tint: style.tint.clone(),
            });
        }
        requests
    }

    fn pending_slot(&mut self, ticket: Handle) -> Option<&mut Option<Slot<I>>> {
        if !ticket.is_current(self.generation) {
            tracing::debug!(
                slot = ticket.index(),
                ticket_generation = ticket.generation(),
                generation = self.generation,
                "dropping stale icon completion"
            );
            return None;
        }
        let slot = self.slots.get_mut(ticket.index() as usize)?;
        matches!(slot, Some(Slot::Pending { .. })).then_some(slot)
    }

    /// Stores a finished load. Returns `false` (and drops the images) for stale or
    /// unknown tickets.
    pub fn complete(&mut self, ticket: Handle, base: I, tinted: Option<I>) -> bool {
        let Some(slot) = self.pending_slot(ticket) else {
            return false;
        };
        let wants_tint = matches!(slot, Some(Slot::Pending { wants_tint: true }));
        *slot = Some(Slot::Ready {
            base,
            tinted: if wants_tint { tinted } else { None },
        });
        true
    }

    /// Marks a failed load; the slot stays empty and is not retried.
    pub fn fail(&mut self, ticket: Handle) -> bool {
        let Some(slot) = self.pending_slot(ticket) else {
            return false;
        };
        *slot = Some(Slot::Failed);
        true
    }

    pub fn ready(&self, index: usize) -> Option<IconImages<'_, I>> {
        match self.slots.get(index)?.as_ref()? {
            Slot::Ready { base, tinted } => Some(IconImages {
                base,
                tinted: tinted.as_ref(),
            }),
            _ => None,
        }
    }

    pub fn is_failed(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(Slot::Failed)))
    }
}
