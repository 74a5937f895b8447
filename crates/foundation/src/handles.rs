/// Generational handle: a slot index plus the generation it was issued for.
///
/// A handle whose generation no longer matches its owner's current generation is
/// stale and must be ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u32, u32); // (index, generation)

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }

    pub fn is_current(&self, generation: u32) -> bool {
        self.1 == generation
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;

    #[test]
    fn handle_parts() {
        let h = Handle::new(3, 7);
        assert_eq!(h.index(), 3);
        assert_eq!(h.generation(), 7);
        assert!(h.is_current(7));
        assert!(!h.is_current(8));
    }
}
