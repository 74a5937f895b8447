/// Metadata for one paint callback.
///
/// Indices count paints actually performed, not requests.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Frame {
    /// 0-based paint index.
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn next_advances_index() {
        let f0 = Frame::new(0);
        assert_eq!(f0.next(), Frame::new(1));
        assert!(f0 < f0.next());
    }
}
