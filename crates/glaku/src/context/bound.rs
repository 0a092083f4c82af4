/// One "currently bound" cell: the id of the bound object, or unset.
///
/// The cell only changes through [`transition`](Self::transition), which
/// reports whether the caller has to issue the driver bind.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct BoundCell(Option<String>);

impl BoundCell {
    #[inline]
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Moves the cell to `id`. Returns `false` when `id` was already bound.
    pub fn transition(&mut self, id: &str) -> bool {
        if self.0.as_deref() == Some(id) {
            return false;
        }
        self.0 = Some(id.to_string());
        true
    }

    /// Forgets the bound id so the next transition always rebinds.
    #[inline]
    pub fn invalidate(&mut self) {
        self.0 = None;
    }
}

/// The program / geometry / render-target triad a draw runs against.
#[derive(Debug, Default, Clone)]
pub struct BoundState {
    pub program: BoundCell,
    pub geometry: BoundCell,
    pub target: BoundCell,
}

impl BoundState {
    pub fn invalidate_all(&mut self) {
        self.program.invalidate();
        self.geometry.invalidate();
        self.target.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_on_change() {
        let mut cell = BoundCell::default();
        assert_eq!(cell.get(), None);
        assert!(cell.transition("a"));
        assert!(!cell.transition("a"));
        assert!(cell.transition("b"));
        assert_eq!(cell.get(), Some("b"));
    }

    #[test]
    fn invalidate_forces_next_transition() {
        let mut cell = BoundCell::default();
        cell.transition("a");
        cell.invalidate();
        assert!(cell.transition("a"));
    }

    #[test]
    fn invalidate_all_resets_every_cell() {
        let mut state = BoundState::default();
        state.program.transition("p");
        state.geometry.transition("g");
        state.target.transition("t");
        state.invalidate_all();
        assert_eq!((state.program.get(), state.geometry.get(), state.target.get()), (None, None, None));
    }
}
