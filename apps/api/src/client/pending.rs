/// Holds a state slot at an in-flight value for the length of an awaited call.
///
/// Dropping the guard writes `fallback` back, so an abandoned future leaves the slot
/// where the operation started instead of stuck in flight. [`Pending::settle`] replaces
/// the fallback with the outcome.
pub(crate) struct Pending<'a, T: Copy> {
    slot: &'a mut T,
    fallback: T,
}

impl<'a, T: Copy> Pending<'a, T> {
    pub(crate) fn enter(slot: &'a mut T, during: T, fallback: T) -> Self {
        *slot = during;
        Self { slot, fallback }
    }

    pub(crate) fn settle(mut self, outcome: T) {
        self.fallback = outcome;
    }
}

impl<T: Copy> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        *self.slot = self.fallback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_restores_fallback() {
        let mut uploading = false;
        {
            let guard = Pending::enter(&mut uploading, true, false);
            assert!(*guard.slot);
        }
        assert!(!uploading);
    }

    #[test]
    fn test_settle_keeps_outcome() {
        let mut state = 1u8;
        let guard = Pending::enter(&mut state, 2, 1);
        guard.settle(3);
        assert_eq!(state, 3);
    }
}
