use crate::error::AppError;
use crate::model::Board;
use std::cell::RefCell;

pub mod json_store;

pub use json_store::JsonFileStore;

/// Durable home of the board snapshot. `save` overwrites the previous
/// snapshot wholesale.
pub trait BoardPersistence {
    /// Last saved board, or `None` when nothing usable is stored.
    fn load(&self) -> Option<Board>;

    fn save(&self, board: &Board) -> Result<(), AppError>;
}

/// Keeps the serialized snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw<S: Into<String>>(raw: S) -> Self {
        Self {
            slot: RefCell::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl BoardPersistence for MemoryStore {
    fn load(&self) -> Option<Board> {
        let slot = self.slot.borrow();
        json_store::decode_board(slot.as_deref()?, "memory")
    }

    fn save(&self, board: &Board) -> Result<(), AppError> {
        let encoded = serde_json::to_string(board)?;
        *self.slot.borrow_mut() = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardPersistence, MemoryStore};
    use crate::model::Board;

    #[test]
    fn empty_memory_store_loads_nothing() {
        assert!(MemoryStore::new().load().is_none());
    }

    #[test]
    fn memory_store_treats_garbage_as_absent() {
        let store = MemoryStore::with_raw("not json at all");
        assert!(store.load().is_none());
    }

    #[test]
    fn memory_store_returns_saved_board() {
        let store = MemoryStore::new();
        store.save(&Board::default()).unwrap();

        assert_eq!(store.load(), Some(Board::default()));
        assert!(store.raw().unwrap().contains("\"columnOrder\""));
    }
}
