// renderer/handle.rs
use std::fmt;
use std::marker::PhantomData;

/// Typed id for a GPU object owned by a [`GraphicsContext`](super::GraphicsContext).
///
/// Handles are plain indices into the context's [`HandleTable`]; they carry no
/// ownership and stay copyable so resources can keep them inside their
/// lifecycle state.
pub struct Handle<K> {
    index: u32,
    _marker: PhantomData<fn() -> K>,
}

// Manual impls so `K` needs no bounds
impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<K> Eq for Handle<K> {}

impl<K> std::hash::Hash for Handle<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

impl<K> Handle<K> {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

pub enum BufferKind {}
pub enum ShaderKind {}
pub enum ProgramKind {}
pub enum TextureKind {}

pub type BufferHandle = Handle<BufferKind>;
pub type ShaderHandle = Handle<ShaderKind>;
pub type ProgramHandle = Handle<ProgramKind>;
pub type TextureHandle = Handle<TextureKind>;

/// Maps handles to the native objects of a graphics backend.
///
/// Slots are never reused, so a stale handle resolves to `None` instead of
/// aliasing a newer object.
pub struct HandleTable<K, V> {
    items: Vec<Option<V>>,
    _marker: PhantomData<fn() -> K>,
}

impl<K, V> HandleTable<K, V> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn insert(&mut self, item: V) -> Handle<K> {
        let index = self.items.len() as u32;
        self.items.push(Some(item));
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle<K>) -> Option<&V> {
        self.items
            .get(handle.index() as usize)
            .and_then(Option::as_ref)
    }

    pub fn remove(&mut self, handle: Handle<K>) -> Option<V> {
        self.items
            .get_mut(handle.index() as usize)
            .and_then(Option::take)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.items.iter().filter(|item| item.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for HandleTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy() {
        let h1: BufferHandle = Handle::new(5);
        let h2 = h1;
        let h3 = h1;
        assert_eq!(h1.index(), h2.index());
        assert_eq!(h1, h3);
    }

    #[test]
    fn removed_slots_are_not_reused() {
        let mut table: HandleTable<TextureKind, &str> = HandleTable::new();
        let a = table.insert("a");
        assert_eq!(table.remove(a), Some("a"));
        let b = table.insert("b");
        assert_ne!(a, b);
        assert!(table.get(a).is_none());
        assert_eq!(table.get(b), Some(&"b"));
        assert_eq!(table.len(), 1);
    }
}
