use std::fmt::Debug;

/// Handles for resources owned by an arena, like shader programs or
/// emulated GPU buffers.
///
/// A handle stays valid until the slot it points to is freed. Freeing bumps
/// the slot generation, so any copy of the old handle is detected as stale
/// instead of silently aliasing whatever gets allocated in that slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericHandle<IndexType, GenType> {
    pub(super) index: IndexType,
    pub(super) generation: GenType,
}

pub type Handle = GenericHandle<u32, u32>;

impl Handle {
    #[inline(always)]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline(always)]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline(always)]
    fn array_index(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Use this allocator in most cases.
pub type Allocator<V> = GenerationalIndexAllocator<V>;

/// Basic arena keyed by generational handles
pub struct GenerationalIndexAllocator<V> {
    free: Vec<usize>,
    entries: Vec<AllocatorEntry<V>>,
}

struct AllocatorEntry<V> {
    value: Option<V>,
    generation: u32,
}

impl<V> Default for GenerationalIndexAllocator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GenerationalIndexAllocator<V> {
    const INITIAL_SIZE: usize = 16;

    pub fn new() -> Self {
        GenerationalIndexAllocator {
            free: Vec::new(),
            entries: Vec::with_capacity(Self::INITIAL_SIZE),
        }
    }

    pub fn allocate(&mut self, value: V) -> Handle {
        if let Some(next_index) = self.free.pop() {
            let entry = &mut self.entries[next_index];
            entry.value = Some(value);
            return Handle {
                index: next_index as u32,
                generation: entry.generation,
            };
        }

        let next_index = self.entries.len();
        self.entries.push(AllocatorEntry {
            value: Some(value),
            generation: 0,
        });

        Handle {
            index: next_index as u32,
            generation: 0,
        }
    }

    #[inline(always)]
    pub fn is_live(&self, key: Handle) -> bool {
        self.entries
            .get(key.array_index())
            .map_or(false, |entry| {
                entry.generation == key.generation && entry.value.is_some()
            })
    }

    /// Release the slot behind `key`, returning its value. Stale handles
    /// return `None` and leave the arena untouched.
    pub fn free(&mut self, key: Handle) -> Option<V> {
        if !self.is_live(key) {
            return None;
        }

        let index = key.array_index();
        let entry = &mut self.entries[index];
        let value = entry.value.take();
        entry.generation = entry.generation.wrapping_add(1);

        self.free.push(index);
        value
    }

    pub fn get(&self, key: Handle) -> Option<&V> {
        self.entries
            .get(key.array_index())
            .filter(|entry| entry.generation == key.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, key: Handle) -> Option<&mut V> {
        self.entries
            .get_mut(key.array_index())
            .filter(|entry| entry.generation == key.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &V)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry.value.as_ref().map(|value| {
                (
                    Handle {
                        index: index as u32,
                        generation: entry.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<V: Debug> Debug for GenerationalIndexAllocator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freed_handle_is_stale() {
        let mut allocator = Allocator::new();
        let first = allocator.allocate("first");
        assert!(allocator.is_live(first));
        assert_eq!(allocator.free(first), Some("first"));
        assert!(!allocator.is_live(first));

        // Same slot, new generation
        let second = allocator.allocate("second");
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert_eq!(allocator.get(first), None);
        assert_eq!(allocator.get(second), Some(&"second"));
    }

    #[test]
    fn test_double_free_is_ignored() {
        let mut allocator = Allocator::new();
        let handle = allocator.allocate(3_u32);
        assert_eq!(allocator.free(handle), Some(3));
        assert_eq!(allocator.free(handle), None);
        assert_eq!(allocator.len(), 0);
    }
}
