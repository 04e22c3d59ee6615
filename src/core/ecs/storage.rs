use std::any::Any;

use super::Entity;

/// Dense storage for one component type.
///
/// Components live contiguously in `dense`, with `owners[i]` naming the entity that
/// owns `dense[i]`. `sparse` maps an entity index to its dense slot. Removal swaps the
/// last component into the freed slot so the dense array never has holes.
pub struct ComponentStorage<T> {
    dense: Vec<T>,
    owners: Vec<Entity>,
    sparse: Vec<Option<u32>>,
}

impl<T> ComponentStorage<T> {
    /// Creates an empty storage able to address `capacity` entity indices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::new(),
            owners: Vec::new(),
            sparse: vec![None; capacity],
        }
    }

    /// Inserts or replaces the component for `entity`.
    ///
    /// # Returns
    /// The previous component, if the entity already had one
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }

        if let Some(dense_index) = self.dense_index(entity) {
            return Some(std::mem::replace(&mut self.dense[dense_index], component));
        }

        // A stale owner from an earlier generation may still occupy the slot.
        self.remove_index(slot);

        self.sparse[slot] = Some(self.dense.len() as u32);
        self.dense.push(component);
        self.owners.push(entity);
        None
    }

    /// Removes and returns the component for `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.dense_index(entity)?;
        self.remove_index(entity.index() as usize)
    }

    fn remove_index(&mut self, slot: usize) -> Option<T> {
        let dense_index = self.sparse.get(slot).copied().flatten()? as usize;
        self.sparse[slot] = None;

        let last = self.dense.len() - 1;
        if dense_index != last {
            let moved_owner = self.owners[last];
            self.sparse[moved_owner.index() as usize] = Some(dense_index as u32);
        }
        self.owners.swap_remove(dense_index);
        Some(self.dense.swap_remove(dense_index))
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let dense_index = self.sparse.get(entity.index() as usize).copied().flatten()? as usize;
        (self.owners[dense_index] == entity).then_some(dense_index)
    }

    /// Returns the component owned by `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|index| &self.dense[index])
    }

    /// Returns the component owned by `entity` mutably.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(move |index| &mut self.dense[index])
    }

    /// Returns `true` if `entity` owns a component here.
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Entities owning a component, in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Iterates `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(entity, component)` pairs mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

/// Type-erased view of a `RefCell<ComponentStorage<T>>` held by the registry.
pub(crate) trait AnyStorage {
    fn as_any(&self) -> &dyn Any;
    fn remove_entity(&self, entity: Entity);
    fn contains_entity(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn entities(&self) -> Vec<Entity>;
}

impl<T: 'static> AnyStorage for std::cell::RefCell<ComponentStorage<T>> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn remove_entity(&self, entity: Entity) {
        self.borrow_mut().remove(entity);
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.borrow().contains(entity)
    }

    fn len(&self) -> usize {
        self.borrow().len()
    }

    fn entities(&self) -> Vec<Entity> {
        self.borrow().entities().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_remove_keeps_sparse_map_consistent() {
        let a = Entity::new(0, 0);
        let b = Entity::new(1, 0);
        let c = Entity::new(2, 0);
        let mut storage = ComponentStorage::with_capacity(4);
        storage.insert(a, 'a');
        storage.insert(b, 'b');
        storage.insert(c, 'c');

        assert_eq!(storage.remove(a), Some('a'));
        assert_eq!(storage.get(c), Some(&'c'));
        assert_eq!(storage.get(b), Some(&'b'));
        assert_eq!(storage.len(), 2);
        assert!(!storage.contains(a));
    }

    #[test]
    fn stale_generation_is_not_visible() {
        let old = Entity::new(3, 0);
        let new = Entity::new(3, 1);
        let mut storage = ComponentStorage::with_capacity(4);
        storage.insert(old, 10);

        assert_eq!(storage.get(new), None);
        assert_eq!(storage.remove(new), None);

        storage.insert(new, 20);
        assert_eq!(storage.get(old), None);
        assert_eq!(storage.get(new), Some(&20));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn insert_replaces_existing_component() {
        let e = Entity::new(0, 0);
        let mut storage = ComponentStorage::with_capacity(1);
        assert_eq!(storage.insert(e, 1), None);
        assert_eq!(storage.insert(e, 2), Some(1));
        assert_eq!(storage.len(), 1);
    }
}
