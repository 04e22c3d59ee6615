//! # Entity/Component Registry
//!
//! A minimal fixed-capacity entity store. It is the substrate the frame systems
//! run over, not a general database: there is no query planner, no archetypes and
//! no change tracking.
//!
//! ## Architecture
//!
//! * `Entity` - an index plus a generation. Destroying an entity bumps the generation
//!   of its index, so handles to the old entity stop resolving instead of aliasing
//!   whatever is created in the same slot later.
//! * `ComponentStorage<T>` - one dense array per component type with a sparse
//!   entity-index map.
//! * `Registry` - owns the storages, each in its own `RefCell`, so a system can hold
//!   mutable borrows of several component types at once.
//! * `ComponentSet` - implemented for tuples of component types; `Registry::view`
//!   returns every entity that has all of them.
//!
//! ## Usage
//! ```rust
//! use voxel_world::core::ecs::Registry;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position(f32);
//! struct Velocity(f32);
//!
//! let mut registry = Registry::with_capacity(8);
//! let entity = registry.create_entity().unwrap();
//! registry.add_component(entity, Position(0.0));
//! registry.add_component(entity, Velocity(2.0));
//!
//! for e in registry.view::<(Position, Velocity)>() {
//!     let velocity = registry.get::<Velocity>(e).unwrap().0;
//!     registry.get_mut::<Position>(e).unwrap().0 += velocity;
//! }
//! assert_eq!(*registry.get::<Position>(entity).unwrap(), Position(2.0));
//! ```

use std::{
    any::{type_name, TypeId},
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
};

mod query;
mod storage;

pub use query::ComponentSet;
pub use storage::ComponentStorage;

use storage::AnyStorage;

/// Generation-checked entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this entity inside the registry.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Fixed-capacity entity registry with per-type component storages.
pub struct Registry {
    capacity: usize,
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl Registry {
    /// Creates a registry that can hold at most `capacity` live entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            generations: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            storages: HashMap::new(),
        }
    }

    /// Allocates a new entity.
    ///
    /// # Returns
    /// `None` when every slot is occupied
    pub fn create_entity(&mut self) -> Option<Entity> {
        if let Some(index) = self.free_list.pop() {
            self.alive[index as usize] = true;
            return Some(Entity::new(index, self.generations[index as usize]));
        }

        if self.generations.len() >= self.capacity {
            log::warn!("Entity registry is full ({} entities)", self.capacity);
            return None;
        }

        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Some(Entity::new(index, 0))
    }

    /// Destroys an entity and all of its components.
    ///
    /// # Returns
    /// `false` if the handle was already stale
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        for storage in self.storages.values() {
            storage.remove_entity(entity);
        }

        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(entity.index);
        true
    }

    /// Returns `true` while `entity` refers to a live entity of the current generation.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        slot < self.alive.len() && self.alive[slot] && self.generations[slot] == entity.generation
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    /// Returns `true` if no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ensures a storage exists for `T`.
    pub fn register<T: 'static>(&mut self) {
        let capacity = self.capacity;
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(RefCell::new(ComponentStorage::<T>::with_capacity(capacity))));
    }

    /// Adds or replaces a component on a live entity.
    ///
    /// # Returns
    /// `false` if the entity is not alive
    pub fn add_component<T: 'static>(&mut self, entity: Entity, component: T) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.register::<T>();
        match self.storage_mut::<T>() {
            Some(mut storage) => {
                storage.insert(entity, component);
                true
            }
            None => false,
        }
    }

    /// Removes a component, returning it if the entity had one.
    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Returns `true` if the entity has a `T`.
    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.storages
            .get(&TypeId::of::<T>())
            .is_some_and(|storage| storage.contains_entity(entity))
    }

    /// Borrows the entity's `T`.
    pub fn get<T: 'static>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        let storage = self.storage::<T>()?;
        Ref::filter_map(storage, |storage| storage.get(entity)).ok()
    }

    /// Mutably borrows the entity's `T`.
    pub fn get_mut<T: 'static>(&self, entity: Entity) -> Option<RefMut<'_, T>> {
        let storage = self.storage_mut::<T>()?;
        RefMut::filter_map(storage, |storage| storage.get_mut(entity)).ok()
    }

    /// Borrows the whole storage for `T`.
    pub fn storage<T: 'static>(&self) -> Option<Ref<'_, ComponentStorage<T>>> {
        self.typed_cell::<T>().map(RefCell::borrow)
    }

    /// Mutably borrows the whole storage for `T`.
    ///
    /// # Panics
    /// Panics if the same storage is already borrowed; systems borrow each
    /// component type at most once per pass.
    pub fn storage_mut<T: 'static>(&self) -> Option<RefMut<'_, ComponentStorage<T>>> {
        self.typed_cell::<T>().map(RefCell::borrow_mut)
    }

    fn typed_cell<T: 'static>(&self) -> Option<&RefCell<ComponentStorage<T>>> {
        let storage = self.storages.get(&TypeId::of::<T>())?;
        let cell = storage.as_any().downcast_ref::<RefCell<ComponentStorage<T>>>();
        if cell.is_none() {
            log::error!("Storage for {} has the wrong type", type_name::<T>());
        }
        cell
    }

    pub(crate) fn erased_storage(&self, type_id: TypeId) -> Option<&dyn AnyStorage> {
        self.storages.get(&type_id).map(|storage| storage.as_ref())
    }

    /// Snapshot of every entity that owns all components in `S`.
    ///
    /// Iteration starts from the smallest participating storage. The returned list is
    /// fixed for the pass, so systems can borrow and mutate components while walking it.
    pub fn view<S: ComponentSet>(&self) -> Vec<Entity> {
        S::matching(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);
    struct Tag;

    #[test]
    fn capacity_is_enforced_and_slots_are_recycled() {
        let mut registry = Registry::with_capacity(2);
        let a = registry.create_entity().unwrap();
        let _b = registry.create_entity().unwrap();
        assert!(registry.create_entity().is_none());

        assert!(registry.destroy_entity(a));
        let c = registry.create_entity().unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert!(!registry.is_alive(a));
    }

    #[test]
    fn destroyed_entity_loses_components() {
        let mut registry = Registry::with_capacity(4);
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Health(3));
        registry.destroy_entity(e);

        let reused = registry.create_entity().unwrap();
        assert!(registry.get::<Health>(e).is_none());
        assert!(registry.get::<Health>(reused).is_none());
        assert!(!registry.add_component(e, Health(1)));
    }

    #[test]
    fn view_requires_every_component() {
        let mut registry = Registry::with_capacity(4);
        let both = registry.create_entity().unwrap();
        let only_health = registry.create_entity().unwrap();
        registry.add_component(both, Health(1));
        registry.add_component(both, Tag);
        registry.add_component(only_health, Health(2));

        assert_eq!(registry.view::<(Health, Tag)>(), vec![both]);
        assert_eq!(registry.view::<(Health,)>().len(), 2);
    }

    #[test]
    fn distinct_storages_borrow_mutably_together() {
        let mut registry = Registry::with_capacity(1);
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Health(1));
        registry.add_component(e, 5u8);

        let mut health = registry.get_mut::<Health>(e).unwrap();
        let bonus = registry.get_mut::<u8>(e).unwrap();
        health.0 += *bonus as u32;
        assert_eq!(health.0, 6);
    }

    #[test]
    fn remove_component_reports_presence() {
        let mut registry = Registry::with_capacity(1);
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Tag);
        assert!(registry.has_component::<Tag>(e));
        assert!(registry.remove_component::<Tag>(e).is_some());
        assert!(!registry.has_component::<Tag>(e));
        assert!(registry.remove_component::<Tag>(e).is_none());
    }
}
