//! # Injection System
//!
//! A type-keyed registry of single-threaded shared values. The frame scheduler
//! passes one of these to every system, and systems pull the resources they need
//! (`ChunkStore`, `Registry`, `CameraController`, the input snapshot, ...) by type.
//!
//! ## Usage
//! ```rust
//! use voxel_world::core::{injection_system::StInjectionSystem, StSystem};
//!
//! let resources = StInjectionSystem::new();
//! let inserted = resources.insert(String::from("Hello"));
//! let retrieved: StSystem<String> = resources.get().unwrap();
//! assert_eq!(*retrieved.get(), *inserted.get());
//! assert!(resources.get::<u64>().is_none());
//! ```

use super::{StResource, StSystem};
use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    rc::Rc,
};

/// A single-threaded dependency container keyed by type.
///
/// Each type has at most one entry. Inserting a value of a type that is already
/// present replaces it, and existing handles to the old value keep it alive
/// until they are dropped.
pub struct StInjectionSystem {
    systems: StResource<HashMap<TypeId, Rc<dyn Any>>>,
}

impl StInjectionSystem {
    /// Creates a new, empty `StInjectionSystem`.
    pub fn new() -> Self {
        Self {
            systems: StResource::new(HashMap::new()),
        }
    }

    /// Inserts a value, replacing any previous value of the same type.
    ///
    /// # Arguments
    /// * `system` - The value to insert
    ///
    /// # Returns
    /// An `StSystem<T>` handle to the inserted value
    pub fn insert<T: 'static>(&self, system: T) -> StSystem<T> {
        let handle = StSystem::new(system);
        self.insert_handle(handle.clone());
        handle
    }

    /// Registers an existing handle so that the registry and the caller share it.
    ///
    /// # Arguments
    /// * `handle` - The handle to register
    pub fn insert_handle<T: 'static>(&self, handle: StSystem<T>) {
        self.systems
            .get_mut()
            .insert(TypeId::of::<T>(), handle.get_any());
    }

    /// Retrieves the value of type `T`.
    ///
    /// # Returns
    /// `Some(StSystem<T>)` if a value of that type was inserted, `None` otherwise
    pub fn get<T: 'static>(&self) -> Option<StSystem<T>> {
        let erased = self.systems.get().get(&TypeId::of::<T>()).cloned();
        match erased {
            Some(erased) => {
                let typed = StSystem::<T>::from_any(erased);
                if typed.is_none() {
                    log::error!("Resource slot for {} holds another type", type_name::<T>());
                }
                typed
            }
            None => None,
        }
    }

    /// Returns `true` when a value of type `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.systems.get().contains_key(&TypeId::of::<T>())
    }

    /// Removes the value of type `T`, returning whether one was present.
    pub fn remove<T: 'static>(&self) -> bool {
        self.systems.get_mut().remove(&TypeId::of::<T>()).is_some()
    }
}

impl Default for StInjectionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StInjectionSystem {
    fn clone(&self) -> Self {
        Self {
            systems: self.systems.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_previous_value() {
        let resources = StInjectionSystem::new();
        let first = resources.insert(1u8);
        resources.insert(2u8);

        assert_eq!(*resources.get::<u8>().unwrap().get(), 2);
        assert_eq!(*first.get(), 1);
    }

    #[test]
    fn handles_are_shared_with_the_registry() {
        let resources = StInjectionSystem::new();
        let handle = resources.insert(vec![0u32]);
        resources.get::<Vec<u32>>().unwrap().get_mut().push(1);

        assert_eq!(handle.get().len(), 2);
    }

    #[test]
    fn missing_and_removed_types_are_none() {
        let resources = StInjectionSystem::new();
        assert!(resources.get::<f32>().is_none());

        resources.insert(1.0f32);
        assert!(resources.contains::<f32>());
        assert!(resources.remove::<f32>());
        assert!(resources.get::<f32>().is_none());
    }
}
