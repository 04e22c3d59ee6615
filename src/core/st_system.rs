use std::{
    any::Any,
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded container for a system or resource that can be type-erased
/// and recovered by downcasting.
///
/// `StSystem` wraps a value in `Rc<RefCell<T>>`. Handles are cheap to clone and all
/// clones refer to the same value. The erased form (`Rc<dyn Any>`) is what the
/// [`StInjectionSystem`](super::injection_system::StInjectionSystem) stores, and
/// [`StSystem::from_any`] turns it back into a typed handle.
///
/// # Examples
///
/// ```rust
/// use voxel_world::core::StSystem;
///
/// let system = StSystem::new(String::from("noise"));
/// let erased = system.get_any();
///
/// assert!(StSystem::<u32>::from_any(erased.clone()).is_none());
///
/// let typed = StSystem::<String>::from_any(erased).unwrap();
/// typed.get_mut().push_str("_field");
/// assert_eq!(*system.get(), "noise_field");
/// ```
///
/// # Panics
/// - `get_mut` panics if any borrow is outstanding
/// - `get` panics if a mutable borrow is outstanding
pub struct StSystem<T> {
    system: Rc<RefCell<T>>,
}

impl<T: 'static> StSystem<T> {
    /// Creates a new `StSystem` containing the given value.
    ///
    /// # Arguments
    /// * `system` - The value to be stored
    pub fn new(system: T) -> Self {
        Self {
            system: Rc::new(RefCell::new(system)),
        }
    }

    /// Returns an immutable borrow of the contained value.
    pub fn get(&self) -> Ref<'_, T> {
        self.system.borrow()
    }

    /// Returns a mutable borrow of the contained value.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.system.borrow_mut()
    }

    /// Returns a type-erased handle to the same value.
    ///
    /// # Returns
    /// An `Rc<dyn Any>` whose concrete type is `RefCell<T>`
    pub fn get_any(&self) -> Rc<dyn Any> {
        self.system.clone()
    }

    /// Recovers a typed handle from an erased one.
    ///
    /// # Arguments
    /// * `erased` - A handle previously produced by [`StSystem::get_any`]
    ///
    /// # Returns
    /// `Some(StSystem<T>)` if the erased value holds a `T`, `None` otherwise
    pub fn from_any(erased: Rc<dyn Any>) -> Option<Self> {
        erased
            .downcast::<RefCell<T>>()
            .ok()
            .map(|system| Self { system })
    }
}

impl<T> Clone for StSystem<T> {
    fn clone(&self) -> Self {
        Self {
            system: self.system.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_any() {
        let system = StSystem::new(5i64);
        let recovered = StSystem::<i64>::from_any(system.get_any()).unwrap();
        *recovered.get_mut() += 1;

        assert_eq!(*system.get(), 6);
    }

    #[test]
    fn wrong_type_does_not_downcast() {
        let system = StSystem::new(5i64);
        assert!(StSystem::<i32>::from_any(system.get_any()).is_none());
    }
}
