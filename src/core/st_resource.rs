use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded, reference-counted value with interior mutability.
///
/// `StResource` is used for plain shared state that several owners read and
/// occasionally write within one frame, such as the validated engine configuration.
///
/// # Examples
///
/// ```
/// use voxel_world::core::StResource;
///
/// let resource = StResource::new(vec![1, 2, 3]);
/// let alias = resource.clone();
///
/// alias.get_mut().push(4);
/// assert_eq!(resource.get().len(), 4);
/// ```
///
/// # Panics
/// - `get_mut` panics if any borrow is outstanding
/// - `get` panics if a mutable borrow is outstanding
pub struct StResource<T> {
    resource: Rc<RefCell<T>>,
}

impl<T> StResource<T> {
    /// Creates a new `StResource` containing the given value.
    ///
    /// # Arguments
    /// * `resource` - The value to be stored
    pub fn new(resource: T) -> Self {
        Self {
            resource: Rc::new(RefCell::new(resource)),
        }
    }

    /// Borrows the contained value immutably.
    pub fn get(&self) -> Ref<'_, T> {
        self.resource.borrow()
    }

    /// Borrows the contained value mutably.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.resource.borrow_mut()
    }

    /// Attempts a mutable borrow, returning `None` when the value is already borrowed.
    ///
    /// Frame systems use this where a re-entrant borrow would otherwise panic.
    pub fn try_get_mut(&self) -> Option<RefMut<'_, T>> {
        self.resource.try_borrow_mut().ok()
    }

    /// Number of live handles to the same value.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.resource)
    }
}

impl<T> Clone for StResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
