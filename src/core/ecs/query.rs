use std::any::TypeId;

use super::{Entity, Registry};

/// A set of component types that can be matched against the registry.
///
/// Implemented for tuples of one to six component types.
pub trait ComponentSet {
    /// Type ids of every member of the set.
    fn type_ids() -> Vec<TypeId>;

    /// Every live entity that owns all members of the set.
    fn matching(registry: &Registry) -> Vec<Entity> {
        let type_ids = Self::type_ids();

        let mut storages = Vec::with_capacity(type_ids.len());
        for type_id in &type_ids {
            match registry.erased_storage(*type_id) {
                Some(storage) => storages.push(storage),
                None => return Vec::new(),
            }
        }

        let Some(smallest) = storages.iter().min_by_key(|storage| storage.len()) else {
            return Vec::new();
        };

        smallest
            .entities()
            .into_iter()
            .filter(|entity| registry.is_alive(*entity))
            .filter(|entity| storages.iter().all(|storage| storage.contains_entity(*entity)))
            .collect()
    }
}

macro_rules! impl_component_set {
    ($($component:ident),+) => {
        impl<$($component: 'static),+> ComponentSet for ($($component,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$component>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
