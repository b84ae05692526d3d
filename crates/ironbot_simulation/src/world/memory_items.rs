//! In-memory реестр предметов (тесты, headless runner)

use bevy::prelude::*;

use super::{ItemInfo, ItemRegistry};
use crate::components::{EntityFlags, EntityType, ItemHandle};

#[derive(Debug, Clone)]
struct Entry {
    info: ItemInfo,
    present: bool,
}

/// Предметы по типам; индекс handle = позиция в массиве своего типа
#[derive(Debug, Clone, Default)]
pub struct MemoryItems {
    by_type: [Vec<Entry>; EntityType::COUNT],
}

impl MemoryItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EntityType, position: Vec3, flags: EntityFlags, radius: f32) -> ItemHandle {
        let list = &mut self.by_type[kind.index()];
        let handle = ItemHandle::new(kind, list.len() as u32);
        list.push(Entry {
            info: ItemInfo {
                handle,
                position,
                flags,
                radius,
            },
            present: true,
        });
        handle
    }

    /// Предмет подобран/сломан — исчезает из мира
    pub fn take(&mut self, handle: ItemHandle) {
        if let Some(entry) = self.entry_mut(handle) {
            entry.present = false;
        }
    }

    /// Respawn предмета
    pub fn restore(&mut self, handle: ItemHandle) {
        if let Some(entry) = self.entry_mut(handle) {
            entry.present = true;
        }
    }

    /// Передвинуть (физический объект толкнули)
    pub fn set_position(&mut self, handle: ItemHandle, position: Vec3) {
        if let Some(entry) = self.entry_mut(handle) {
            entry.info.position = position;
        }
    }

    fn entry(&self, handle: ItemHandle) -> Option<&Entry> {
        self.by_type[handle.kind.index()].get(handle.index as usize)
    }

    fn entry_mut(&mut self, handle: ItemHandle) -> Option<&mut Entry> {
        self.by_type[handle.kind.index()].get_mut(handle.index as usize)
    }

    fn present(&self) -> impl Iterator<Item = &ItemInfo> + '_ {
        self.by_type.iter().flatten().filter(|e| e.present).map(|e| &e.info)
    }
}

impl ItemRegistry for MemoryItems {
    fn item(&self, handle: ItemHandle) -> Option<ItemInfo> {
        self.entry(handle).filter(|e| e.present).map(|e| e.info)
    }

    fn is_present(&self, handle: ItemHandle) -> bool {
        self.entry(handle).is_some_and(|e| e.present)
    }

    fn nearest_item(&self, kind: EntityType, point: Vec3, exclude: &[ItemHandle]) -> Option<ItemInfo> {
        self.by_type[kind.index()]
            .iter()
            .filter(|e| e.present && !exclude.contains(&e.info.handle))
            .map(|e| (e.info, e.info.position.distance_squared(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(info, _)| info)
    }

    fn disturbing_object(&self, point: Vec3, radius: f32) -> Option<ItemInfo> {
        self.present()
            .filter(|info| info.handle.kind == EntityType::Object)
            .filter(|info| info.position.distance(point) <= radius + info.radius)
            .min_by(|a, b| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_respects_exclude_and_presence() {
        let mut items = MemoryItems::new();
        let near = items.add(EntityType::Health, Vec3::new(1.0, 0.0, 0.0), EntityFlags::RESPAWNABLE, 0.3);
        let far = items.add(EntityType::Health, Vec3::new(8.0, 0.0, 0.0), EntityFlags::RESPAWNABLE, 0.3);

        assert_eq!(items.nearest_item(EntityType::Health, Vec3::ZERO, &[]).map(|i| i.handle), Some(near));
        assert_eq!(items.nearest_item(EntityType::Health, Vec3::ZERO, &[near]).map(|i| i.handle), Some(far));

        items.take(far);
        assert!(!items.is_present(far));
        assert_eq!(items.nearest_item(EntityType::Health, Vec3::ZERO, &[near]), None);

        items.restore(far);
        assert!(items.item(far).is_some());
    }

    #[test]
    fn test_disturbing_object_only_objects_in_radius() {
        let mut items = MemoryItems::new();
        items.add(EntityType::Weapon, Vec3::new(0.5, 0.0, 0.0), EntityFlags::NONE, 0.3);
        let barrel = items.add(EntityType::Object, Vec3::new(1.0, 0.0, 0.0), EntityFlags::EXPLOSIVE, 0.4);

        assert_eq!(items.disturbing_object(Vec3::ZERO, 1.0).map(|i| i.handle), Some(barrel));
        assert_eq!(items.disturbing_object(Vec3::new(-5.0, 0.0, 0.0), 1.0), None);
    }
}
