//! Item tracker — ближайшие предметы по типам + список подобранных
//!
//! Подобранный предмет исключается из поиска ближайших до истечения respawn_time.
//! Список подобранных ограничен (старые вытесняются).

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::components::{EntityType, ItemHandle};
use crate::config::ItemsConfig;
use crate::world::{ItemInfo, ItemRegistry};

/// Запись в списке подобранных
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedItem {
    pub handle: ItemHandle,
    pub expires_at: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ItemTracker {
    nearest: [Option<ItemInfo>; EntityType::COUNT],
    picked: VecDeque<PickedItem>,
}

impl ItemTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nearest(&self, kind: EntityType) -> Option<&ItemInfo> {
        self.nearest[kind.index()].as_ref()
    }

    pub fn picked(&self) -> impl Iterator<Item = &PickedItem> + '_ {
        self.picked.iter()
    }

    pub fn is_picked(&self, handle: ItemHandle) -> bool {
        self.picked.iter().any(|p| p.handle == handle)
    }

    pub fn clear(&mut self) {
        self.nearest = Default::default();
        self.picked.clear();
    }

    fn remember(&mut self, handle: ItemHandle, now: f32, config: &ItemsConfig) {
        if config.picked_capacity == 0 {
            return;
        }
        while self.picked.len() >= config.picked_capacity {
            self.picked.pop_front();
        }
        self.picked.push_back(PickedItem {
            handle,
            expires_at: now + config.respawn_time,
        });
    }

    /// Обновить cursors. Возвращает предметы, подобранные с прошлого тика.
    pub fn refresh(
        &mut self,
        now: f32,
        position: Vec3,
        registry: &dyn ItemRegistry,
        config: &ItemsConfig,
    ) -> Vec<ItemHandle> {
        self.picked.retain(|p| p.expires_at > now);

        let mut picked_now = Vec::new();
        for kind in EntityType::PICKUPS {
            // Стояли на предмете, а он исчез — подобрали
            if let Some(previous) = self.nearest[kind.index()] {
                let touching = previous.position.distance(position) <= previous.radius + 1.0;
                if touching && !registry.is_present(previous.handle) {
                    picked_now.push(previous.handle);
                }
            }
        }
        for handle in &picked_now {
            self.remember(*handle, now, config);
        }

        let exclude: Vec<ItemHandle> = self.picked.iter().map(|p| p.handle).collect();
        for kind in EntityType::ALL {
            self.nearest[kind.index()] = registry.nearest_item(kind, position, &exclude);
        }
        picked_now
    }
}
