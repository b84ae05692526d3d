//! Bot ECS resources: часы симуляции, общий конфиг, коллабораторы
//!
//! Коллабораторы — boxed trait objects (engine binding подставляет свои).
//! Default — in-memory реализации (пустой граф, пустой реестр, deathmatch, открытая карта).

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::BotConfig;
use crate::mods::DeathmatchRules;
use crate::world::{ItemRegistry, LineOfSight, MemoryGraph, MemoryItems, ModRules, OpenSight, WaypointGraph};

/// Симуляционное время (детерминистичное, не wall clock)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    pub tick: u64,
    /// Секунды с начала симуляции
    pub elapsed: f32,
    /// Шаг одного FixedUpdate тика
    pub step: f32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::with_hz(60.0)
    }
}

impl SimulationClock {
    pub fn with_hz(hz: f32) -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            step: 1.0 / hz.max(1.0),
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed = self.tick as f32 * self.step;
    }
}

/// BotConfig, общий для всех controllers
#[derive(Resource, Debug, Clone, Default)]
pub struct SharedBotConfig(pub Arc<BotConfig>);

impl SharedBotConfig {
    pub fn new(config: BotConfig) -> Self {
        Self(Arc::new(config))
    }
}

#[derive(Resource)]
pub struct NavigationGraph(pub Box<dyn WaypointGraph>);

impl Default for NavigationGraph {
    fn default() -> Self {
        Self(Box::new(MemoryGraph::new()))
    }
}

#[derive(Resource)]
pub struct ItemWorld(pub Box<dyn ItemRegistry>);

impl Default for ItemWorld {
    fn default() -> Self {
        Self(Box::new(MemoryItems::new()))
    }
}

/// Правила активного мода
#[derive(Resource)]
pub struct ActiveMod(pub Box<dyn ModRules>);

impl Default for ActiveMod {
    fn default() -> Self {
        Self(Box::new(DeathmatchRules))
    }
}

#[derive(Resource)]
pub struct SightTracer(pub Box<dyn LineOfSight>);

impl Default for SightTracer {
    fn default() -> Self {
        Self(Box::new(OpenSight))
    }
}
