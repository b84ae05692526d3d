//! Bot ECS integration
//!
//! Controllers живут в Bot component, коллабораторы — resources.
//! Engine binding пишет AgentState + WorldSnapshot перед FixedUpdate и читает BotCommand после.

use bevy::prelude::*;

pub mod components;
pub mod resources;
pub mod systems;

// Re-export основных типов
pub use components::Bot;
pub use resources::{ActiveMod, ItemWorld, NavigationGraph, SharedBotConfig, SightTracer, SimulationClock};

use crate::bot::{BotController, BotEvent, BotNotification};
use crate::components::{AgentState, BotCommand, BotIdentity, WorldSnapshot};
use crate::world::MemoryPathSearch;

/// Bot Plugin
///
/// Регистрирует системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. advance_clock — SimulationClock +1 тик
/// 2. deliver_notifications — BotNotification → controllers
/// 3. tick_bots — BotController::tick → BotCommand
/// 4. publish_bot_events — события controllers → BotEvent
pub struct BotPlugin;

impl Plugin for BotPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BotEvent>()
            .add_event::<BotNotification>()
            .init_resource::<SimulationClock>()
            .init_resource::<SharedBotConfig>()
            .init_resource::<WorldSnapshot>()
            .init_resource::<NavigationGraph>()
            .init_resource::<ItemWorld>()
            .init_resource::<ActiveMod>()
            .init_resource::<SightTracer>()
            .add_systems(
                FixedUpdate,
                (
                    systems::advance_clock,
                    systems::deliver_notifications,
                    systems::tick_bots,
                    systems::publish_bot_events,
                )
                    .chain(), // Последовательное выполнение для детерминизма
            );
    }
}

/// Spawn бота: controller с общим конфигом, current = ближайший waypoint
pub fn spawn_bot(world: &mut World, identity: BotIdentity, agent: AgentState) -> Entity {
    let config = world.get_resource::<SharedBotConfig>().cloned().unwrap_or_default();
    let now = world.get_resource::<SimulationClock>().map_or(0.0, |clock| clock.elapsed);

    let mut controller = BotController::new(identity, config.0, Box::new(MemoryPathSearch::default()));
    if let Some(graph) = world.get_resource::<NavigationGraph>() {
        controller.respawned(now, &agent, graph.0.as_ref());
    }
    world.spawn((Bot::new(controller), agent, BotCommand::default())).id()
}
