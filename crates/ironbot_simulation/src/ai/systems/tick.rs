//! Тик ботов: часы → controllers → BotCommand → BotEvent

use bevy::prelude::*;

use crate::ai::components::Bot;
use crate::ai::resources::{ActiveMod, ItemWorld, NavigationGraph, SightTracer, SimulationClock};
use crate::bot::{BotEvent, TickContext};
use crate::components::{AgentState, BotCommand, WorldSnapshot};

/// System: +1 тик симуляционного времени
pub fn advance_clock(mut clock: ResMut<SimulationClock>) {
    clock.advance();
}

/// System: BotController::tick для каждого бота
///
/// Боты независимы, коллабораторы read-only → параллельный обход.
pub fn tick_bots(
    clock: Res<SimulationClock>,
    snapshot: Res<WorldSnapshot>,
    graph: Res<NavigationGraph>,
    items: Res<ItemWorld>,
    rules: Res<ActiveMod>,
    sight: Res<SightTracer>,
    mut bots: Query<(&mut Bot, &AgentState, &mut BotCommand)>,
) {
    let now = clock.elapsed;
    bots.par_iter_mut().for_each(|(mut bot, agent, mut command)| {
        *command = bot.tick(&TickContext {
            now,
            agent,
            world: &snapshot,
            graph: graph.0.as_ref(),
            items: items.0.as_ref(),
            rules: rules.0.as_ref(),
            sight: sight.0.as_ref(),
        });
    });
}

/// System: накопленные за тик события controllers → BotEvent
pub fn publish_bot_events(mut bots: Query<&mut Bot>, mut events: EventWriter<BotEvent>) {
    for mut bot in bots.iter_mut() {
        let slot = bot.identity().slot;
        for kind in bot.drain_events() {
            events.write(BotEvent { bot: slot, kind });
        }
    }
}
