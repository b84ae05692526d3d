//! Входящие уведомления (engine binding, чат, decision layer) → controllers

use bevy::prelude::*;

use crate::ai::components::Bot;
use crate::ai::resources::{NavigationGraph, SimulationClock};
use crate::bot::BotNotification;
use crate::components::AgentState;

/// System: доставка BotNotification адресату (или всем ботам для broadcast)
pub fn deliver_notifications(
    clock: Res<SimulationClock>,
    graph: Res<NavigationGraph>,
    mut notifications: EventReader<BotNotification>,
    mut bots: Query<(&mut Bot, &AgentState)>,
) {
    for notification in notifications.read() {
        for (mut bot, agent) in bots.iter_mut() {
            if notification.target().is_some_and(|slot| slot != bot.identity().slot) {
                continue;
            }
            match notification {
                BotNotification::KilledEnemy { victim, .. } => bot.killed_enemy(*victim),
                BotNotification::HurtBy { attacker, .. } => bot.hurt_by(*attacker, agent),
                BotNotification::Died { .. } => bot.dead(),
                BotNotification::Respawned { .. } => {
                    bot.respawned(clock.elapsed, agent, graph.0.as_ref());
                }
                BotNotification::PlayerDisconnected { slot } => bot.player_disconnected(*slot),
                BotNotification::GoTo { destination, .. } => bot.set_destination(*destination),
                BotNotification::Say {
                    phrase, team_only, ..
                } => bot.say(*phrase, *team_only),
            }
        }
    }
}
