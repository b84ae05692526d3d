//! Headless симуляция IRONBOT
//!
//! Синтетическая карта (сетка waypoints), две команды ботов, 1000 тиков FixedUpdate без рендера.
//! Вместо engine binding — наивная интеграция: position += direction * speed * dt.

use bevy::prelude::*;
use rand::Rng;

use ironbot_simulation::ai::systems::publish_bot_events;
use ironbot_simulation::world::MemoryGraph;
use ironbot_simulation::{
    create_headless_app, log_info, log_warning, spawn_bot, AgentState, Bot, BotCommand, BotEvent, BotEventKind,
    BotIdentity, BotNotification, DeterministicRng, Intelligence, NavigationGraph, PathFlags, PlayerInfo,
    PlayerSlot, SimulationClock, WaypointFlags, WaypointId, WorldSnapshot,
};

const GRID: u32 = 6;
const SPACING: f32 = 8.0;
const BOTS_PER_TEAM: u8 = 2;
const TICKS: u32 = 1000;

/// Сетка GRID×GRID, соседи по 4 направлениям
fn build_grid() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    for row in 0..GRID {
        for col in 0..GRID {
            graph.add_waypoint(
                Vec3::new(col as f32 * SPACING, 0.0, row as f32 * SPACING),
                WaypointFlags::NONE,
            );
        }
    }
    for row in 0..GRID {
        for col in 0..GRID {
            let id = WaypointId(row * GRID + col);
            if col + 1 < GRID {
                graph.connect_both(id, WaypointId(row * GRID + col + 1), PathFlags::NONE);
            }
            if row + 1 < GRID {
                graph.connect_both(id, WaypointId((row + 1) * GRID + col), PathFlags::NONE);
            }
        }
    }
    graph
}

/// Тела двигаются по BotCommand, snapshot мира синхронизируется
fn integrate_bodies(
    clock: Res<SimulationClock>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut bodies: Query<(&Bot, &mut AgentState, &BotCommand)>,
) {
    for (bot, mut agent, command) in bodies.iter_mut() {
        agent.position += command.move_direction * command.speed * clock.step;

        let identity = bot.identity();
        let mut info = PlayerInfo::new(identity.slot, identity.team, agent.position);
        info.name = identity.name.clone();
        info.health = agent.health;
        info.alive = agent.alive;
        snapshot.upsert(info);
    }
}

/// Decision layer-заглушка: новая случайная цель после прибытия или отказа
fn pick_destinations(
    mut events: EventReader<BotEvent>,
    mut notifications: EventWriter<BotNotification>,
    mut rng: ResMut<DeterministicRng>,
) {
    for event in events.read() {
        match &event.kind {
            BotEventKind::ArrivedAtDestination(_) => {}
            BotEventKind::MoveFailure(failure) => {
                log_warning(&format!("bot {} move failure: {}", event.bot, failure));
            }
            _ => continue,
        }
        let destination = WaypointId(rng.rng.gen_range(0..GRID * GRID));
        notifications.write(BotNotification::GoTo {
            bot: event.bot,
            destination,
        });
    }
}

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    log_info(&format!("Starting IRONBOT headless simulation (seed: {})", seed));

    app.insert_resource(NavigationGraph(Box::new(build_grid())))
        .add_systems(
            FixedUpdate,
            (integrate_bodies, pick_destinations)
                .chain()
                .after(publish_bot_events),
        );

    // Команда 1 в левом нижнем углу, команда 2 в правом верхнем
    let far = (GRID - 1) as f32 * SPACING;
    for i in 0..BOTS_PER_TEAM {
        for (team, origin) in [(1u8, Vec3::ZERO), (2u8, Vec3::new(far, 0.0, far))] {
            let slot = PlayerSlot((team - 1) * BOTS_PER_TEAM + i);
            let offset = Vec3::new(i as f32 * SPACING, 0.0, 0.0) * if team == 1 { 1.0 } else { -1.0 };
            let identity = BotIdentity::new(slot, format!("bot{}", slot.0), Intelligence::Normal).with_team(team);
            spawn_bot(app.world_mut(), identity, AgentState::at(origin + offset));
        }
    }

    // Стартовые цели: каждый бот идёт в угол соперника
    for slot in 0..BOTS_PER_TEAM * 2 {
        let destination = if slot < BOTS_PER_TEAM {
            WaypointId(GRID * GRID - 1)
        } else {
            WaypointId(0)
        };
        app.world_mut().send_event(BotNotification::GoTo {
            bot: PlayerSlot(slot),
            destination,
        });
    }

    for tick in 0..TICKS {
        app.world_mut().run_schedule(FixedUpdate);

        if tick % 100 == 0 {
            let world = app.world_mut();
            let mut bots = world.query::<(&Bot, &AgentState, &BotCommand)>();
            for (bot, agent, command) in bots.iter(world) {
                log_info(&format!(
                    "Tick {}: {} at {:.1?} state {:?} buttons {}",
                    tick,
                    bot.identity().name,
                    agent.position,
                    bot.movement().state(),
                    command.buttons
                ));
            }
        }
    }

    log_info("Simulation complete!");
}
