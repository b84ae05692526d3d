//! IRONBOT Simulation Core
//!
//! Per-tick control loop ботов на Bevy 0.16 ECS.
//!
//! Разделение слоёв:
//! - decision layer (моды, скрипты) — выбирает цели, кладёт actions в очередь
//! - bot core (этот crate) — очередь, движение, прицел, застревание, бой → BotCommand
//! - engine binding — пишет AgentState/WorldSnapshot, исполняет BotCommand

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod bot;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod mods;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{spawn_bot, ActiveMod, Bot, BotPlugin, ItemWorld, NavigationGraph, SharedBotConfig, SightTracer, SimulationClock};
pub use bot::{
    ActionArgument, ActionKind, AtomicAction, BotController, BotEvent, BotEventKind, BotNotification, ChatPhrase,
    MoveFailure, TickContext, TimeWindow, ACTION_QUEUE_CAPACITY,
};
pub use components::*;
pub use config::BotConfig;
pub use error::{BotError, Result};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};

/// Главный plugin симуляции
pub struct IronbotPlugin;

impl Plugin for IronbotPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для тика ботов
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .add_plugins(BotPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// BotConfig.seed берётся из того же seed (side-step направления воспроизводимы).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)) // 60Hz FixedUpdate
        .insert_resource(SharedBotConfig::new(BotConfig {
            seed,
            ..BotConfig::default()
        }))
        .add_plugins(BotPlugin);

    app
}

/// Snapshot компонентов для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Debug-формат как байты (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
