//! Bot ECS components
//!
//! Entity бота: Bot (controller) + AgentState (пишет engine binding) + BotCommand (читает engine binding)

use std::ops::{Deref, DerefMut};

use bevy::prelude::*;

use crate::bot::BotController;

/// Controller бота как ECS component
#[derive(Component)]
#[require(crate::components::AgentState, crate::components::BotCommand)]
pub struct Bot(pub BotController);

impl Bot {
    pub fn new(controller: BotController) -> Self {
        Self(controller)
    }
}

impl Deref for Bot {
    type Target = BotController;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Bot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
