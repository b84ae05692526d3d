//! Tests for CombatSelector.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::arsenal::{Arsenal, WeaponSlot};
    use super::super::combat::{CombatContext, CombatSelector, Engagement, TargetChange};
    use crate::components::{
        AgentState, BotIdentity, Buttons, Intelligence, LookAngles, PlayerInfo, PlayerSlot,
        WeaponKind, WorldSnapshot,
    };
    use crate::config::CombatConfig;
    use crate::mods::DeathmatchRules;
    use crate::world::{BoxOccluders, LineOfSight, OpenSight};

    const ME: PlayerSlot = PlayerSlot(0);

    fn me(intelligence: Intelligence) -> BotIdentity {
        BotIdentity::new(ME, "bot", intelligence)
    }

    fn arsenal() -> Arsenal {
        let mut arsenal = Arsenal::new();
        arsenal.add(WeaponSlot::new("crowbar", WeaponKind::Manual, 0, (0.0, 2.0)));
        arsenal.add(WeaponSlot::new("shotgun", WeaponKind::Shotgun, 5, (0.0, 10.0)).with_ammo(6, 6, 12));
        arsenal.add(WeaponSlot::new("smg", WeaponKind::Rifle, 4, (0.0, 40.0)).with_ammo(30, 30, 90));
        arsenal
    }

    fn world(enemies: &[(u8, Vec3)]) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::default();
        snapshot.upsert(PlayerInfo::new(ME, 0, Vec3::ZERO));
        for (slot, position) in enemies {
            snapshot.upsert(PlayerInfo::new(PlayerSlot(*slot), 0, *position));
        }
        snapshot
    }

    fn context<'a>(
        now: f32,
        bot: &'a BotIdentity,
        agent: &'a AgentState,
        world: &'a WorldSnapshot,
        sight: &'a dyn LineOfSight,
        config: &'a CombatConfig,
    ) -> CombatContext<'a> {
        CombatContext {
            now,
            bot,
            agent,
            look: LookAngles::default(),
            world,
            rules: &DeathmatchRules,
            sight,
            config,
        }
    }

    #[test]
    fn test_closer_enemy_switches_same_tick_with_single_weapon_evaluation() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();

        let far = world(&[(1, Vec3::new(20.0, 0.0, 0.0))]);
        let update = combat.tick(&context(0.0, &bot, &agent, &far, &OpenSight, &config), &mut arsenal);
        assert_eq!(
            update.change,
            Some(TargetChange {
                from: None,
                to: Some(PlayerSlot(1)),
            })
        );
        assert_eq!(update.weapon_select, Some(2));
        assert_eq!(combat.weapon_evaluations(), 1);

        // Второй враг ближе — переключаемся на том же тике
        let both = world(&[(1, Vec3::new(20.0, 0.0, 0.0)), (2, Vec3::new(5.0, 0.0, 1.0))]);
        let update = combat.tick(&context(0.1, &bot, &agent, &both, &OpenSight, &config), &mut arsenal);
        assert_eq!(
            update.change,
            Some(TargetChange {
                from: Some(PlayerSlot(1)),
                to: Some(PlayerSlot(2)),
            })
        );
        assert_eq!(update.weapon_select, Some(1));
        assert_eq!(combat.weapon_evaluations(), 2);
        assert_eq!(combat.target().map(|t| t.slot), Some(PlayerSlot(2)));

        // Та же цель — без переоценки
        for i in 2..10 {
            let update = combat.tick(&context(i as f32 * 0.1, &bot, &agent, &both, &OpenSight, &config), &mut arsenal);
            assert_eq!(update.change, None);
            assert_eq!(update.weapon_select, None);
        }
        assert_eq!(combat.weapon_evaluations(), 2);
    }

    #[test]
    fn test_seen_and_known_stay_disjoint() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(10.0, 0.0, 0.0)), (2, Vec3::new(15.0, 0.0, 2.0))]);

        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);
        assert!(combat.seen().contains(PlayerSlot(1)));
        assert!(combat.seen().contains(PlayerSlot(2)));

        // Стена перед всеми
        let mut wall = BoxOccluders::new();
        wall.add_box(Vec3::new(3.0, -5.0, -5.0), Vec3::new(4.0, 5.0, 5.0));
        combat.tick(&context(0.1, &bot, &agent, &snapshot, &wall, &config), &mut arsenal);

        assert!(combat.seen().is_empty());
        assert!(combat.known().contains(PlayerSlot(1)));
        assert!(combat.known().contains(PlayerSlot(2)));
        assert!(combat.seen().is_disjoint(&combat.known()));
        assert!(!combat.is_engaging());
    }

    #[test]
    fn test_enemy_behind_is_not_visible() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(-10.0, 0.0, 0.0))]);

        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);
        assert!(combat.target().is_none());
        assert_eq!(combat.engagement(), Engagement::None);
    }

    #[test]
    fn test_lost_target_kept_for_grace_then_cleared() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(10.0, 0.0, 0.0))]);
        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);

        let mut wall = BoxOccluders::new();
        wall.add_box(Vec3::new(3.0, -5.0, -5.0), Vec3::new(4.0, 5.0, 5.0));

        let update = combat.tick(&context(1.0, &bot, &agent, &snapshot, &wall, &config), &mut arsenal);
        assert_eq!(update.change, None);
        let target = combat.target().expect("last known position kept");
        assert!(!target.visible);
        assert_eq!(target.position, Vec3::new(10.0, 0.0, 0.0));

        let update = combat.tick(&context(3.5, &bot, &agent, &snapshot, &wall, &config), &mut arsenal);
        assert_eq!(
            update.change,
            Some(TargetChange {
                from: Some(PlayerSlot(1)),
                to: None,
            })
        );
        assert!(combat.target().is_none());
    }

    #[test]
    fn test_engagement_close_range_stops_and_far_strafes() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();

        let mut combat = CombatSelector::new();
        let close = world(&[(1, Vec3::new(3.0, 0.0, 0.0))]);
        combat.tick(&context(0.0, &bot, &agent, &close, &OpenSight, &config), &mut arsenal);
        assert_eq!(combat.engagement(), Engagement::StopAndShoot);
        assert_eq!(combat.steer(0.0, Vec3::ZERO, &config), Some(Vec3::ZERO));

        let mut combat = CombatSelector::new();
        let far = world(&[(1, Vec3::new(25.0, 0.0, 0.0))]);
        combat.tick(&context(0.0, &bot, &agent, &far, &OpenSight, &config), &mut arsenal);
        assert_eq!(combat.engagement(), Engagement::StrafeAndShoot);
        let strafe = combat.steer(0.0, Vec3::ZERO, &config).unwrap();
        assert!(strafe.dot(Vec3::X).abs() < 1e-5);
    }

    #[test]
    fn test_low_health_hurt_flees_and_stops_shooting() {
        let bot = me(Intelligence::Pro);
        let mut agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(10.0, 0.0, 0.0))]);

        agent.health = 10;
        combat.hurt_by(PlayerSlot(1), &agent, &config);
        assert!(combat.is_under_attack());
        assert!(combat.is_fleeing());
        assert!(combat.known().contains(PlayerSlot(1)));

        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);
        assert_eq!(combat.engagement(), Engagement::Flee);
        let away = combat.steer(0.0, Vec3::ZERO, &config).unwrap();
        assert!(away.x < -0.99);
        assert_eq!(combat.fire_buttons(bot.intelligence, true, &mut arsenal), Buttons::NONE);

        // Подобрали аптечку — больше не бежим
        agent.health = 80;
        combat.on_health_restored(&agent, &config);
        assert!(!combat.is_fleeing());
        assert!(!combat.dont_attack());
    }

    #[test]
    fn test_fire_buttons_reload_and_attack_duck() {
        let bot = me(Intelligence::Pro);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(3.0, 0.0, 0.0))]);
        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);
        assert_eq!(arsenal.current(), Some(1));

        // Aim ещё не довёлся — не стреляем
        assert_eq!(combat.fire_buttons(bot.intelligence, false, &mut arsenal), Buttons::NONE);

        let buttons = combat.fire_buttons(bot.intelligence, true, &mut arsenal);
        assert!(buttons.is_pressed(Buttons::ATTACK | Buttons::DUCK));

        arsenal.set_ammo(1, 0, 12).unwrap();
        assert_eq!(combat.fire_buttons(bot.intelligence, true, &mut arsenal), Buttons::RELOAD);
    }

    #[test]
    fn test_head_shots_only_for_smart_tiers() {
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let snapshot = world(&[(1, Vec3::new(10.0, 0.0, 0.0))]);
        let enemy = snapshot.player(PlayerSlot(1)).unwrap().clone();

        for (intelligence, head) in [(Intelligence::Normal, false), (Intelligence::Smart, true)] {
            let bot = me(intelligence);
            let mut arsenal = arsenal();
            let mut combat = CombatSelector::new();
            combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);
            assert_eq!(combat.target().unwrap().aim_point, enemy.aim_point(head));
        }
    }

    #[test]
    fn test_forget_killed_target() {
        let bot = me(Intelligence::Normal);
        let agent = AgentState::default();
        let config = CombatConfig::default();
        let mut arsenal = arsenal();
        let mut combat = CombatSelector::new();
        let snapshot = world(&[(1, Vec3::new(10.0, 0.0, 0.0))]);
        combat.tick(&context(0.0, &bot, &agent, &snapshot, &OpenSight, &config), &mut arsenal);

        let change = combat.forget(PlayerSlot(1));
        assert_eq!(
            change,
            Some(TargetChange {
                from: Some(PlayerSlot(1)),
                to: None,
            })
        );
        assert!(combat.seen().is_empty());
    }
}
