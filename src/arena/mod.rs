//! Headless side-view arena
//!
//! A small deterministic combat simulation for training runs and tests. The
//! agent and its enemies move along one horizontal line; ranged enemies fire
//! projectiles that travel toward the agent. Rewards accumulate per frame and
//! are drained by [`CombatWorld::take_outcome`].

use crate::{
    context::CombatAction,
    decision::{CombatSnapshot, CombatWorld, TickOutcome},
    encoder::{AgentVitals, EnemyKind, EnemyView, Point, TerrainHints},
};

pub const ARENA_WIDTH: f64 = 800.0;
pub const GROUND_Y: f64 = 450.0;
/// Frames before an unfinished floor counts as lost.
pub const FLOOR_TIME_LIMIT: u32 = 60 * 60;

pub const ATTACK_RANGE: f64 = 50.0;
pub const ATTACK_COOLDOWN_FRAMES: u32 = 30;

pub const AGENT_MAX_HP: f64 = 100.0;
pub const AGENT_MAX_STAMINA: f64 = 100.0;
pub const AGENT_SPEED: f64 = 3.0;
pub const AGENT_CHARGE_SPEED: f64 = 6.0;
pub const AGENT_DAMAGE: f64 = 10.0;
const CHARGE_STAMINA_COST: f64 = 1.0;
const STAMINA_REGEN: f64 = 0.5;

pub const MELEE_HP: f64 = 30.0;
pub const MELEE_DAMAGE: f64 = 10.0;
pub const MELEE_SPEED: f64 = 2.0;

pub const RANGED_HP: f64 = 20.0;
pub const RANGED_DAMAGE: f64 = 6.0;
pub const RANGED_SPEED: f64 = 1.5;
pub const RANGED_RETREAT_SPEED: f64 = 0.8;
pub const RANGED_PREFERRED_DISTANCE: f64 = 150.0;
const RANGED_FIRE_INTERVAL: u32 = 90;
const RANGED_SIGHT: f64 = 400.0;

pub const PROJECTILE_SPEED: f64 = 4.0;
const PROJECTILE_HIT_RADIUS: f64 = 10.0;

const HAZARD_RADIUS: f64 = 15.0;
const HAZARD_DAMAGE: f64 = 1.0;

pub const REWARD_DAMAGE_DEALT: f64 = 5.0;
pub const REWARD_ENEMY_DEFEATED: f64 = 50.0;
pub const REWARD_FLOOR_CLEARED: f64 = 100.0;
pub const REWARD_DAMAGE_TAKEN: f64 = -3.0;
pub const REWARD_DEATH: f64 = -100.0;

#[derive(Debug, Clone, PartialEq)]
struct Enemy {
    kind: EnemyKind,
    x: f64,
    hp: f64,
    cooldown: u32,
}

impl Enemy {
    fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    fn damage(&self) -> f64 {
        match self.kind {
            EnemyKind::Melee => MELEE_DAMAGE,
            EnemyKind::Ranged => RANGED_DAMAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projectile {
    x: f64,
    direction: f64,
    damage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    floor: u32,
    agent_x: f64,
    hp: f64,
    stamina: f64,
    attack_cooldown: u32,
    action: Option<CombatAction>,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    hazard_x: Option<f64>,
    frame: u32,
    pending_reward: f64,
    pending_damage: f64,
    terminal_reported: bool,
}

impl Arena {
    /// Build the arena for a floor; deeper floors field more and tougher enemies.
    pub fn for_floor(floor: u32) -> Self {
        let floor = floor.max(1);
        let depth = floor - 1;
        let melee = 1 + depth / 3;
        let ranged = 1 + depth / 4;
        let toughness = 1.0 + 0.1 * f64::from(depth);

        let mut enemies = Vec::new();
        let mut x = ARENA_WIDTH * 0.7;
        for _ in 0..melee {
            enemies.push(Enemy {
                kind: EnemyKind::Melee,
                x,
                hp: MELEE_HP * toughness,
                cooldown: 0,
            });
            x += 30.0;
        }
        let mut x = ARENA_WIDTH * 0.85;
        for i in 0..ranged {
            enemies.push(Enemy {
                kind: EnemyKind::Ranged,
                x,
                hp: RANGED_HP * toughness,
                cooldown: RANGED_FIRE_INTERVAL / 2 + 10 * i,
            });
            x += 25.0;
        }

        Self {
            floor,
            agent_x: ARENA_WIDTH * 0.125,
            hp: AGENT_MAX_HP,
            stamina: AGENT_MAX_STAMINA,
            attack_cooldown: 0,
            action: None,
            enemies,
            projectiles: Vec::new(),
            hazard_x: (floor % 3 == 0).then_some(ARENA_WIDTH * 0.45),
            frame: 0,
            pending_reward: 0.0,
            pending_damage: 0.0,
            terminal_reported: false,
        }
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn agent_hp(&self) -> f64 {
        self.hp
    }

    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|enemy| enemy.is_alive()).count()
    }

    pub fn is_cleared(&self) -> bool {
        self.living_enemies() == 0
    }

    pub fn agent_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn timed_out(&self) -> bool {
        self.frame >= FLOOR_TIME_LIMIT
    }

    pub fn is_done(&self) -> bool {
        self.is_cleared() || self.agent_dead() || self.timed_out()
    }

    /// Advance the simulation by one frame.
    pub fn step(&mut self) {
        if self.is_done() {
            return;
        }
        self.frame += 1;
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);

        self.step_agent();
        self.step_enemies();
        self.step_projectiles();
        self.step_hazard();
    }

    fn nearest_enemy(&self) -> Option<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_alive())
            .min_by(|(_, a), (_, b)| {
                (a.x - self.agent_x)
                    .abs()
                    .total_cmp(&(b.x - self.agent_x).abs())
            })
            .map(|(index, _)| index)
    }

    fn step_agent(&mut self) {
        let Some(target) = self.nearest_enemy() else {
            return;
        };
        let offset = self.enemies[target].x - self.agent_x;
        let direction = offset.signum();
        let distance = offset.abs();

        let charging = self.action == Some(CombatAction::Charge) && self.stamina >= CHARGE_STAMINA_COST;
        match self.action {
            Some(CombatAction::Attack | CombatAction::Charge) => {
                if distance > ATTACK_RANGE {
                    let speed = if charging { AGENT_CHARGE_SPEED } else { AGENT_SPEED };
                    self.move_agent(direction * speed.min(distance - ATTACK_RANGE + 1.0));
                } else if self.attack_cooldown == 0 {
                    self.strike(target);
                }
            }
            Some(CombatAction::Run) => self.move_agent(-direction * AGENT_SPEED),
            None => {}
        }

        if charging && distance > ATTACK_RANGE {
            self.stamina -= CHARGE_STAMINA_COST;
        } else {
            self.stamina = (self.stamina + STAMINA_REGEN).min(AGENT_MAX_STAMINA);
        }
    }

    fn move_agent(&mut self, dx: f64) {
        self.agent_x = (self.agent_x + dx).clamp(0.0, ARENA_WIDTH);
    }

    fn strike(&mut self, target: usize) {
        self.attack_cooldown = ATTACK_COOLDOWN_FRAMES;
        let enemy = &mut self.enemies[target];
        let dealt = AGENT_DAMAGE.min(enemy.hp);
        if dealt <= 0.0 {
            return;
        }
        enemy.hp -= dealt;
        self.pending_reward += REWARD_DAMAGE_DEALT;
        if !enemy.is_alive() {
            self.pending_reward += REWARD_ENEMY_DEFEATED;
        }
    }

    fn step_enemies(&mut self) {
        let agent_x = self.agent_x;
        let mut incoming = 0.0;

        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            enemy.cooldown = enemy.cooldown.saturating_sub(1);
            let offset = agent_x - enemy.x;
            let direction = offset.signum();
            let distance = offset.abs();

            match enemy.kind {
                EnemyKind::Melee => {
                    if distance > ATTACK_RANGE {
                        enemy.x += direction * MELEE_SPEED.min(distance - ATTACK_RANGE + 1.0);
                    } else if enemy.cooldown == 0 {
                        enemy.cooldown = ATTACK_COOLDOWN_FRAMES;
                        incoming += enemy.damage();
                    }
                }
                EnemyKind::Ranged => {
                    if distance < RANGED_PREFERRED_DISTANCE - 20.0 {
                        enemy.x -= direction * RANGED_RETREAT_SPEED;
                    } else if distance > RANGED_PREFERRED_DISTANCE + 20.0 {
                        enemy.x += direction * RANGED_SPEED;
                    }
                    enemy.x = enemy.x.clamp(0.0, ARENA_WIDTH);
                    if distance <= RANGED_SIGHT && enemy.cooldown == 0 {
                        enemy.cooldown = RANGED_FIRE_INTERVAL;
                        self.projectiles.push(Projectile {
                            x: enemy.x,
                            direction,
                            damage: enemy.damage(),
                        });
                    }
                }
            }
        }

        if incoming > 0.0 {
            self.hurt(incoming);
        }
    }

    fn step_projectiles(&mut self) {
        let mut hits = 0.0;
        let agent_x = self.agent_x;
        self.projectiles.retain_mut(|projectile| {
            projectile.x += projectile.direction * PROJECTILE_SPEED;
            if (projectile.x - agent_x).abs() <= PROJECTILE_HIT_RADIUS {
                hits += projectile.damage;
                return false;
            }
            (0.0..=ARENA_WIDTH).contains(&projectile.x)
        });
        if hits > 0.0 {
            self.hurt(hits);
        }
    }

    fn step_hazard(&mut self) {
        if self
            .hazard_x
            .is_some_and(|hazard| (hazard - self.agent_x).abs() <= HAZARD_RADIUS)
        {
            self.hurt(HAZARD_DAMAGE);
        }
    }

    fn hurt(&mut self, amount: f64) {
        if self.agent_dead() {
            return;
        }
        let taken = amount.min(self.hp);
        self.hp -= taken;
        self.pending_damage += taken;
        self.pending_reward += REWARD_DAMAGE_TAKEN;
    }
}

impl CombatWorld for Arena {
    fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            vitals: AgentVitals::new(self.hp, AGENT_MAX_HP, Point::new(self.agent_x, GROUND_Y))
                .with_stamina(self.stamina, AGENT_MAX_STAMINA),
            enemies: self
                .enemies
                .iter()
                .map(|enemy| EnemyView::new(enemy.kind, Point::new(enemy.x, GROUND_Y), enemy.hp))
                .collect(),
            terrain: Some(TerrainHints {
                hazard_distance: self.hazard_x.map(|hazard| (hazard - self.agent_x).abs()),
            }),
        }
    }

    fn take_outcome(&mut self) -> TickOutcome {
        let mut reward = std::mem::take(&mut self.pending_reward);
        let damage_taken = std::mem::take(&mut self.pending_damage);
        let done = self.is_done();

        if done && !self.terminal_reported {
            self.terminal_reported = true;
            if self.is_cleared() {
                reward += REWARD_FLOOR_CLEARED;
            }
            if self.agent_dead() {
                reward += REWARD_DEATH;
            }
        }

        TickOutcome {
            reward,
            done,
            damage_taken,
        }
    }

    fn execute(&mut self, action: CombatAction) {
        self.action = Some(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(arena: &mut Arena, action: CombatAction, frames: u32) {
        arena.execute(action);
        for _ in 0..frames {
            arena.step();
        }
    }

    #[test]
    fn test_roster_grows_with_floor() {
        assert_eq!(Arena::for_floor(1).living_enemies(), 2);
        assert_eq!(Arena::for_floor(4).living_enemies(), 3);
        assert!(Arena::for_floor(10).living_enemies() > Arena::for_floor(4).living_enemies());
    }

    #[test]
    fn test_attack_closes_distance_and_hits() {
        let mut arena = Arena::for_floor(1);
        run(&mut arena, CombatAction::Attack, 200);
        assert!(arena.agent_x > ARENA_WIDTH * 0.125);
        assert!(arena.enemies.iter().any(|enemy| enemy.hp < MELEE_HP));
    }

    #[test]
    fn test_running_keeps_distance() {
        let mut arena = Arena::for_floor(1);
        let start = arena.agent_x;
        run(&mut arena, CombatAction::Run, 30);
        assert!(arena.agent_x <= start);
    }

    #[test]
    fn test_charge_spends_stamina() {
        let mut arena = Arena::for_floor(1);
        run(&mut arena, CombatAction::Charge, 20);
        assert!(arena.stamina < AGENT_MAX_STAMINA);
    }

    #[test]
    fn test_terminal_bonus_reported_once() {
        let mut arena = Arena::for_floor(1);
        for enemy in &mut arena.enemies {
            enemy.hp = 0.0;
        }
        let first = arena.take_outcome();
        assert!(first.done);
        assert_eq!(first.reward, REWARD_FLOOR_CLEARED);
        let second = arena.take_outcome();
        assert_eq!(second.reward, 0.0);
    }

    #[test]
    fn test_death_penalty() {
        let mut arena = Arena::for_floor(1);
        arena.hurt(AGENT_MAX_HP);
        let outcome = arena.take_outcome();
        assert!(arena.agent_dead());
        assert!(outcome.done);
        assert_eq!(outcome.reward, REWARD_DAMAGE_TAKEN + REWARD_DEATH);
        assert_eq!(outcome.damage_taken, AGENT_MAX_HP);
    }

    #[test]
    fn test_idle_agent_eventually_loses() {
        let mut arena = Arena::for_floor(1);
        while !arena.is_done() {
            arena.step();
        }
        assert!(arena.agent_dead() || arena.timed_out());
        assert!(!arena.is_cleared());
    }
}
