//! All code relating to individual knight states lives behind this module
//! and enforces unrepresentable states: a transition can only be reached
//! through the methods provided here.
//! - PUBLIC  : KnightState and KnightContext are public
//! - PRIVATE : internal members are private

use crate::actor::{Animation, Facing, Stats};
use crate::engine::{Point, Size};

// movement consts
pub(crate) const SPEED: i16 = 5;
pub(crate) const SPAWN: Point = Point { x: 60, y: 530 };
// per-axis hard bounds; a step that would cross one is skipped
pub(crate) const MIN_X: i16 = 50;
pub(crate) const MAX_X: i16 = 1145;
pub(crate) const MIN_Y: i16 = 70;
pub(crate) const MAX_Y: i16 = 530;

// combat consts
pub(crate) const MAX_HEALTH: i16 = 100;
pub(crate) const DAMAGE: i16 = 20;
pub(crate) const ARMOR: i16 = 30;
pub(crate) const ATTACK_INTERVAL_MS: f64 = 950.0;

// the attack animation swells the sprite; leaving the state restores it
pub(crate) const SPRITE_SIZE: Size = Size {
    width: 150,
    height: 150,
};
pub(crate) const ATTACK_SPRITE_SIZE: Size = Size {
    width: 175,
    height: 175,
};

#[derive(Debug, Copy, Clone)]
pub struct Standing;

#[derive(Debug, Copy, Clone)]
pub struct Moving;

#[derive(Debug, Copy, Clone)]
pub struct Attacking;

#[derive(Debug, Copy, Clone)]
pub struct Blocking;

#[derive(Debug, Copy, Clone)]
pub struct Dying;

impl Animation for Standing {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "knight_standing";
}

impl Animation for Moving {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "knight_walking";
}

impl Animation for Attacking {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "knight_attacking";
}

impl Animation for Blocking {
    const FRAMES: u8 = 2;
    const PREFIX: &'static str = "knight_blocking";
}

impl Animation for Dying {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "knight_dying";
}

/// The movement keys held this tick.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub up: bool,
    pub left: bool,
    pub down: bool,
    pub right: bool,
}

impl MoveIntent {
    pub fn any(&self) -> bool {
        self.up || self.left || self.down || self.right
    }
}

/// Outcome of taking a hit: either the knight survives in the same state,
/// or drops into the terminal Dying state.
pub enum IsStruck<S> {
    Survived(KnightState<S>),
    Slain(KnightState<Dying>),
}

#[derive(Debug, Copy, Clone)]
pub struct KnightState<S> {
    context: KnightContext,
    // _state is used for type-level tracking (phantom type)
    // - its only purpose is to differentiate between states at compile
    // time, preventing invalid state transitions
    _state: S,
}

/// generic methods shared between all states
impl<S> KnightState<S> {
    pub fn context(&self) -> &KnightContext {
        &self.context
    }

    /// Applies armor-reduced damage. A knight at zero health is slain;
    /// any attack scaling is restored before the terminal animation.
    pub fn hit(self, raw: i16) -> IsStruck<S> {
        let mut context = self.context;
        context.stats.take_damage(raw);
        if context.stats.is_alive() {
            IsStruck::Survived(KnightState { context, _state: self._state })
        } else {
            IsStruck::Slain(KnightState {
                context: context
                    .on_state_transition()
                    .with_sprite_size(SPRITE_SIZE),
                _state: Dying,
            })
        }
    }
}

impl KnightState<Standing> {
    pub fn new() -> Self {
        KnightState {
            context: KnightContext {
                frame: 0,
                position: SPAWN,
                facing: Facing::Right,
                stats: Stats::new(MAX_HEALTH, DAMAGE, ARMOR),
                sprite_size: SPRITE_SIZE,
                last_attack: 0.0,
            },
            _state: Standing,
        }
    }

    pub fn update(mut self) -> Self {
        self.context = self.context.update(Standing::total_ticks());
        self
    }

    pub fn walk(self, intent: MoveIntent) -> KnightState<Moving> {
        KnightState {
            context: self.context.on_state_transition().walk(intent),
            _state: Moving,
        }
    }

    pub fn attack(self, now: f64) -> KnightState<Attacking> {
        KnightState {
            context: self
                .context
                .on_state_transition()
                .stamp_attack(now)
                .with_sprite_size(ATTACK_SPRITE_SIZE),
            _state: Attacking,
        }
    }

    pub fn block(self) -> KnightState<Blocking> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Blocking,
        }
    }
}

impl KnightState<Moving> {
    pub fn step(mut self, intent: MoveIntent) -> Self {
        self.context = self.context.walk(intent).update(Moving::total_ticks());
        self
    }

    pub fn stand(self) -> KnightState<Standing> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Standing,
        }
    }

    pub fn attack(self, now: f64) -> KnightState<Attacking> {
        KnightState {
            context: self
                .context
                .on_state_transition()
                .stamp_attack(now)
                .with_sprite_size(ATTACK_SPRITE_SIZE),
            _state: Attacking,
        }
    }

    pub fn block(self) -> KnightState<Blocking> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Blocking,
        }
    }
}

impl KnightState<Attacking> {
    pub fn update(mut self) -> Self {
        self.context = self.context.update(Attacking::total_ticks());
        self
    }

    /// Another swing lands once per interval while the key stays held.
    pub fn attack_due(&self, now: f64) -> bool {
        now - self.context.last_attack >= ATTACK_INTERVAL_MS
    }

    pub fn mark_attack(mut self, now: f64) -> Self {
        self.context = self.context.stamp_attack(now);
        self
    }

    pub fn stand(self) -> KnightState<Standing> {
        KnightState {
            context: self
                .context
                .on_state_transition()
                .with_sprite_size(SPRITE_SIZE),
            _state: Standing,
        }
    }
}

impl KnightState<Blocking> {
    pub fn update(mut self) -> Self {
        self.context = self.context.update(Blocking::total_ticks());
        self
    }

    pub fn stand(self) -> KnightState<Standing> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Standing,
        }
    }
}

impl KnightState<Dying> {
    /// Terminal animation: plays once, then the last frame holds.
    pub fn update(mut self) -> Self {
        self.context = self.context.advance_terminal(Dying::total_ticks());
        self
    }
}

/// Shared data for :
/// - transform : position + facing + sprite size
/// - display   : frame count
/// - combat    : stats + last attack timestamp
#[derive(Debug, Copy, Clone)]
pub struct KnightContext {
    pub frame: u8,
    pub position: Point,
    pub facing: Facing,
    pub stats: Stats,
    pub sprite_size: Size,
    pub last_attack: f64,
}

impl KnightContext {
    /// ::update per frame - cycle the render frame
    fn update(mut self, total_ticks: u8) -> Self {
        if self.frame < total_ticks - 1 {
            self.frame += 1;
        } else {
            self.frame = 0;
        }
        self
    }

    /// Terminal animations advance but never wrap.
    fn advance_terminal(mut self, total_ticks: u8) -> Self {
        if self.frame < total_ticks - 1 {
            self.frame += 1;
        }
        self
    }

    /// Reset to frame 0 on transition :
    /// - each state has its own frame count
    /// - else we risk an out of index frame lookup in the sheet
    fn on_state_transition(mut self) -> Self {
        self.frame = 0;
        self
    }

    fn with_sprite_size(mut self, size: Size) -> Self {
        self.sprite_size = size;
        self
    }

    fn stamp_attack(mut self, now: f64) -> Self {
        self.last_attack = now;
        self
    }

    /// One step per held key, each axis clamped independently: a step
    /// that would cross a bound is skipped for that key this tick.
    /// Facing flips on horizontal input even when the step is skipped.
    fn walk(mut self, intent: MoveIntent) -> Self {
        if intent.up && self.position.y - SPEED >= MIN_Y {
            self.position.y -= SPEED;
        }
        if intent.left {
            self.facing = Facing::Left;
            if self.position.x - SPEED >= MIN_X {
                self.position.x -= SPEED;
            }
        }
        if intent.down && self.position.y + SPEED <= MAX_Y {
            self.position.y += SPEED;
        }
        if intent.right {
            self.facing = Facing::Right;
            if self.position.x + SPEED <= MAX_X {
                self.position.x += SPEED;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_skips_steps_that_would_cross_a_bound() {
        let mut context = KnightState::new().context;
        context.position = Point { x: MIN_X + 2, y: 300 };

        let walked = context.walk(MoveIntent {
            left: true,
            ..MoveIntent::default()
        });
        // 52 - 5 would land at 47, below the bound, so the step is skipped
        assert_eq!(walked.position.x, MIN_X + 2);
        // facing still flips
        assert_eq!(walked.facing, Facing::Left);
    }

    #[test]
    fn walk_moves_on_both_axes_at_once() {
        let context = KnightState::new().context;
        let walked = context.walk(MoveIntent {
            up: true,
            right: true,
            ..MoveIntent::default()
        });
        assert_eq!(walked.position.x, SPAWN.x + SPEED);
        assert_eq!(walked.position.y, SPAWN.y - SPEED);
    }

    #[test]
    fn attack_scales_the_sprite_and_stand_restores_it() {
        let attacking = KnightState::new().attack(1000.0);
        assert_eq!(attacking.context().sprite_size, ATTACK_SPRITE_SIZE);
        assert_eq!(attacking.context().last_attack, 1000.0);

        let standing = attacking.stand();
        assert_eq!(standing.context().sprite_size, SPRITE_SIZE);
        assert_eq!(standing.context().frame, 0);
    }

    #[test]
    fn attack_cadence_honors_the_interval() {
        let attacking = KnightState::new().attack(1000.0);
        assert!(!attacking.attack_due(1000.0 + ATTACK_INTERVAL_MS - 1.0));
        assert!(attacking.attack_due(1000.0 + ATTACK_INTERVAL_MS));

        let restamped = attacking.mark_attack(2000.0);
        assert!(!restamped.attack_due(2500.0));
    }

    #[test]
    fn lethal_hit_slays_and_restores_attack_scaling() {
        let attacking = KnightState::new().attack(0.0);
        match attacking.hit(1000) {
            IsStruck::Slain(dying) => {
                assert_eq!(dying.context().stats.health, 0);
                assert_eq!(dying.context().sprite_size, SPRITE_SIZE);
            }
            IsStruck::Survived(_) => panic!("a 1000 raw hit must slay"),
        }
    }

    #[test]
    fn terminal_animation_holds_its_last_frame() {
        let standing = KnightState::new();
        let mut dying = match standing.hit(1000) {
            IsStruck::Slain(dying) => dying,
            IsStruck::Survived(_) => panic!("a 1000 raw hit must slay"),
        };
        for _ in 0..Dying::total_ticks() * 2 {
            dying = dying.update();
        }
        assert_eq!(dying.context().frame, Dying::total_ticks() - 1);
    }
}
