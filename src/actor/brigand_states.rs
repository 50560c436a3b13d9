//! Brigand states behind the same unrepresentable-states wall as the
//! knight's: transitions happen only through the methods here.

use crate::actor::{Animation, Facing, Stats};
use crate::engine::{Point, Size};

// pursuit consts
pub(crate) const SPEED: i16 = 3;
/// Closing distance at which a brigand stops approaching and engages.
pub(crate) const PROXIMITY_THRESHOLD: f32 = 120.0;
/// The snap rounds to whole pixels, which can park a brigand a hair past
/// the threshold; the slack keeps rounding from bouncing the state.
pub(crate) const DISENGAGE_SLACK: f32 = 2.0;

// combat consts
pub(crate) const MAX_HEALTH: i16 = 50;
pub(crate) const DAMAGE: i16 = 40;
pub(crate) const ARMOR: i16 = 10;
pub(crate) const ATTACK_INTERVAL_MS: f64 = 1500.0;

pub(crate) const SPRITE_SIZE: Size = Size {
    width: 100,
    height: 100,
};

#[derive(Debug, Copy, Clone)]
pub struct Approaching;

#[derive(Debug, Copy, Clone)]
pub struct Engaged;

#[derive(Debug, Copy, Clone)]
pub struct Attacking;

#[derive(Debug, Copy, Clone)]
pub struct Dying;

impl Animation for Approaching {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "brigand_walking";
}

impl Animation for Engaged {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "brigand_standing";
}

impl Animation for Attacking {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "brigand_attacking";
}

impl Animation for Dying {
    const FRAMES: u8 = 4;
    const PREFIX: &'static str = "brigand_dying";
}

pub enum IsNear {
    Arrived(BrigandState<Engaged>),
    Tracking(BrigandState<Approaching>),
}

pub enum Engagement {
    Holding(BrigandState<Engaged>),
    Chasing(BrigandState<Approaching>),
    Striking(BrigandState<Attacking>),
}

pub enum IsAttacking {
    Done(BrigandState<Engaged>),
    InProgress(BrigandState<Attacking>),
}

/// Outcome of taking a hit: survive in place or drop into Dying.
pub enum IsStruck<S> {
    Survived(BrigandState<S>),
    Slain(BrigandState<Dying>),
}

#[derive(Debug, Copy, Clone)]
pub struct BrigandState<S> {
    context: BrigandContext,
    _state: S,
}

impl<S> BrigandState<S> {
    pub fn context(&self) -> &BrigandContext {
        &self.context
    }

    pub fn hit(self, raw: i16) -> IsStruck<S> {
        let mut context = self.context;
        context.stats.take_damage(raw);
        if context.stats.is_alive() {
            IsStruck::Survived(BrigandState { context, _state: self._state })
        } else {
            IsStruck::Slain(BrigandState {
                context: context.on_state_transition(),
                _state: Dying,
            })
        }
    }
}

impl BrigandState<Approaching> {
    pub fn new(spawn: Point) -> Self {
        BrigandState {
            context: BrigandContext {
                frame: 0,
                position: spawn,
                spawn,
                facing: Facing::Left,
                stats: Stats::new(MAX_HEALTH, DAMAGE, ARMOR),
                last_attack: 0.0,
            },
            _state: Approaching,
        }
    }

    /// Close on the target at fixed speed. Inside the threshold the
    /// brigand snaps onto the threshold circle (no overlap) and engages.
    /// A zero distance counts as already engaged; nothing is normalized.
    pub fn update(mut self, target: Point) -> IsNear {
        self.context = self.context.face(target);
        let offset = Offset::between(self.context.position, target);
        if offset.distance < PROXIMITY_THRESHOLD {
            if offset.distance > 0.0 {
                self.context = self.context.snap_to_threshold(target, offset);
            }
            IsNear::Arrived(self.engage())
        } else {
            self.context = self
                .context
                .pursue(offset)
                .update(Approaching::total_ticks());
            IsNear::Tracking(self)
        }
    }

    pub fn engage(self) -> BrigandState<Engaged> {
        BrigandState {
            context: self.context.on_state_transition(),
            _state: Engaged,
        }
    }
}

impl BrigandState<Engaged> {
    /// Hold position while the target stays close; strike on the attack
    /// interval; resume the chase when the target breaks away.
    pub fn update(mut self, target: Point, now: f64) -> Engagement {
        self.context = self.context.face(target);
        let offset = Offset::between(self.context.position, target);
        if offset.distance > PROXIMITY_THRESHOLD + DISENGAGE_SLACK {
            Engagement::Chasing(self.chase())
        } else if now - self.context.last_attack >= ATTACK_INTERVAL_MS {
            Engagement::Striking(self.attack(now))
        } else {
            self.context = self.context.update(Engaged::total_ticks());
            Engagement::Holding(self)
        }
    }

    pub fn chase(self) -> BrigandState<Approaching> {
        BrigandState {
            context: self.context.on_state_transition(),
            _state: Approaching,
        }
    }

    pub fn attack(self, now: f64) -> BrigandState<Attacking> {
        BrigandState {
            context: self.context.on_state_transition().stamp_attack(now),
            _state: Attacking,
        }
    }
}

impl BrigandState<Attacking> {
    /// Returns an enum because the swing can:
    /// - End      (Done)
    /// - Continue (InProgress)
    pub fn update(mut self) -> IsAttacking {
        self.context = self.context.update(Attacking::total_ticks());
        // on every update we check if the animation completed a cycle
        if self.context.frame == 0 {
            IsAttacking::Done(self.rest())
        } else {
            IsAttacking::InProgress(self)
        }
    }

    pub fn rest(self) -> BrigandState<Engaged> {
        BrigandState {
            context: self.context.on_state_transition(),
            _state: Engaged,
        }
    }
}

impl BrigandState<Dying> {
    /// Terminal animation: plays once, then the corpse is collectable.
    pub fn update(mut self) -> Self {
        self.context = self.context.advance_terminal(Dying::total_ticks());
        self
    }

    pub fn finished(&self) -> bool {
        self.context.frame == Dying::total_ticks() - 1
    }
}

/// Straight-line offset between two centers, precomputed once per tick.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Offset {
    dx: f32,
    dy: f32,
    distance: f32,
}

impl Offset {
    pub(crate) fn between(from: Point, to: Point) -> Self {
        let dx = (to.x - from.x) as f32;
        let dy = (to.y - from.y) as f32;
        Offset {
            dx,
            dy,
            distance: (dx * dx + dy * dy).sqrt(),
        }
    }
}

/// Shared data for :
/// - transform : position + facing + home spawn
/// - display   : frame count
/// - combat    : stats + last attack timestamp
#[derive(Debug, Copy, Clone)]
pub struct BrigandContext {
    pub frame: u8,
    pub position: Point,
    pub spawn: Point,
    pub facing: Facing,
    pub stats: Stats,
    pub last_attack: f64,
}

impl BrigandContext {
    fn update(mut self, total_ticks: u8) -> Self {
        if self.frame < total_ticks - 1 {
            self.frame += 1;
        } else {
            self.frame = 0;
        }
        self
    }

    fn advance_terminal(mut self, total_ticks: u8) -> Self {
        if self.frame < total_ticks - 1 {
            self.frame += 1;
        }
        self
    }

    fn on_state_transition(mut self) -> Self {
        self.frame = 0;
        self
    }

    fn stamp_attack(mut self, now: f64) -> Self {
        self.last_attack = now;
        self
    }

    /// Brigands always face their prey; a dead-level vertical approach
    /// keeps the previous facing.
    fn face(mut self, target: Point) -> Self {
        let delta_x = target.x - self.position.x;
        if delta_x != 0 {
            self.facing = Facing::toward(delta_x);
        }
        self
    }

    /// One fixed-speed step along the normalized direction. Callers
    /// guarantee a non-zero distance.
    fn pursue(mut self, offset: Offset) -> Self {
        self.position.x += (offset.dx / offset.distance * SPEED as f32).round() as i16;
        self.position.y += (offset.dy / offset.distance * SPEED as f32).round() as i16;
        self
    }

    /// Land exactly on the threshold circle around the target.
    fn snap_to_threshold(mut self, target: Point, offset: Offset) -> Self {
        let scale = PROXIMITY_THRESHOLD / offset.distance;
        self.position.x = target.x - (offset.dx * scale).round() as i16;
        self.position.y = target.y - (offset.dy * scale).round() as i16;
        self
    }
}
