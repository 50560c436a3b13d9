use crate::actor::brigand_states::{
    self, BrigandContext, BrigandState, Engagement, IsAttacking, IsNear, IsStruck,
};
use crate::actor::{Animation, Facing, Stats, Strike};
use crate::engine::{Point, Rect, Size};

// forward-facing attack hitbox, offset past the sprite's leading edge
const HITBOX_SIZE: Size = Size {
    width: 50,
    height: 90,
};

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State   →  Condition          →  To State         │
/// ├─────────────────────────────────────────────────────────┤
/// │  Approaching  →  inside threshold   →  Engaged          │
/// │  Engaged      →  target broke away  →  Approaching      │
/// │  Engaged      →  interval elapsed   →  Attacking        │
/// │  Attacking    →  swing complete     →  Engaged          │
/// │  any state    →  lethal hit         →  Dying (terminal) │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone)]
enum BrigandStateMachine {
    Approaching(BrigandState<brigand_states::Approaching>),
    Engaged(BrigandState<brigand_states::Engaged>),
    Attacking(BrigandState<brigand_states::Attacking>),
    Dying(BrigandState<brigand_states::Dying>),
}

impl From<BrigandState<brigand_states::Approaching>> for BrigandStateMachine {
    fn from(state: BrigandState<brigand_states::Approaching>) -> Self {
        BrigandStateMachine::Approaching(state)
    }
}

impl From<BrigandState<brigand_states::Engaged>> for BrigandStateMachine {
    fn from(state: BrigandState<brigand_states::Engaged>) -> Self {
        BrigandStateMachine::Engaged(state)
    }
}

impl From<BrigandState<brigand_states::Attacking>> for BrigandStateMachine {
    fn from(state: BrigandState<brigand_states::Attacking>) -> Self {
        BrigandStateMachine::Attacking(state)
    }
}

impl From<BrigandState<brigand_states::Dying>> for BrigandStateMachine {
    fn from(state: BrigandState<brigand_states::Dying>) -> Self {
        BrigandStateMachine::Dying(state)
    }
}

impl From<IsNear> for BrigandStateMachine {
    fn from(is_near: IsNear) -> Self {
        match is_near {
            IsNear::Arrived(engaged_state) => engaged_state.into(),
            IsNear::Tracking(approaching_state) => approaching_state.into(),
        }
    }
}

impl From<Engagement> for BrigandStateMachine {
    fn from(engagement: Engagement) -> Self {
        match engagement {
            Engagement::Holding(engaged_state) => engaged_state.into(),
            Engagement::Chasing(approaching_state) => approaching_state.into(),
            Engagement::Striking(attacking_state) => attacking_state.into(),
        }
    }
}

impl From<IsAttacking> for BrigandStateMachine {
    fn from(is_attacking: IsAttacking) -> Self {
        match is_attacking {
            IsAttacking::Done(engaged_state) => engaged_state.into(),
            IsAttacking::InProgress(attacking_state) => attacking_state.into(),
        }
    }
}

impl<S> From<IsStruck<S>> for BrigandStateMachine
where
    BrigandState<S>: Into<BrigandStateMachine>,
{
    fn from(is_struck: IsStruck<S>) -> Self {
        match is_struck {
            IsStruck::Survived(state) => state.into(),
            IsStruck::Slain(state) => state.into(),
        }
    }
}

impl BrigandStateMachine {
    fn update(self, target: Point, now: f64) -> Self {
        use BrigandStateMachine::*;
        match self {
            Approaching(state) => state.update(target).into(),
            Engaged(state) => state.update(target, now).into(),
            Attacking(state) => state.update().into(),
            Dying(state) => state.update().into(),
        }
    }

    fn damaged(self, raw: i16) -> Self {
        use BrigandStateMachine::*;
        match self {
            Dying(_) => self,
            Approaching(state) => state.hit(raw).into(),
            Engaged(state) => state.hit(raw).into(),
            Attacking(state) => state.hit(raw).into(),
        }
    }

    fn context(&self) -> &BrigandContext {
        use BrigandStateMachine::*;
        match self {
            Approaching(state) => state.context(),
            Engaged(state) => state.context(),
            Attacking(state) => state.context(),
            Dying(state) => state.context(),
        }
    }
}

/// A spawned enemy. Chases the knight's center, engages at the proximity
/// threshold, and swings on a fixed interval while engaged.
pub struct Brigand {
    state: BrigandStateMachine,
}

impl Brigand {
    pub fn new(spawn: Point) -> Self {
        Brigand {
            state: BrigandStateMachine::Approaching(BrigandState::new(spawn)),
        }
    }

    /// Back to the spawn point at full health, stalking again.
    pub fn reset(&mut self) {
        *self = Brigand::new(self.state.context().spawn);
    }

    /// One tick of pursuit. Emits a `Strike` the moment a swing starts.
    pub fn update(&mut self, target: Point, now: f64) -> Option<Strike> {
        let was_attacking = matches!(self.state, BrigandStateMachine::Attacking(_));
        self.state = self.state.update(target, now);

        if !was_attacking && matches!(self.state, BrigandStateMachine::Attacking(_)) {
            return Some(self.strike());
        }
        None
    }

    pub fn take_damage(&mut self, raw: i16) {
        self.state = self.state.damaged(raw);
    }

    fn strike(&self) -> Strike {
        let context = self.state.context();
        let reach = context.facing.sign() * (SPRITE_SIZE_REACH + HITBOX_SIZE.width / 2);
        let center = Point {
            x: context.position.x + reach,
            y: context.position.y,
        };
        Strike {
            hitbox: Rect::from_center(center, HITBOX_SIZE),
            damage: context.stats.damage,
        }
    }

    pub fn position(&self) -> Point {
        self.state.context().position
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.state.context().position, brigand_states::SPRITE_SIZE)
    }

    pub fn facing(&self) -> Facing {
        self.state.context().facing
    }

    pub fn stats(&self) -> Stats {
        self.state.context().stats
    }

    pub fn is_alive(&self) -> bool {
        self.state.context().stats.is_alive()
    }

    /// Death animation finished; the roster can drop this one.
    pub fn is_gone(&self) -> bool {
        match &self.state {
            BrigandStateMachine::Dying(state) => state.finished(),
            _ => false,
        }
    }

    pub fn frame_name(&self) -> String {
        use BrigandStateMachine::*;
        let frame = self.state.context().frame;
        match self.state {
            Approaching(_) => brigand_states::Approaching::current_frame_name(frame),
            Engaged(_) => brigand_states::Engaged::current_frame_name(frame),
            Attacking(_) => brigand_states::Attacking::current_frame_name(frame),
            Dying(_) => brigand_states::Dying::current_frame_name(frame),
        }
    }
}

const SPRITE_SIZE_REACH: i16 = brigand_states::SPRITE_SIZE.width / 2;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::brigand_states::{ATTACK_INTERVAL_MS, PROXIMITY_THRESHOLD, SPEED};

    #[test]
    fn approaches_until_the_threshold_then_holds() {
        let mut brigand = Brigand::new(Point { x: 1100, y: 300 });
        let knight = Point { x: 100, y: 300 };

        let mut now = 0.0;
        for _ in 0..1000 {
            brigand.update(knight, now);
            now += 16.0;
        }
        // parked exactly on the threshold circle, never overlapping
        assert_eq!(
            brigand.position(),
            Point {
                x: 100 + PROXIMITY_THRESHOLD as i16,
                y: 300
            }
        );
        assert_eq!(brigand.facing(), Facing::Left);
    }

    #[test]
    fn first_swing_lands_only_after_the_interval() {
        let mut brigand = Brigand::new(Point {
            x: 100 + PROXIMITY_THRESHOLD as i16 - 10,
            y: 300,
        });
        let knight = Point { x: 100, y: 300 };

        // tick 1 engages; no strike inside the interval
        assert!(brigand.update(knight, 0.0).is_none());
        assert!(brigand.update(knight, 100.0).is_none());

        let strike = brigand.update(knight, ATTACK_INTERVAL_MS + 1.0);
        let strike = strike.expect("interval elapsed while engaged");
        assert_eq!(strike.damage, 40);
        // the hitbox reaches toward the knight
        assert!(strike.hitbox.left() < brigand.position().x);
    }

    #[test]
    fn no_second_swing_until_the_interval_elapses_again() {
        let mut brigand = Brigand::new(Point {
            x: 150,
            y: 300,
        });
        let knight = Point { x: 100, y: 300 };

        brigand.update(knight, 0.0);
        let mut now = ATTACK_INTERVAL_MS + 1.0;
        assert!(brigand.update(knight, now).is_some());

        // swing recovery and the following engagement stay quiet
        for _ in 0..30 {
            now += 16.0;
            assert!(brigand.update(knight, now).is_none());
        }

        assert!(brigand
            .update(knight, now + ATTACK_INTERVAL_MS)
            .is_some());
    }

    #[test]
    fn leaving_the_threshold_resumes_the_chase() {
        let mut brigand = Brigand::new(Point { x: 150, y: 300 });
        let knight = Point { x: 100, y: 300 };
        brigand.update(knight, 0.0);

        let parked = brigand.position();
        let far = Point { x: 1000, y: 300 };
        // one tick to break engagement, one to step
        brigand.update(far, 16.0);
        brigand.update(far, 32.0);
        assert_eq!(brigand.position().x, parked.x + SPEED);
        assert_eq!(brigand.facing(), Facing::Right);
    }

    #[test]
    fn dead_brigands_stop_taking_damage_and_eventually_leave() {
        let mut brigand = Brigand::new(Point { x: 150, y: 300 });
        brigand.take_damage(60);
        assert!(!brigand.is_alive());
        assert!(!brigand.is_gone());

        // immune while the animation plays out
        brigand.take_damage(1000);
        assert!(!brigand.is_alive());

        let knight = Point { x: 100, y: 300 };
        let position = brigand.position();
        for tick in 0..30 {
            assert!(brigand.update(knight, tick as f64 * 16.0).is_none());
        }
        assert_eq!(brigand.position(), position);
        assert!(brigand.is_gone());
        assert!(brigand.frame_name().starts_with("brigand_dying"));
    }

    #[test]
    fn reset_returns_to_spawn_at_full_health() {
        let spawn = Point { x: 1100, y: 50 };
        let mut brigand = Brigand::new(spawn);
        let knight = Point { x: 100, y: 300 };
        for tick in 0..100 {
            brigand.update(knight, tick as f64 * 16.0);
        }
        brigand.take_damage(30);

        brigand.reset();
        assert_eq!(brigand.position(), spawn);
        assert!(brigand.is_alive());
        assert!(brigand.frame_name().starts_with("brigand_walking"));
    }
}
