use crate::actor::knight_states::{self, IsStruck, KnightContext, KnightState, MoveIntent};
use crate::actor::{Animation, Facing, Stats, Strike};
use crate::engine::input::{Key, KeyState};
use crate::engine::{Point, Rect, Size};

// forward-facing attack hitbox, offset past the sprite's leading edge
const HITBOX_SIZE: Size = Size {
    width: 60,
    height: 100,
};

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event       →  To State                 │
/// ├─────────────────────────────────────────────────────────┤
/// │  Standing    →  Walk        →  Moving                   │
/// │  Standing    →  Attack      →  Attacking                │
/// │  Standing    →  Block       →  Blocking                 │
/// │  Moving      →  Walk        →  Moving (steps)           │
/// │  Moving      →  Attack      →  Attacking                │
/// │  Moving      →  Block       →  Blocking                 │
/// │  any acting  →  Stand       →  Standing (key released)  │
/// │  any state   →  lethal hit  →  Dying (terminal)         │
/// └─────────────────────────────────────────────────────────┘
pub enum Event {
    Walk(MoveIntent),
    Attack(f64),
    Block,
    Stand,
    Update,
}

#[derive(Debug, Copy, Clone)]
enum KnightStateMachine {
    Standing(KnightState<knight_states::Standing>),
    Moving(KnightState<knight_states::Moving>),
    Attacking(KnightState<knight_states::Attacking>),
    Blocking(KnightState<knight_states::Blocking>),
    Dying(KnightState<knight_states::Dying>),
}

impl From<KnightState<knight_states::Standing>> for KnightStateMachine {
    fn from(state: KnightState<knight_states::Standing>) -> Self {
        KnightStateMachine::Standing(state)
    }
}

impl From<KnightState<knight_states::Moving>> for KnightStateMachine {
    fn from(state: KnightState<knight_states::Moving>) -> Self {
        KnightStateMachine::Moving(state)
    }
}

impl From<KnightState<knight_states::Attacking>> for KnightStateMachine {
    fn from(state: KnightState<knight_states::Attacking>) -> Self {
        KnightStateMachine::Attacking(state)
    }
}

impl From<KnightState<knight_states::Blocking>> for KnightStateMachine {
    fn from(state: KnightState<knight_states::Blocking>) -> Self {
        KnightStateMachine::Blocking(state)
    }
}

impl From<KnightState<knight_states::Dying>> for KnightStateMachine {
    fn from(state: KnightState<knight_states::Dying>) -> Self {
        KnightStateMachine::Dying(state)
    }
}

impl<S> From<IsStruck<S>> for KnightStateMachine
where
    KnightState<S>: Into<KnightStateMachine>,
{
    fn from(is_struck: IsStruck<S>) -> Self {
        match is_struck {
            IsStruck::Survived(state) => state.into(),
            IsStruck::Slain(state) => state.into(),
        }
    }
}

impl KnightStateMachine {
    // CONSUMING self (state instance) and returning a new Self (state)
    // - the `self` passed in as an argument is moved, so a stale state can
    //   never be touched again
    fn transition(self, event: Event) -> Self {
        use KnightStateMachine::*;
        match (self, event) {
            (Standing(state), Event::Walk(intent)) => state.walk(intent).into(),
            (Standing(state), Event::Attack(now)) => state.attack(now).into(),
            (Standing(state), Event::Block) => state.block().into(),
            (Standing(state), Event::Stand) => state.update().into(),
            (Moving(state), Event::Walk(intent)) => state.step(intent).into(),
            (Moving(state), Event::Attack(now)) => state.attack(now).into(),
            (Moving(state), Event::Block) => state.block().into(),
            (Moving(state), Event::Stand) => state.stand().into(),
            (Attacking(state), Event::Update) => state.update().into(),
            (Attacking(state), Event::Stand) => state.stand().into(),
            (Blocking(state), Event::Update) => state.update().into(),
            (Blocking(state), Event::Stand) => state.stand().into(),
            (Dying(state), Event::Update) => state.update().into(),
            // unsupported transitions keep the current state
            _ => self,
        }
    }

    /// Armor-reduced damage. Blocking zeroes it at the point of
    /// application; the dying are beyond harm.
    fn damaged(self, raw: i16) -> Self {
        use KnightStateMachine::*;
        match self {
            Blocking(_) | Dying(_) => self,
            Standing(state) => state.hit(raw).into(),
            Moving(state) => state.hit(raw).into(),
            Attacking(state) => state.hit(raw).into(),
        }
    }

    fn context(&self) -> &KnightContext {
        use KnightStateMachine::*;
        match self {
            Standing(state) => state.context(),
            Moving(state) => state.context(),
            Attacking(state) => state.context(),
            Blocking(state) => state.context(),
            Dying(state) => state.context(),
        }
    }
}

/// The player-controlled knight. Reads the key table once per tick,
/// drives the state machine, and emits a `Strike` when a swing lands.
pub struct Knight {
    state: KnightStateMachine,
}

impl Knight {
    pub fn new() -> Self {
        Knight {
            state: KnightStateMachine::Standing(KnightState::new()),
        }
    }

    /// Restores the documented initial stats, spawn position, and state,
    /// regardless of anything that happened before.
    pub fn reset(&mut self) {
        *self = Knight::new();
    }

    pub fn update(&mut self, keystate: &KeyState, now: f64) -> Option<Strike> {
        let event = self.frame_event(keystate, now);
        let entering_attack = matches!(event, Event::Attack(_));
        self.state = self.state.transition(event);

        if let KnightStateMachine::Attacking(state) = self.state {
            if entering_attack {
                // first swing lands on entry; the stamp was set by attack()
                return Some(self.strike());
            }
            if state.attack_due(now) {
                self.state = state.mark_attack(now).into();
                return Some(self.strike());
            }
        }
        None
    }

    /// Animation-state selection as a fixed priority chain :
    /// moving > attacking > blocking > standing. While acting the movement
    /// keys are ignored; an acting state ends when its key is released.
    fn frame_event(&self, keystate: &KeyState, now: f64) -> Event {
        match self.state {
            KnightStateMachine::Dying(_) => Event::Update,
            KnightStateMachine::Attacking(_) => {
                if keystate.is_pressed(Key::Attack) {
                    Event::Update
                } else {
                    Event::Stand
                }
            }
            KnightStateMachine::Blocking(_) => {
                if keystate.is_pressed(Key::Block) {
                    Event::Update
                } else {
                    Event::Stand
                }
            }
            KnightStateMachine::Standing(_) | KnightStateMachine::Moving(_) => {
                let intent = MoveIntent {
                    up: keystate.is_pressed(Key::Up),
                    left: keystate.is_pressed(Key::Left),
                    down: keystate.is_pressed(Key::Down),
                    right: keystate.is_pressed(Key::Right),
                };
                if intent.any() {
                    Event::Walk(intent)
                } else if keystate.is_pressed(Key::Attack) {
                    Event::Attack(now)
                } else if keystate.is_pressed(Key::Block) {
                    Event::Block
                } else {
                    Event::Stand
                }
            }
        }
    }

    pub fn take_damage(&mut self, raw: i16) {
        self.state = self.state.damaged(raw);
    }

    fn strike(&self) -> Strike {
        let context = self.state.context();
        let reach = context.facing.sign() * (context.sprite_size.width / 2 + HITBOX_SIZE.width / 2);
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
        let context = self.state.context();
        Rect::from_center(context.position, context.sprite_size)
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

    pub fn is_moving(&self) -> bool {
        matches!(self.state, KnightStateMachine::Moving(_))
    }

    pub fn frame_name(&self) -> String {
        use KnightStateMachine::*;
        let frame = self.state.context().frame;
        match self.state {
            Standing(_) => knight_states::Standing::current_frame_name(frame),
            Moving(_) => knight_states::Moving::current_frame_name(frame),
            Attacking(_) => knight_states::Attacking::current_frame_name(frame),
            Blocking(_) => knight_states::Blocking::current_frame_name(frame),
            Dying(_) => knight_states::Dying::current_frame_name(frame),
        }
    }
}

impl Default for Knight {
    fn default() -> Self {
        Knight::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::KeyPress;
    use futures::channel::mpsc::unbounded;

    fn keys(pressed: &[Key]) -> KeyState {
        let (sender, mut receiver) = unbounded();
        let mut state = KeyState::new();
        for key in pressed {
            sender.unbounded_send(KeyPress::KeyDown(*key)).unwrap();
        }
        crate::engine::input::process_input(&mut state, &mut receiver);
        state
    }

    #[test]
    fn update_with_no_keys_and_no_enemies_changes_nothing() {
        let mut knight = Knight::new();
        let before_position = knight.position();
        let before_stats = knight.stats();

        assert!(knight.update(&keys(&[]), 16.0).is_none());

        assert_eq!(knight.position(), before_position);
        assert_eq!(knight.stats(), before_stats);
        assert!(!knight.is_moving());
    }

    #[test]
    fn held_movement_keys_move_and_never_cross_the_bounds() {
        let mut knight = Knight::new();
        let right = keys(&[Key::Right]);
        for tick in 0..400 {
            knight.update(&right, tick as f64 * 16.0);
            assert!(knight.position().x <= knight_states::MAX_X);
        }
        assert_eq!(knight.position().x, knight_states::MAX_X);
        assert_eq!(knight.facing(), Facing::Right);

        let left = keys(&[Key::Left]);
        for tick in 0..400 {
            knight.update(&left, tick as f64 * 16.0);
            assert!(knight.position().x >= knight_states::MIN_X);
        }
        assert_eq!(knight.position().x, knight_states::MIN_X);
        assert_eq!(knight.facing(), Facing::Left);
    }

    #[test]
    fn movement_outranks_attack_and_block() {
        let mut knight = Knight::new();
        knight.update(&keys(&[Key::Up, Key::Attack, Key::Block]), 16.0);
        assert!(knight.is_moving());
        assert!(knight.frame_name().starts_with("knight_walking"));
    }

    #[test]
    fn attack_fires_on_entry_and_then_on_the_interval() {
        let mut knight = Knight::new();
        let attack = keys(&[Key::Attack]);

        let first = knight.update(&attack, 1000.0);
        assert!(first.is_some());
        assert_eq!(first.unwrap().damage, 20);

        // held, but the cooldown has not elapsed
        assert!(knight.update(&attack, 1500.0).is_none());
        assert!(knight.update(&attack, 1949.0).is_none());

        // cooldown elapsed while still held
        assert!(knight.update(&attack, 1950.0).is_some());
    }

    #[test]
    fn movement_keys_are_ignored_while_acting() {
        let mut knight = Knight::new();
        let spawn = knight.position();

        knight.update(&keys(&[Key::Attack]), 0.0);
        knight.update(&keys(&[Key::Attack, Key::Right]), 16.0);
        assert_eq!(knight.position(), spawn);

        // releasing the attack key frees movement on the following tick
        knight.update(&keys(&[Key::Right]), 32.0);
        knight.update(&keys(&[Key::Right]), 48.0);
        assert!(knight.position().x > spawn.x);
    }

    #[test]
    fn attack_hitbox_faces_forward() {
        let mut knight = Knight::new();
        let strike = knight.update(&keys(&[Key::Attack]), 0.0).unwrap();
        assert!(strike.hitbox.left() > knight.position().x);

        // turn around; the next swing reaches the other way
        let mut knight = Knight::new();
        knight.update(&keys(&[Key::Left]), 0.0);
        knight.update(&keys(&[]), 16.0);
        let strike = knight.update(&keys(&[Key::Attack]), 32.0).unwrap();
        assert!(strike.hitbox.right() < knight.position().x);
    }

    #[test]
    fn blocking_zeroes_incoming_damage() {
        let mut knight = Knight::new();
        knight.take_damage(40);
        assert_eq!(knight.stats().health, 90);

        knight.update(&keys(&[Key::Block]), 16.0);
        knight.take_damage(20);
        assert_eq!(knight.stats().health, 90);
    }

    #[test]
    fn exactly_one_animation_state_after_any_update() {
        let mut knight = Knight::new();
        let combos: &[&[Key]] = &[
            &[],
            &[Key::Up, Key::Left],
            &[Key::Attack],
            &[Key::Attack, Key::Block],
            &[Key::Block],
            &[Key::Down, Key::Attack, Key::Block],
        ];
        for (tick, combo) in combos.iter().enumerate() {
            knight.update(&keys(combo), tick as f64 * 16.0);
            // the machine holds exactly one variant; its frame name must
            // resolve to exactly one animation family
            let name = knight.frame_name();
            let families = ["standing", "walking", "attacking", "blocking", "dying"];
            let matches = families
                .iter()
                .filter(|family| name.contains(*family))
                .count();
            assert_eq!(matches, 1, "ambiguous animation state: {}", name);
        }
    }

    #[test]
    fn dead_knights_ignore_input_and_damage() {
        let mut knight = Knight::new();
        knight.take_damage(1000);
        assert!(!knight.is_alive());
        let position = knight.position();

        assert!(knight.update(&keys(&[Key::Right, Key::Attack]), 16.0).is_none());
        assert_eq!(knight.position(), position);

        knight.take_damage(1000);
        assert_eq!(knight.stats().health, 0);
        assert!(knight.frame_name().starts_with("knight_dying"));
    }

    #[test]
    fn reset_restores_the_initial_constants() {
        let mut knight = Knight::new();
        for tick in 0..50 {
            knight.update(&keys(&[Key::Right, Key::Down]), tick as f64 * 16.0);
        }
        knight.take_damage(50);

        knight.reset();
        let stats = knight.stats();
        assert_eq!(stats.health, 100);
        assert_eq!(stats.max_health, 100);
        assert_eq!(stats.damage, 20);
        assert_eq!(stats.armor, 30);
        assert_eq!(knight.position(), Point { x: 60, y: 530 });
    }
}
