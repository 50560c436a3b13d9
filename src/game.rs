use crate::actor::brigand::Brigand;
use crate::actor::knight::Knight;
use crate::actor::{Facing, Strike};
use crate::browser;
use crate::engine;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::input::KeyState;
use crate::engine::{Game, Image, Point, Rect, Renderer, Sheet, Size, Sound, SpriteSheet};
use crate::ui::{Hud, Screens};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use web_sys::HtmlImageElement;

const SCREEN: Size = Size {
    width: 1200,
    height: 600,
};
/// Defeating the whole wave wins the session.
const WAVE_SIZE: usize = 3;
const TRANSITION_DELAY_MS: i32 = 2000;
const PLAYER_NAME: &str = "Knight";

// brigands spawn near the top border or the right border
const TOP_SPAWN_Y: i16 = 50;
const RIGHT_SPAWN_X: i16 = 1150;

/// ┌───────────────────── Game Architecture Overview ────────────────────┐
/// │                                                                     │
/// │    ┌─────────────┐          ┌─────────────┐       ┌─────────────┐   │
/// │    │  GameLoop   │  update  │ KnightArena │ tick  │   Session   │   │
/// │    │  (engine)   ├─────────►│ Loading /   ├──────►│ knight      │   │
/// │    │             │          │ Loaded      │       │ brigands    │   │
/// │    └─────────────┘          └─────────────┘       └──────┬──────┘   │
/// │                                                          │          │
/// │   actors emit Strikes; the session resolves them against │          │
/// │   the roster it owns and reflects stats into the HUD ◄───┘          │
/// └─────────────────────────────────────────────────────────────────────┘
pub enum KnightArena {
    /// Initial state while resources are being loaded
    Loading,

    /// Active game state with a running session
    Loaded(Session),
}

impl KnightArena {
    const KNIGHT_SHEET_PATH: &'static str = "knight.json";
    const KNIGHT_IMAGE_PATH: &'static str = "knight.png";
    const BRIGAND_SHEET_PATH: &'static str = "brigand.json";
    const BRIGAND_IMAGE_PATH: &'static str = "brigand.png";
    const BACKGROUND_PATH: &'static str = "arena.png";

    pub fn new() -> Self {
        KnightArena::Loading
    }

    async fn load_sheet(path: &str) -> Result<Sheet> {
        browser::fetch_json::<Sheet>(path)
            .await
            .with_context(|| format!("Failed to load sprite sheet from : {}", path))
    }

    async fn load_sprite_image(path: &str) -> Result<HtmlImageElement> {
        engine::load_image(path)
            .await
            .with_context(|| format!("Failed to load sprite image resource from : {}", path))
    }
}

impl Default for KnightArena {
    fn default() -> Self {
        KnightArena::new()
    }
}

#[async_trait(?Send)]
impl Game for KnightArena {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            KnightArena::Loading => {
                // independent resources load simultaneously; total time is
                // the slowest resource, not the sum
                let (knight_sheet, knight_image, brigand_sheet, brigand_image, background) = join!(
                    Self::load_sheet(Self::KNIGHT_SHEET_PATH),
                    Self::load_sprite_image(Self::KNIGHT_IMAGE_PATH),
                    Self::load_sheet(Self::BRIGAND_SHEET_PATH),
                    Self::load_sprite_image(Self::BRIGAND_IMAGE_PATH),
                    Self::load_sprite_image(Self::BACKGROUND_PATH),
                );
                let session = Session::new(
                    SpriteSheet::new(knight_sheet?, knight_image?),
                    SpriteSheet::new(brigand_sheet?, brigand_image?),
                    Image::new(background?, Point { x: 0, y: 0 }),
                )?;
                Ok(Box::new(KnightArena::Loaded(session)))
            }
            KnightArena::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState, now: f64) {
        if let KnightArena::Loaded(session) = self {
            session.tick(keystate, now);
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let KnightArena::Loaded(session) = self {
            session.draw(renderer);
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum ScreenTransition {
    Win,
    Death,
}

/// One play-through: the knight, the brigand roster, and everything the
/// pair is projected onto. Owns the pending screen transition so a reset
/// cancels it.
pub struct Session {
    knight: Knight,
    brigands: Vec<Brigand>,
    defeated: usize,
    settled: bool,
    hud: Hud,
    screens: Screens,
    move_sound: Sound,
    attack_sound: Sound,
    knight_sprites: SpriteSheet,
    brigand_sprites: SpriteSheet,
    background: Image,
    pending_transition: Option<browser::Timeout>,
}

impl Session {
    fn new(
        knight_sprites: SpriteSheet,
        brigand_sprites: SpriteSheet,
        background: Image,
    ) -> Result<Self> {
        let mut brigands = Vec::with_capacity(WAVE_SIZE);
        for _ in 0..WAVE_SIZE {
            brigands.push(Brigand::new(spawn_point()?));
        }
        let session = Session {
            knight: Knight::new(),
            brigands,
            defeated: 0,
            settled: false,
            hud: Hud::new()?,
            screens: Screens::new()?,
            move_sound: Sound::new(browser::audio_element("moveSound")?),
            attack_sound: Sound::new(browser::audio_element("attackSound")?),
            knight_sprites,
            brigand_sprites,
            background,
            pending_transition: None,
        };
        session.hud.render(PLAYER_NAME, &session.knight.stats());
        log!("Session started : {} brigands", WAVE_SIZE);
        Ok(session)
    }

    fn tick(&mut self, keystate: &KeyState, now: f64) {
        if self.screens.take_restart_request() {
            self.reset();
            return;
        }

        let parked = self.knight.position();
        let knight_strike = self.knight.update(keystate, now);
        if self.knight.position() != parked {
            self.move_sound.play();
        }

        if let Some(strike) = knight_strike {
            self.attack_sound.play();
            let felled = resolve_strike(&strike, &mut self.brigands);
            if felled > 0 {
                self.defeated += felled;
                log!("Brigand defeated : {} of {}", self.defeated, WAVE_SIZE);
            }
            if self.defeated >= WAVE_SIZE && !self.settled {
                self.settled = true;
                log!("All brigands defeated");
                self.schedule_transition(ScreenTransition::Win);
            }
        }

        let target = self.knight.position();
        let knight_bounds = self.knight.bounds();
        let was_alive = self.knight.is_alive();
        for brigand in self.brigands.iter_mut() {
            if let Some(strike) = brigand.update(target, now) {
                if strike.hitbox.intersects(&knight_bounds) {
                    self.knight.take_damage(strike.damage);
                }
            }
        }
        if was_alive && !self.knight.is_alive() && !self.settled {
            self.settled = true;
            log!("Knight has fallen");
            self.schedule_transition(ScreenTransition::Death);
        }

        // corpses leave the roster once their animation finishes
        self.brigands.retain(|brigand| !brigand.is_gone());

        self.hud.render(PLAYER_NAME, &self.knight.stats());
    }

    fn schedule_transition(&mut self, transition: ScreenTransition) {
        let screens = self.screens.clone();
        match browser::Timeout::schedule(
            move || match transition {
                ScreenTransition::Win => screens.show_win(),
                ScreenTransition::Death => screens.show_death(),
            },
            TRANSITION_DELAY_MS,
        ) {
            Ok(timeout) => self.pending_transition = Some(timeout),
            Err(err) => log!("Could not schedule screen transition : {:#?}", err),
        }
    }

    /// Restores the initial stats, positions, and roster regardless of
    /// prior state, and re-shows the start panel.
    fn reset(&mut self) {
        self.knight.reset();
        for brigand in self.brigands.iter_mut() {
            brigand.reset();
        }
        while self.brigands.len() < WAVE_SIZE {
            match spawn_point() {
                Ok(spawn) => self.brigands.push(Brigand::new(spawn)),
                Err(err) => {
                    log!("Could not spawn brigand : {:#?}", err);
                    break;
                }
            }
        }
        self.defeated = 0;
        self.settled = false;
        // dropping the handle clears any pending screen transition
        self.pending_transition = None;
        self.screens.show_start();
        self.hud.render(PLAYER_NAME, &self.knight.stats());
        log!("Session reset");
    }

    fn draw(&self, renderer: &Renderer) {
        renderer.clear(&Rect::new(Point { x: 0, y: 0 }, SCREEN));
        // Draw order matters : background -> actors
        self.background.draw(renderer);
        self.knight_sprites.draw(
            renderer,
            &self.knight.frame_name(),
            &self.knight.bounds(),
            self.knight.facing() == Facing::Left,
        );
        for brigand in &self.brigands {
            self.brigand_sprites.draw(
                renderer,
                &brigand.frame_name(),
                &brigand.bounds(),
                brigand.facing() == Facing::Left,
            );
        }

        #[cfg(debug_assertions)]
        {
            self.knight.bounds().draw_debug(renderer);
            for brigand in &self.brigands {
                brigand.bounds().draw_debug(renderer);
            }
        }
    }
}

/// Every alive brigand whose sprite bounds overlap the hitbox takes the
/// strike's damage. Returns how many were felled by it; an empty or
/// already-dead roster is a no-op.
fn resolve_strike(strike: &Strike, brigands: &mut [Brigand]) -> usize {
    let mut felled = 0;
    for brigand in brigands
        .iter_mut()
        .filter(|brigand| brigand.is_alive())
    {
        if strike.hitbox.intersects(&brigand.bounds()) {
            brigand.take_damage(strike.damage);
            if !brigand.is_alive() {
                felled += 1;
            }
        }
    }
    felled
}

/// Spawn near the top border or the right border, split by a random bit.
fn spawn_point() -> Result<Point> {
    let mut bytes = [0u8; 3];
    getrandom::getrandom(&mut bytes)
        .map_err(|err| anyhow!("Could not get random bytes : {:#?}", err))?;
    let along = u16::from_le_bytes([bytes[0], bytes[1]]);
    if bytes[2] & 1 == 0 {
        Ok(Point {
            x: (along % SCREEN.width as u16) as i16,
            y: TOP_SPAWN_Y,
        })
    } else {
        Ok(Point {
            x: RIGHT_SPAWN_X,
            y: (along % SCREEN.height as u16) as i16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike_at(x: i16, y: i16, damage: i16) -> Strike {
        Strike {
            hitbox: Rect::from_center(
                Point { x, y },
                Size {
                    width: 60,
                    height: 100,
                },
            ),
            damage,
        }
    }

    #[test]
    fn strike_damages_only_overlapping_brigands() {
        let mut brigands = vec![
            Brigand::new(Point { x: 300, y: 300 }),
            Brigand::new(Point { x: 800, y: 300 }),
        ];
        let felled = resolve_strike(&strike_at(310, 300, 20), &mut brigands);
        assert_eq!(felled, 0);
        // armor 10 soaks half of the 20
        assert_eq!(brigands[0].stats().health, 40);
        // out of reach, untouched
        assert_eq!(brigands[1].stats().health, 50);
    }

    #[test]
    fn strike_on_an_empty_roster_is_a_no_op() {
        let mut brigands: Vec<Brigand> = Vec::new();
        assert_eq!(resolve_strike(&strike_at(300, 300, 20), &mut brigands), 0);
    }

    #[test]
    fn felled_brigands_are_counted_once_then_excluded() {
        let mut brigands = vec![Brigand::new(Point { x: 300, y: 300 })];
        let felled: usize = (0..5)
            .map(|_| resolve_strike(&strike_at(310, 300, 60), &mut brigands))
            .sum();
        assert_eq!(felled, 1);
        assert_eq!(brigands[0].stats().health, 0);
    }

    #[test]
    fn wave_of_player_hits_wears_a_brigand_down() {
        // five 20-raw swings against 10 armor over 50 hp
        let mut brigands = vec![Brigand::new(Point { x: 300, y: 300 })];
        let mut felled = 0;
        for _ in 0..5 {
            felled += resolve_strike(&strike_at(310, 300, 20), &mut brigands);
        }
        assert_eq!(felled, 1);
        assert!(!brigands[0].is_alive());
    }
}
