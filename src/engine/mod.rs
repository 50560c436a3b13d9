use crate::browser::{self, LoopClosure};
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
// unchecked_ref casts from a Javascript type to a Rust type
// - we control the closure creation and specify the expected type,
// so in principle this is generally safe (unsafe) code
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

pub mod input;
use input::KeyState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    /// One tick of the simulation. `now` is the wall clock in milliseconds,
    /// sampled once per frame; every timer in the game compares against it.
    fn update(&mut self, keystate: &KeyState, now: f64);
    fn draw(&mut self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut keystate = KeyState::new();
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&keystate, perf);
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            let _ = browser::request_animation_frame(f.borrow().as_ref().unwrap());
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: i16,
    pub height: i16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    /// Sprites are anchored at their center; bounds are derived from it.
    pub fn from_center(center: Point, size: Size) -> Self {
        Rect {
            position: Point {
                x: center.x - size.width / 2,
                y: center.y - size.height / 2,
            },
            size,
        }
    }

    pub fn left(&self) -> i16 {
        self.position.x
    }

    pub fn right(&self) -> i16 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> i16 {
        self.position.y
    }

    pub fn bottom(&self) -> i16 {
        self.position.y + self.size.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

// ==================== Sprite Sheets ====================
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Sheet {
    pub frames: HashMap<String, Cell>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Cell {
    pub frame: SheetRect,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetRect {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
}

/// A sheet paired with its image, shared by every actor drawn from it.
pub struct SpriteSheet {
    sheet: Rc<Sheet>,
    image: HtmlImageElement,
}

impl SpriteSheet {
    pub fn new(sheet: Sheet, image: HtmlImageElement) -> Self {
        SpriteSheet {
            sheet: Rc::new(sheet),
            image,
        }
    }

    pub fn draw(&self, renderer: &Renderer, frame_name: &str, destination: &Rect, mirrored: bool) {
        let sprite = self.sheet.frames.get(frame_name).expect("Cell not found");
        let source = Rect::new(
            Point {
                x: sprite.frame.x,
                y: sprite.frame.y,
            },
            Size {
                width: sprite.frame.w,
                height: sprite.frame.h,
            },
        );
        if mirrored {
            renderer.draw_sprite_mirrored(&self.image, &source, destination);
        } else {
            renderer.draw_sprite(&self.image, &source, destination);
        }
    }
}

// ==================== Renderer ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn draw_sprite(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.position.x.into(),
                frame.position.y.into(),
                frame.size.width.into(),
                frame.size.height.into(),
                destination.position.x.into(),
                destination.position.y.into(),
                destination.size.width.into(),
                destination.size.height.into(),
            )
            .expect("Drawing is throwing exceptions! Unrecoverable error");
    }

    /// Same as `draw_sprite` but flipped around the destination's vertical
    /// centerline, for left-facing actors.
    pub fn draw_sprite_mirrored(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        self.context.save();
        self.context
            .translate((destination.left() + destination.right()).into(), 0.0)
            .expect("Drawing is throwing exceptions! Unrecoverable error");
        self.context
            .scale(-1.0, 1.0)
            .expect("Drawing is throwing exceptions! Unrecoverable error");
        self.draw_sprite(image, frame, destination);
        self.context.restore();
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, position: &Point) {
        self.context
            .draw_image_with_html_image_element(image, position.x.into(), position.y.into())
            .expect("Drawing is throwing exceptions! Unrecoverable error");
    }

    #[cfg(debug_assertions)]
    pub fn stroke_rect(&self, rect: &Rect) {
        self.context.stroke_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }
}

#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.stroke_rect(self);
    }
}

// ==================== Images & Audio ====================
pub struct Image {
    element: HtmlImageElement,
    position: Point,
}

impl Image {
    pub fn new(element: HtmlImageElement, position: Point) -> Self {
        Image { element, position }
    }

    pub fn draw(&self, renderer: &Renderer) {
        renderer.draw_entire_image(&self.element, &self.position);
    }
}

/// Fire-and-forget audio clip. Restarts from time zero only when the
/// element is not already playing.
pub struct Sound {
    element: HtmlAudioElement,
}

impl Sound {
    pub fn new(element: HtmlAudioElement) -> Self {
        Sound { element }
    }

    pub fn play(&self) {
        if self.element.paused() {
            self.element.set_current_time(0.0);
            if let Err(err) = self.element.play() {
                log!("Audio playback failed : {:#?}", err);
            }
        }
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // double unwrap because Result<Result<(), Error>, oneshot::Canceled>
    // - first unwrap yields channel result : Result<(), Error>
    // - second unwrap yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i16, y: i16, w: i16, h: i16) -> Rect {
        Rect::new(Point { x, y }, Size { width: w, height: h })
    }

    #[test]
    fn overlapping_rects_intersect() {
        let a = rect(0, 0, 100, 100);
        let b = rect(50, 50, 100, 100);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = rect(0, 0, 100, 100);
        let b = rect(200, 0, 100, 100);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn edge_touching_rects_do_not_intersect() {
        let a = rect(0, 0, 100, 100);
        let b = rect(100, 0, 100, 100);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn from_center_places_bounds_around_the_anchor() {
        let bounds = Rect::from_center(Point { x: 60, y: 530 }, Size { width: 150, height: 150 });
        assert_eq!(bounds.left(), -15);
        assert_eq!(bounds.right(), 135);
        assert_eq!(bounds.top(), 455);
        assert_eq!(bounds.bottom(), 605);
    }
}
