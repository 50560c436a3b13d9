use crate::actor::Stats;
use crate::browser;
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

// element ids baked into index.html
mod ids {
    pub const NAME: &str = "name";
    pub const HEALTH: &str = "health";
    pub const DAMAGE: &str = "damage";
    pub const ARMOR: &str = "armor";
    pub const START_SCREEN: &str = "startScreen";
    pub const DEATH_SCREEN: &str = "deathScreen";
    pub const WIN_SCREEN: &str = "winScreen";
    pub const DEATH_TRY_AGAIN: &str = "deathTryAgainButton";
    pub const WIN_TRY_AGAIN: &str = "winTryAgainButton";
}

const HIDDEN_CLASS: &str = "hidden";

/// One-way projection of the knight's stats onto the side-panel text
/// nodes. Construction fails fast when the panel is missing.
pub struct Hud {
    name: HtmlElement,
    health: HtmlElement,
    damage: HtmlElement,
    armor: HtmlElement,
}

impl Hud {
    pub fn new() -> Result<Self> {
        Ok(Hud {
            name: browser::html_element(ids::NAME)?,
            health: browser::html_element(ids::HEALTH)?,
            damage: browser::html_element(ids::DAMAGE)?,
            armor: browser::html_element(ids::ARMOR)?,
        })
    }

    pub fn render(&self, name: &str, stats: &Stats) {
        self.name.set_text_content(Some(name));
        self.health
            .set_text_content(Some(&format!("Health: {}", stats.health)));
        self.damage
            .set_text_content(Some(&format!("Damage: {}", stats.damage)));
        self.armor
            .set_text_content(Some(&format!("Armor: {}", stats.armor)));
    }
}

/// The three mutually exclusive overlay panels. Try-again clicks only
/// raise a flag here; the session polls it on its next tick so every
/// game-state mutation stays inside the update cycle.
#[derive(Clone)]
pub struct Screens {
    start: HtmlElement,
    death: HtmlElement,
    win: HtmlElement,
    restart_requested: Rc<Cell<bool>>,
}

impl Screens {
    pub fn new() -> Result<Self> {
        let screens = Screens {
            start: browser::html_element(ids::START_SCREEN)?,
            death: browser::html_element(ids::DEATH_SCREEN)?,
            win: browser::html_element(ids::WIN_SCREEN)?,
            restart_requested: Rc::new(Cell::new(false)),
        };
        screens.bind_restart(ids::DEATH_TRY_AGAIN)?;
        screens.bind_restart(ids::WIN_TRY_AGAIN)?;
        Ok(screens)
    }

    fn bind_restart(&self, id: &str) -> Result<()> {
        let flag = self.restart_requested.clone();
        let onclick =
            browser::closure_wrap(Box::new(move || flag.set(true)) as Box<dyn FnMut()>);
        browser::html_element(id)?.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
        Ok(())
    }

    /// Consumes a pending try-again click, if any.
    pub fn take_restart_request(&self) -> bool {
        self.restart_requested.replace(false)
    }

    pub fn show_start(&self) {
        show(&self.start);
        hide(&self.death);
        hide(&self.win);
    }

    pub fn show_death(&self) {
        hide(&self.start);
        show(&self.death);
        hide(&self.win);
    }

    pub fn show_win(&self) {
        hide(&self.start);
        hide(&self.death);
        show(&self.win);
    }
}

fn show(element: &HtmlElement) {
    element
        .class_list()
        .remove_1(HIDDEN_CLASS)
        .expect("Overlay class toggle failed");
}

fn hide(element: &HtmlElement) {
    element
        .class_list()
        .add_1(HIDDEN_CLASS)
        .expect("Overlay class toggle failed");
}
