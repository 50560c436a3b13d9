// ==================== Modules ====================
#[macro_use]
mod browser;
mod actor;
mod engine;
mod game;
mod ui;

// ==================== Imports ====================
use engine::GameLoop;
use game::KnightArena;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// ==================== Main Functions ====================
/// Main entry for the Webassembly module
/// - installs the panic hook
/// - wires the start button
/// - a click hides the start screen and spawns the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    let start_button =
        browser::html_element("startButton").expect("startButton should be an HtmlElement");
    let start_screen =
        browser::html_element("startScreen").expect("startScreen should be an HtmlElement");

    let onclick = browser::closure_once(move || {
        start_screen
            .class_list()
            .add_1("hidden")
            .expect("Overlay class toggle failed");

        // spawns the game on the local task queue; wasm is single threaded
        browser::spawn_local(async move {
            if let Err(err) = GameLoop::start(KnightArena::new()).await {
                log!("Game failed to start : {:#?}", err);
            }
        });
    });
    start_button.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();

    Ok(())
}
