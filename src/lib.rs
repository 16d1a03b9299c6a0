//! Browser front end of the daily log tracker.

pub mod api;
pub mod app;
pub mod audio;
pub mod components;
pub mod form;
pub mod speech;
pub mod types;

use wasm_bindgen::prelude::*;

use app::DailyLogPage;

#[wasm_bindgen(start)]
pub fn run_app() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or("document not available")?;
    let root = document
        .get_element_by_id("root")
        .ok_or("missing #root element")?;
    yew::Renderer::<DailyLogPage>::with_root(root).render();
    Ok(())
}
