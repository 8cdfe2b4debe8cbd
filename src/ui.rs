//! Terminal front-end. It owns only widget state (selection, open form, search
//! filter, footer message) and calls the record store for everything else.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
