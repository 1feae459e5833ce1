//! Terminal User Interface for the request viewer

mod app;
mod ui;

pub use app::{TuiApp, UserAction};
pub use ui::draw;
