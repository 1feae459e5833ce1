//! Live request inspector: registry, presentation state and refresh timers

mod controller;
mod detail;
mod scheduler;
mod store;
mod time;

pub use controller::{Controller, ListEntry, ListUpdate, RenderTarget, NOTIFICATION_TITLE};
pub use detail::{project, BodyContent, DetailView};
pub use scheduler::{Scheduler, Tick};
pub use store::RequestStore;
pub use time::{relative_time, relative_time_from_now};
