#[allow(clippy::module_inception)]
mod app;
mod state;

pub use app::{expand_home, App, AppEvent};
pub use state::{Focus, ResultsMode};
