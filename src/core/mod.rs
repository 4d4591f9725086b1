pub mod app_state;
pub mod services;
pub mod session;
pub mod time;
pub mod utils;

pub use app_state::AppState;
pub use session::Session;
pub use time::{Clock, FixedClock, SystemClock};
