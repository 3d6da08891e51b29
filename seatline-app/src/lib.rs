pub mod console;
pub mod error;
pub mod notice;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod state;

pub use console::Command;
pub use notice::{Notice, NoticeKind};
pub use session::{BookingSession, TimerEvent};
pub use state::AppState;
