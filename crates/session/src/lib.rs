//! Tokio side of the dashboard: one serialized event loop owning the
//! telemetry manager, plus the WebSocket link feeding it.

pub mod event;
pub mod link;
pub mod runner;
pub mod view;

pub use event::DashboardEvent;
pub use link::{run_link, LinkSink};
pub use runner::{run_session, LoggingSink, SessionHandle};
pub use view::RenderView;
