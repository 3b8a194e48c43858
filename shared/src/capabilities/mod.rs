pub mod http;
mod navigation;
mod timer;

pub use self::http::{ApiEndpoints, EndpointError, ValidatedUrl};
pub use self::navigation::{NavigationOperation, Navigator};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;

// Concrete types rather than aliases: the derive names each `Effect` variant
// after the capability type.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub navigator: Navigator<Event>,
    pub timer: Timer<Event>,
}
