//! Effects layer: I/O operations behind trait seams.

pub mod cookies;
pub mod dispatch;
pub mod logsink;
pub mod transport;

pub use cookies::{CookieFileJar, CookieRecord};
pub use dispatch::{Dispatcher, ThrottleState};
pub use logsink::{FileSink, LogKind, LogRecord, LogSink, TracingSink};
pub use transport::{ReqwestTransport, Transport};
