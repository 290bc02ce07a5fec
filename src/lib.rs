//! After-action review: record what happens in a shared simulated world and
//! replay it later through puppeted stand-in actors.

pub mod capture;
pub mod clock;
pub mod codec;
pub mod config;
pub mod event;
pub mod playback;
pub mod session;
pub mod storage;
pub mod util;

pub use capture::{
    ActorPresence, AppearanceArchive, CaptureError, ChatMessage, NotificationSource,
    ObjectPresence, Recorder, RecorderStatus, WorldHub, WorldObserver,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CodecError, SessionCodec};
pub use config::Config;
pub use event::{Event, EventKind, EventLog};
pub use playback::{
    Dispatch, DispatchError, PlaybackAnomaly, PlaybackError, PlaybackPhase, Player, TickReport,
    TracingDispatch,
};
pub use session::{SessionCatalog, SessionError, SessionId, SessionStore, SessionSummary};
pub use storage::{DirStorage, MemoryStorage, Storage, StorageError};
