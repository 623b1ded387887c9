//! Shell state shared by the Bolt server renderer and the browser shell.
//!
//! Nothing in this crate touches the DOM or the network. Browser-only
//! capabilities (durable storage, the document root, pointer events,
//! telemetry delivery) are reached through the traits defined here and
//! implemented by the web shell, so every state machine can be driven on
//! the host in tests.

pub mod bootstrap;
pub mod capability;
pub mod cell;
pub mod conversation;
pub mod frame;
pub mod header;
pub mod listener;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod theme;
pub mod user_menu;

pub use bootstrap::{AppShell, BootPhase, BootstrapContext, DocumentRoot};
pub use capability::{ClientCapability, Gated};
pub use cell::{CellReader, CellWriter, Subscription, reactive_cell};
pub use conversation::ConversationState;
pub use frame::{SCROLL_POSITION_CACHE_LIMIT, ScriptManifest, ScrollRestoration, ShellFrame};
pub use header::{
    AuthSlot, ConversationSlots, HeaderBranch, HeaderController, HeaderInputs, HeaderView,
    UnknownAffordance, UserAffordance, header_view,
};
pub use listener::{
    ElementPath, ListenerError, ListenerGuard, PointerDown, PointerEventHub, PointerTarget,
};
pub use session::{AuthPresence, SessionIdentity};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
pub use telemetry::{
    APP_INITIALIZED_EVENT, ClientEnvironment, RecordingTelemetrySink, TelemetryError,
    TelemetryRecord, TelemetrySink, app_initialized_record, emit_best_effort,
};
pub use theme::{
    PREFERS_DARK_MEDIA_QUERY, THEME_ATTRIBUTE, THEME_STORAGE_KEY, ThemeStore, ThemeValue,
    UnknownTheme, inline_bootstrap_script, resolve_theme,
};
pub use user_menu::{MenuState, USER_MENU_REGION_ID, UserMenuController};
