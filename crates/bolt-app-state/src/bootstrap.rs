//! Once-per-load application bootstrap.
//!
//! Order on the client: [`AppShell::start`] applies the resolved theme to the
//! document root synchronously, [`AppShell::mount`] attaches the client
//! bundles inside the persistent frame, and [`AppShell::report_initialized`]
//! emits the single startup telemetry record afterwards. [`AppShell::boot`]
//! runs the three in that order.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cell::{CellReader, CellWriter, Subscription, reactive_cell};
use crate::frame::{ScriptManifest, ShellFrame};
use crate::session::{AuthPresence, SessionIdentity};
use crate::storage::KeyValueStorage;
use crate::telemetry::{ClientEnvironment, TelemetrySink, app_initialized_record, emit_best_effort};
use crate::theme::{THEME_ATTRIBUTE, ThemeStore, ThemeValue};

/// The document's root element, as far as the shell needs it.
pub trait DocumentRoot {
    fn set_root_attribute(&self, name: &str, value: &str);
}

pub struct BootstrapContext {
    /// Server-resolved identity from the hydration payload.
    pub identity: SessionIdentity,
    pub storage: Rc<dyn KeyValueStorage>,
    pub prefers_dark: bool,
    pub environment: ClientEnvironment,
    pub route: String,
    pub scripts: ScriptManifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootPhase {
    Started,
    Mounted,
    Initialized,
}

pub struct AppShell {
    identity: SessionIdentity,
    environment: ClientEnvironment,
    theme: ThemeStore,
    frame: ShellFrame,
    auth: CellWriter<AuthPresence>,
    phase: BootPhase,
    telemetry_emitted: bool,
    _theme_sync: Subscription,
}

impl AppShell {
    pub fn start(context: BootstrapContext, root: Rc<dyn DocumentRoot>) -> Self {
        let BootstrapContext {
            identity,
            storage,
            prefers_dark,
            environment,
            route,
            scripts,
        } = context;

        let theme = ThemeStore::load(storage, prefers_dark);
        root.set_root_attribute(THEME_ATTRIBUTE, theme.get().as_str());
        let theme_sync = theme.subscribe(move |value: &ThemeValue| {
            root.set_root_attribute(THEME_ATTRIBUTE, value.as_str());
        });

        let (auth, _) = reactive_cell(identity.presence());
        debug!(
            theme = theme.get().as_str(),
            authenticated = identity.is_authenticated(),
            route = %route,
            "app shell started"
        );

        Self {
            identity,
            environment,
            theme,
            frame: ShellFrame::new(route, scripts),
            auth,
            phase: BootPhase::Started,
            telemetry_emitted: false,
            _theme_sync: theme_sync,
        }
    }

    /// Attaches every client bundle that is not attached yet and returns the
    /// ones the caller must now insert into the document.
    pub fn mount(&mut self) -> Vec<String> {
        let attached = self.frame.scripts_mut().attach_pending();
        if self.phase < BootPhase::Mounted {
            self.phase = BootPhase::Mounted;
        }
        attached
    }

    /// Emits the startup record once per load. Later calls are no-ops and
    /// return `false`. Sink failures never propagate.
    pub fn report_initialized(&mut self, sink: &dyn TelemetrySink, now: DateTime<Utc>) -> bool {
        if self.telemetry_emitted {
            return false;
        }
        self.telemetry_emitted = true;
        let record =
            app_initialized_record(self.theme.get(), &self.identity, &self.environment, now);
        emit_best_effort(sink, record);
        self.phase = BootPhase::Initialized;
        info!(route = %self.frame.route(), "application initialized");
        true
    }

    pub fn boot(
        context: BootstrapContext,
        root: Rc<dyn DocumentRoot>,
        sink: &dyn TelemetrySink,
        now: DateTime<Utc>,
    ) -> Self {
        let mut shell = Self::start(context, root);
        shell.mount();
        shell.report_initialized(sink, now);
        shell
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn frame(&self) -> &ShellFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut ShellFrame {
        &mut self.frame
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    pub fn auth_presence(&self) -> CellReader<AuthPresence> {
        self.auth.reader()
    }

    /// Forwards the auth collaborator's reactive signed-in signal. The
    /// server-resolved identity stays as it was for this load.
    pub fn set_signed_in(&self, signed_in: bool) -> bool {
        self.auth.set(AuthPresence::from_signed_in(signed_in))
    }

    /// Drops every subscriber on the shell-owned cells.
    pub fn teardown(&self) {
        self.theme.clear_subscribers();
        self.auth.clear_subscribers();
    }
}

impl fmt::Debug for AppShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppShell")
            .field("identity", &self.identity)
            .field("theme", &self.theme.get())
            .field("route", &self.frame.route())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
