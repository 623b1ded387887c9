//! Session-aware header.
//!
//! [`header_view`] is the pure branch selection shared by the server renderer
//! and the browser shell. [`HeaderController`] is the mounted, client-side
//! owner: it watches the conversation and auth cells, keeps the user menu
//! mounted exactly while a signed-in branch is showing, and hands back a
//! fresh [`HeaderView`] on every render.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::debug;

use crate::capability::{ClientCapability, Gated};
use crate::cell::{CellReader, Subscription};
use crate::conversation::ConversationState;
use crate::listener::PointerEventHub;
use crate::session::AuthPresence;
use crate::user_menu::{MenuState, UserMenuController};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HeaderInputs {
    pub started: bool,
    pub authenticated: bool,
}

impl HeaderInputs {
    pub fn new(conversation: ConversationState, auth: AuthPresence) -> Self {
        Self {
            started: conversation.started,
            authenticated: auth.is_signed_in(),
        }
    }
}

/// The four mutually exclusive header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderBranch {
    /// Not started, signed out: sign-up and sign-in.
    AuthPrompts,
    /// Not started, signed in: user affordance only.
    UserOnly,
    /// Started, signed out: conversation region, no auth affordances.
    ConversationOnly,
    /// Started, signed in: user affordance and conversation region.
    UserAndConversation,
}

impl HeaderBranch {
    pub const ALL: [Self; 4] = [
        Self::AuthPrompts,
        Self::UserOnly,
        Self::ConversationOnly,
        Self::UserAndConversation,
    ];

    pub fn select(inputs: HeaderInputs) -> Self {
        match (inputs.started, inputs.authenticated) {
            (false, false) => Self::AuthPrompts,
            (false, true) => Self::UserOnly,
            (true, false) => Self::ConversationOnly,
            (true, true) => Self::UserAndConversation,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Self::AuthPrompts => 1,
            Self::UserOnly => 2,
            Self::ConversationOnly => 3,
            Self::UserAndConversation => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthPrompts => "auth-prompts",
            Self::UserOnly => "user-only",
            Self::ConversationOnly => "conversation-only",
            Self::UserAndConversation => "user-and-conversation",
        }
    }

    pub fn shows_auth_prompts(self) -> bool {
        matches!(self, Self::AuthPrompts)
    }

    pub fn shows_user_affordance(self) -> bool {
        matches!(self, Self::UserOnly | Self::UserAndConversation)
    }

    pub fn shows_conversation(self) -> bool {
        matches!(self, Self::ConversationOnly | Self::UserAndConversation)
    }
}

/// Which authenticated-user control the signed-in branches show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserAffordance {
    /// The in-house dropdown driven by [`UserMenuController`].
    #[default]
    CustomMenu,
    /// The auth provider's own user button; no controller is mounted.
    ProviderButton,
}

impl UserAffordance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomMenu => "custom",
            Self::ProviderButton => "provider",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user affordance '{0}' (expected custom or provider)")]
pub struct UnknownAffordance(pub String);

impl FromStr for UserAffordance {
    type Err = UnknownAffordance;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "custom" => Ok(Self::CustomMenu),
            "provider" => Ok(Self::ProviderButton),
            other => Err(UnknownAffordance(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSlot {
    SignUpSignIn,
    ProviderUserButton,
    UserMenu { expanded: bool },
    Empty,
}

/// Mount points the chat collaborator fills with its description and
/// contextual action toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationSlots;

impl ConversationSlots {
    pub const DESCRIPTION_ID: &'static str = "bolt-chat-description";
    pub const ACTIONS_ID: &'static str = "bolt-header-actions";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub branch: HeaderBranch,
    /// Border modifier; depends on `started` only.
    pub bordered: bool,
    pub auth: AuthSlot,
    /// `None` unless the branch shows the conversation region.
    pub conversation: Option<Gated<ConversationSlots>>,
}

pub fn header_view(
    inputs: HeaderInputs,
    affordance: UserAffordance,
    capability: ClientCapability,
    menu: MenuState,
) -> HeaderView {
    let branch = HeaderBranch::select(inputs);
    let auth = if branch.shows_auth_prompts() {
        AuthSlot::SignUpSignIn
    } else if branch.shows_user_affordance() {
        match affordance {
            UserAffordance::CustomMenu => AuthSlot::UserMenu {
                expanded: menu.is_open(),
            },
            UserAffordance::ProviderButton => AuthSlot::ProviderUserButton,
        }
    } else {
        AuthSlot::Empty
    };
    let conversation = branch
        .shows_conversation()
        .then(|| capability.gate(|| ConversationSlots));

    HeaderView {
        branch,
        bordered: inputs.started,
        auth,
        conversation,
    }
}

/// Client-side header owner. Read-only with respect to the conversation and
/// auth cells.
pub struct HeaderController {
    conversation: CellReader<ConversationState>,
    auth: CellReader<AuthPresence>,
    hub: PointerEventHub,
    affordance: UserAffordance,
    capability: ClientCapability,
    user_menu: Option<UserMenuController>,
    invalidated: Rc<Cell<bool>>,
    _subscriptions: [Subscription; 2],
}

impl HeaderController {
    pub fn mount(
        conversation: CellReader<ConversationState>,
        auth: CellReader<AuthPresence>,
        hub: PointerEventHub,
        affordance: UserAffordance,
        capability: ClientCapability,
    ) -> Self {
        let invalidated = Rc::new(Cell::new(true));
        let on_conversation = Rc::clone(&invalidated);
        let on_auth = Rc::clone(&invalidated);
        let subscriptions = [
            conversation.subscribe(move |_| on_conversation.set(true)),
            auth.subscribe(move |_| on_auth.set(true)),
        ];

        let mut controller = Self {
            conversation,
            auth,
            hub,
            affordance,
            capability,
            user_menu: None,
            invalidated,
            _subscriptions: subscriptions,
        };
        controller.reconcile_user_menu();
        controller
    }

    pub fn inputs(&self) -> HeaderInputs {
        HeaderInputs::new(self.conversation.get(), self.auth.get())
    }

    pub fn branch(&self) -> HeaderBranch {
        HeaderBranch::select(self.inputs())
    }

    /// Brings the user menu in line with the current branch and returns the
    /// view to draw. The menu instance, and with it its open state, survives
    /// any transition between the two signed-in branches.
    pub fn render(&mut self) -> HeaderView {
        self.invalidated.set(false);
        self.reconcile_user_menu();
        let menu = self
            .user_menu
            .as_ref()
            .map_or(MenuState::Closed, UserMenuController::state);
        header_view(self.inputs(), self.affordance, self.capability, menu)
    }

    /// Whether a cell or the user menu changed since the last render. Reading
    /// clears the flag.
    pub fn take_invalidated(&self) -> bool {
        self.invalidated.replace(false)
    }

    pub fn set_capability(&mut self, capability: ClientCapability) {
        if self.capability != capability {
            self.capability = capability;
            self.invalidated.set(true);
        }
    }

    pub fn capability(&self) -> ClientCapability {
        self.capability
    }

    pub fn affordance(&self) -> UserAffordance {
        self.affordance
    }

    pub fn user_menu(&self) -> Option<&UserMenuController> {
        self.user_menu.as_ref()
    }

    /// Toggles the mounted user menu, if any.
    pub fn toggle_user_menu(&self) -> Option<MenuState> {
        self.user_menu.as_ref().map(UserMenuController::toggle)
    }

    fn reconcile_user_menu(&mut self) {
        let wanted = self.branch().shows_user_affordance()
            && self.affordance == UserAffordance::CustomMenu;
        match (wanted, self.user_menu.is_some()) {
            (true, false) => {
                let menu = UserMenuController::mount(&self.hub);
                let invalidated = Rc::clone(&self.invalidated);
                menu.set_on_change(move |_| invalidated.set(true));
                debug!(branch = self.branch().as_str(), "user menu mounted");
                self.user_menu = Some(menu);
            }
            (false, true) => {
                if let Some(menu) = self.user_menu.take() {
                    menu.unmount();
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for HeaderController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderController")
            .field("inputs", &self.inputs())
            .field("affordance", &self.affordance)
            .field("capability", &self.capability)
            .field("user_menu", &self.user_menu)
            .finish_non_exhaustive()
    }
}
