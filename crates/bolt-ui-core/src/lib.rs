//! Header markup shared by the server renderer and the browser shell.
//!
//! The server renders the first pass from a [`HeaderView`] built without a
//! client capability; the shell re-renders the same element from the
//! controller's view and swaps it in place, so both sides must agree on ids
//! and data attributes. Those live here as constants.

use bolt_app_state::{AuthSlot, ConversationSlots, Gated, HeaderView, USER_MENU_REGION_ID};
use maud::{Markup, html};

pub const HEADER_ID: &str = "bolt-header";
pub const USER_MENU_TRIGGER_ID: &str = "bolt-user-menu-trigger";
pub const PROVIDER_USER_BUTTON_ID: &str = "bolt-provider-user-button";

/// Delegated click actions, read from `data-bolt-action` by the shell.
pub const ACTION_ATTRIBUTE: &str = "data-bolt-action";
pub const TOGGLE_USER_MENU_ACTION: &str = "toggle-user-menu";

/// Mount points the auth provider's script hydrates, read from
/// `data-auth-slot`.
pub const AUTH_SLOT_SIGN_UP: &str = "sign-up";
pub const AUTH_SLOT_SIGN_IN: &str = "sign-in";
pub const AUTH_SLOT_SIGN_OUT: &str = "sign-out";
pub const AUTH_SLOT_USER_BUTTON: &str = "user-button";

pub const LOGO_LIGHT_PATH: &str = "/logo-light-styled.png";
pub const LOGO_DARK_PATH: &str = "/logo-dark-styled.png";

/// Document-level ids and attributes the shell reads back after the server
/// pass.
pub const LOADER_DATA_ID: &str = "bolt-loader-data";
pub const OUTLET_ID: &str = "bolt-outlet";
pub const BUNDLE_ATTRIBUTE: &str = "data-bolt-bundle";
pub const USER_AFFORDANCE_ATTRIBUTE: &str = "data-user-affordance";

pub fn render_header(view: &HeaderView) -> Markup {
    let class = if view.bordered {
        "bolt-header bordered"
    } else {
        "bolt-header transparent"
    };

    html! {
        header id=(HEADER_ID) class=(class) data-branch=(view.branch.as_str()) {
            (brand())
            @if let Some(conversation) = &view.conversation {
                (conversation_region(conversation))
            }
            div class="bolt-header-auth" {
                (auth_slot(view.auth))
            }
        }
    }
}

pub fn render_header_string(view: &HeaderView) -> String {
    render_header(view).into_string()
}

fn brand() -> Markup {
    html! {
        div class="bolt-brand" {
            span class="i-ph:sidebar-simple-duotone bolt-sidebar-glyph" aria-hidden="true" {}
            a href="/" class="bolt-home-link" {
                img class="bolt-logo light-only" src=(LOGO_LIGHT_PATH) alt="logo";
                img class="bolt-logo dark-only" src=(LOGO_DARK_PATH) alt="logo";
            }
        }
    }
}

fn conversation_region(conversation: &Gated<ConversationSlots>) -> Markup {
    match conversation {
        Gated::Ready(_) => html! {
            span id=(ConversationSlots::DESCRIPTION_ID) class="bolt-chat-description" {}
            div id=(ConversationSlots::ACTIONS_ID) class="bolt-header-actions" {}
        },
        Gated::Placeholder => html! {
            span class="bolt-chat-description placeholder" aria-hidden="true" {}
        },
    }
}

fn auth_slot(slot: AuthSlot) -> Markup {
    match slot {
        AuthSlot::SignUpSignIn => html! {
            button type="button" class="bolt-auth-button primary"
                data-auth-slot=(AUTH_SLOT_SIGN_UP) data-mode="modal" { "Sign up" }
            button type="button" class="bolt-auth-button"
                data-auth-slot=(AUTH_SLOT_SIGN_IN) data-mode="modal" { "Sign in" }
        },
        AuthSlot::ProviderUserButton => html! {
            div id=(PROVIDER_USER_BUTTON_ID) data-auth-slot=(AUTH_SLOT_USER_BUTTON) {}
        },
        AuthSlot::UserMenu { expanded } => render_user_menu(expanded),
        AuthSlot::Empty => html! {},
    }
}

/// Inline module body that loads and initializes one client bundle.
pub fn bundle_loader_script(bundle: &str) -> String {
    let mut specifier = String::with_capacity(bundle.len() + 2);
    specifier.push('"');
    for ch in bundle.chars() {
        match ch {
            '"' => specifier.push_str("\\\""),
            '\\' => specifier.push_str("\\\\"),
            '<' => specifier.push_str("\\u003c"),
            ch if ch.is_control() => {}
            ch => specifier.push(ch),
        }
    }
    specifier.push('"');
    format!("import init from {specifier}; init();")
}

/// The custom user menu. The wrapper is the outside-click region.
pub fn render_user_menu(expanded: bool) -> Markup {
    html! {
        div id=(USER_MENU_REGION_ID) class="bolt-user-menu" {
            button id=(USER_MENU_TRIGGER_ID) type="button" class="bolt-user-menu-trigger"
                aria-haspopup="true"
                aria-expanded=(if expanded { "true" } else { "false" })
                data-bolt-action=(TOGGLE_USER_MENU_ACTION) {
                span class="i-ph:user-circle-duotone" aria-hidden="true" {}
                span class="sr-only" { "Open user menu" }
            }
            @if expanded {
                div class="bolt-user-menu-overlay" role="menu" aria-orientation="vertical"
                    aria-labelledby=(USER_MENU_TRIGGER_ID) {
                    a href="#profile" class="bolt-user-menu-item" role="menuitem" { "Profile" }
                    button type="button" class="bolt-user-menu-item" role="menuitem"
                        data-auth-slot=(AUTH_SLOT_SIGN_OUT) { "Sign out" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bolt_app_state::{
        ClientCapability, HeaderBranch, HeaderInputs, MenuState, UserAffordance, header_view,
    };

    use super::*;

    fn view(started: bool, authenticated: bool, menu: MenuState) -> HeaderView {
        header_view(
            HeaderInputs {
                started,
                authenticated,
            },
            UserAffordance::CustomMenu,
            ClientCapability::Unavailable,
            menu,
        )
    }

    #[test]
    fn signed_out_header_renders_modal_auth_prompts() {
        let html = render_header_string(&view(false, false, MenuState::Closed));
        assert!(html.contains("class=\"bolt-header transparent\""));
        assert!(html.contains("data-auth-slot=\"sign-up\" data-mode=\"modal\""));
        assert!(html.contains("data-auth-slot=\"sign-in\" data-mode=\"modal\""));
        assert!(!html.contains(USER_MENU_REGION_ID));
        assert!(!html.contains("bolt-chat-description"));
    }

    #[test]
    fn closed_user_menu_exposes_collapsed_state() {
        let html = render_header_string(&view(false, true, MenuState::Closed));
        assert!(html.contains("aria-haspopup=\"true\""));
        assert!(html.contains("aria-expanded=\"false\""));
        assert!(!html.contains("role=\"menu\""));
        assert!(!html.contains("Sign up"));
    }

    #[test]
    fn open_user_menu_lists_profile_and_sign_out() {
        let html = render_user_menu(true).into_string();
        assert!(html.contains("aria-expanded=\"true\""));
        assert!(html.contains("role=\"menu\" aria-orientation=\"vertical\""));
        assert!(html.contains("href=\"#profile\""));
        assert!(html.contains("data-auth-slot=\"sign-out\""));
        assert_eq!(html.matches("role=\"menuitem\"").count(), 2);
    }

    #[test]
    fn started_header_on_server_pass_renders_placeholder_only() {
        let html = render_header_string(&view(true, false, MenuState::Closed));
        assert!(html.contains("class=\"bolt-header bordered\""));
        assert!(html.contains("bolt-chat-description placeholder"));
        assert!(!html.contains(ConversationSlots::ACTIONS_ID));
        assert!(!html.contains("data-auth-slot"));
    }

    #[test]
    fn client_pass_mounts_conversation_slots() {
        let client_view = header_view(
            HeaderInputs {
                started: true,
                authenticated: true,
            },
            UserAffordance::ProviderButton,
            ClientCapability::Available,
            MenuState::Closed,
        );
        assert_eq!(client_view.branch, HeaderBranch::UserAndConversation);
        let html = render_header_string(&client_view);
        assert!(html.contains(&format!("id=\"{}\"", ConversationSlots::DESCRIPTION_ID)));
        assert!(html.contains(&format!("id=\"{}\"", ConversationSlots::ACTIONS_ID)));
        assert!(html.contains(&format!("id=\"{PROVIDER_USER_BUTTON_ID}\"")));
        assert!(!html.contains(USER_MENU_TRIGGER_ID));
    }

    #[test]
    fn bundle_loader_quotes_the_specifier() {
        assert_eq!(
            bundle_loader_script("/assets/bolt_web_shell.js"),
            "import init from \"/assets/bolt_web_shell.js\"; init();"
        );
        let hostile = bundle_loader_script("/a\"</script>.js");
        assert!(!hostile.contains("</script>"));
        assert!(hostile.contains("\\\"\\u003c/script>"));
    }

    #[test]
    fn brand_region_carries_both_logos() {
        let html = render_header_string(&view(false, false, MenuState::Closed));
        assert!(html.contains(LOGO_LIGHT_PATH));
        assert!(html.contains(LOGO_DARK_PATH));
        assert!(html.contains("bolt-sidebar-glyph"));
    }
}
