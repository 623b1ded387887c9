use bolt_app_state::{
    ClientCapability, HeaderInputs, MenuState, ScriptManifest, SessionIdentity, UserAffordance,
    header_view, inline_bootstrap_script,
};
use bolt_ui_core::{LOADER_DATA_ID, OUTLET_ID, bundle_loader_script, render_header};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const FAVICON_PATH: &str = "/favicon.svg";
const FONT_STYLESHEET: &str =
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800&display=swap";

#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub title: String,
    pub path: String,
    pub identity: SessionIdentity,
    pub affordance: UserAffordance,
    pub stylesheets: Vec<String>,
    pub scripts: ScriptManifest,
}

/// Renders the full shell document for the server pass.
///
/// The conversation has never started from the server's point of view (the
/// chat store lives on the client), so only the two idle header branches are
/// possible here.
pub fn render_document(page: &DocumentPage) -> Result<String, serde_json::Error> {
    let loader_data = loader_data_json(&page.identity)?;
    let header = header_view(
        HeaderInputs {
            started: false,
            authenticated: page.identity.is_authenticated(),
        },
        page.affordance,
        ClientCapability::Unavailable,
        MenuState::Closed,
    );

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page.title) }
                link rel="icon" href=(FAVICON_PATH) type="image/svg+xml";
                @for stylesheet in &page.stylesheets {
                    link rel="stylesheet" href=(stylesheet);
                }
                link rel="preconnect" href="https://fonts.googleapis.com";
                link rel="preconnect" href="https://fonts.gstatic.com" crossorigin="anonymous";
                link rel="stylesheet" href=(FONT_STYLESHEET);
                script { (PreEscaped(inline_bootstrap_script())) }
                script type="application/json" id=(LOADER_DATA_ID) { (PreEscaped(loader_data)) }
            }
            body {
                div class="bolt-root" data-user-affordance=(page.affordance.as_str()) {
                    (render_header(&header))
                    main id=(OUTLET_ID) data-route=(page.path) {}
                }
                (scripts(&page.scripts))
            }
        }
    };

    Ok(markup.into_string())
}

/// The hydration payload. `<` is escaped so the JSON can never close its
/// surrounding script element.
pub fn loader_data_json(identity: &SessionIdentity) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(identity)?.replace('<', "\\u003c"))
}

fn scripts(manifest: &ScriptManifest) -> Markup {
    html! {
        @for bundle in manifest.bundles() {
            script type="module" data-bolt-bundle=(bundle) {
                (PreEscaped(bundle_loader_script(bundle)))
            }
        }
    }
}
