//! The persistent layout frame around the routed content.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

pub const SCROLL_POSITION_CACHE_LIMIT: usize = 256;

/// Per-route scroll offsets, remembered on the way out of a route and
/// restored on the way back in. Oldest routes are evicted first once the
/// cache is full.
#[derive(Debug, Clone, Default)]
pub struct ScrollRestoration {
    positions: HashMap<String, i32>,
    order: VecDeque<String>,
}

impl ScrollRestoration {
    pub fn remember(&mut self, route: &str, scroll_top: i32) {
        if self.positions.insert(route.to_string(), scroll_top).is_none() {
            self.order.push_back(route.to_string());
        }
        while self.positions.len() > SCROLL_POSITION_CACHE_LIMIT {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.positions.remove(&oldest);
        }
    }

    pub fn restore(&self, route: &str) -> Option<i32> {
        self.positions.get(route).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Client bundles in attach order, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptManifest {
    bundles: Vec<String>,
    attached: Vec<String>,
}

impl ScriptManifest {
    /// Builds a manifest from configured bundles; blank entries and repeats
    /// are dropped, first occurrence wins.
    pub fn new<I, S>(bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for bundle in bundles {
            let bundle = bundle.as_ref().trim();
            if !bundle.is_empty() && !unique.iter().any(|existing| existing == bundle) {
                unique.push(bundle.to_string());
            }
        }
        Self {
            bundles: unique,
            attached: Vec::new(),
        }
    }

    pub fn bundles(&self) -> &[String] {
        &self.bundles
    }

    /// Marks `bundle` attached. Returns `false` if it was already attached,
    /// in which case the caller must not attach it again.
    pub fn attach(&mut self, bundle: &str) -> bool {
        if self.is_attached(bundle) {
            return false;
        }
        self.attached.push(bundle.to_string());
        true
    }

    /// Attaches every bundle not yet attached and returns the newly attached
    /// ones in order.
    pub fn attach_pending(&mut self) -> Vec<String> {
        let pending: Vec<String> = self
            .bundles
            .iter()
            .filter(|bundle| !self.is_attached(bundle))
            .cloned()
            .collect();
        for bundle in &pending {
            self.attached.push(bundle.clone());
        }
        pending
    }

    pub fn is_attached(&self, bundle: &str) -> bool {
        self.attached.iter().any(|attached| attached == bundle)
    }
}

#[derive(Debug, Clone)]
pub struct ShellFrame {
    route: String,
    scroll: ScrollRestoration,
    scripts: ScriptManifest,
}

impl ShellFrame {
    pub fn new(route: impl Into<String>, scripts: ScriptManifest) -> Self {
        Self {
            route: route.into(),
            scroll: ScrollRestoration::default(),
            scripts,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Records `current_scroll_top` for the route being left and returns the
    /// offset to apply on the destination, if one was remembered.
    pub fn navigate(&mut self, to: &str, current_scroll_top: i32) -> Option<i32> {
        self.scroll.remember(&self.route, current_scroll_top);
        debug!(from = %self.route, to, "frame navigation");
        self.route = to.to_string();
        self.scroll.restore(to)
    }

    pub fn scroll(&self) -> &ScrollRestoration {
        &self.scroll
    }

    pub fn scripts(&self) -> &ScriptManifest {
        &self.scripts
    }

    pub fn scripts_mut(&mut self) -> &mut ScriptManifest {
        &mut self.scripts
    }
}
