//! Capability-gated rendering.
//!
//! Regions that need browser-only APIs declare so by going through
//! [`ClientCapability::gate`]. Without a client execution context (the
//! server-rendered pass) they become a [`Gated::Placeholder`] and are swapped
//! for the real region once the shell reports the capability as available.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientCapability {
    Available,
    #[default]
    Unavailable,
}

impl ClientCapability {
    pub fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn gate<T>(self, build: impl FnOnce() -> T) -> Gated<T> {
        match self {
            Self::Available => Gated::Ready(build()),
            Self::Unavailable => Gated::Placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Placeholder,
    Ready(T),
}

impl<T> Gated<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Placeholder => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_capability_never_builds_the_region() {
        let built = std::cell::Cell::new(false);
        let gated = ClientCapability::Unavailable.gate(|| built.set(true));
        assert_eq!(gated, Gated::Placeholder);
        assert!(!built.get());
    }

    #[test]
    fn available_capability_builds_the_region() {
        let gated = ClientCapability::Available.gate(|| "toolbar");
        assert!(gated.is_ready());
        assert_eq!(gated.as_ready(), Some(&"toolbar"));
    }
}
