//! Capability interface over the hosting Telegram WebApp runtime.
//!
//! The session never touches the host directly; it only calls this trait.
//! That keeps reconciliation and validation testable without any Telegram
//! dependency, and models the "running outside Telegram" case explicitly.

/// The host environment the Mini App runs inside.
///
/// `ready` and `expand` are invoked once at startup; `send_data` and `close`
/// once at submission. All calls are fire-and-forget.
pub trait WebAppHost {
    fn ready(&self);
    fn expand(&self);
    fn send_data(&self, payload: &str);
    fn close(&self);

    /// Whether a real host is present. When `false` the session silently
    /// skips every host interaction, payload included.
    fn is_attached(&self) -> bool {
        true
    }
}

/// No-op host used when the form runs outside its Telegram container.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedHost;

impl WebAppHost for DetachedHost {
    fn ready(&self) {}

    fn expand(&self) {}

    fn send_data(&self, _payload: &str) {}

    fn close(&self) {}

    fn is_attached(&self) -> bool {
        false
    }
}
