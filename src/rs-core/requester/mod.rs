use crate::{playback::PlaybackSnapshot, utils::url::Url, Logger};

/// Options of a request about to be sent by the streaming engine.
///
/// Pre-send hooks receive it and return it, potentially with an updated `uri`.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
    pub uri: Url,
    /// HTTP method, `GET` unless the engine says otherwise.
    pub method: String,
    /// `true` if the engine told us this is an initialization segment.
    pub is_init_segment: bool,
}

impl RequestOptions {
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            method: "GET".to_owned(),
            is_init_segment: false,
        }
    }
}

/// Identifies a kind of `RequestHook` in a `RequestTransport`.
///
/// A transport never contains two hooks with the same `HookId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(pub &'static str);

/// Handler called synchronously before each request is sent.
pub trait RequestHook {
    fn id(&self) -> HookId;

    /// Called right before the request is sent, with the options produced by
    /// the hooks installed after this one.
    ///
    /// The returned options are given to the hooks installed before it, then
    /// used for the actual request.
    fn before_request(
        &mut self,
        options: RequestOptions,
        playback: &PlaybackSnapshot<'_>,
    ) -> RequestOptions;
}

/// The `RequestTransport` is the extension point through which all requests
/// of the streaming engine go before being sent.
///
/// It keeps an ordered chain of `RequestHook`. When a request is prepared,
/// the most recently installed hook runs first and each hook then delegates
/// to the previously-installed ones, so several interceptions compose.
#[derive(Default)]
pub struct RequestTransport {
    /// Hooks, from the oldest to the most recently installed.
    hooks: Vec<Box<dyn RequestHook>>,
}

impl RequestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a hook with the given `HookId` is part of the chain.
    pub fn is_installed(&self, id: HookId) -> bool {
        self.hooks.iter().any(|h| h.id() == id)
    }

    /// Add `hook` at the head of the chain.
    ///
    /// Does nothing and returns `false` if a hook with the same `HookId` was
    /// already installed.
    pub fn install(&mut self, hook: Box<dyn RequestHook>) -> bool {
        let id = hook.id();
        if self.is_installed(id) {
            Logger::debug(&format!("Req: hook `{}` already installed", id.0));
            return false;
        }
        Logger::info(&format!("Req: installing `{}` hook", id.0));
        self.hooks.push(hook);
        true
    }

    /// Remove the hook with the given `HookId` from the chain, returning
    /// `true` if one was found.
    pub fn uninstall(&mut self, id: HookId) -> bool {
        let len_before = self.hooks.len();
        self.hooks.retain(|h| h.id() != id);
        len_before != self.hooks.len()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Run `options` through the whole hook chain, newest hook first, and
    /// return the options the request should actually be sent with.
    pub fn prepare_request(
        &mut self,
        options: RequestOptions,
        playback: &PlaybackSnapshot<'_>,
    ) -> RequestOptions {
        Logger::lazy_debug(&|| {
            format!(
                "Req: preparing {} request u:{} ({} hook(s))",
                options.method,
                options.uri,
                self.hooks.len()
            )
        });
        self.hooks
            .iter_mut()
            .rev()
            .fold(options, |options, hook| hook.before_request(options, playback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Appends its own tag to the URL so the call order can be checked.
    struct Tagger(&'static str);

    impl RequestHook for Tagger {
        fn id(&self) -> HookId {
            HookId(self.0)
        }

        fn before_request(
            &mut self,
            mut options: RequestOptions,
            _playback: &PlaybackSnapshot<'_>,
        ) -> RequestOptions {
            options.uri = options.uri.with_query_fragment(self.0);
            options
        }
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut transport = RequestTransport::new();
        assert!(transport.install(Box::new(Tagger("a"))));
        assert!(!transport.install(Box::new(Tagger("a"))));
        assert_eq!(transport.hook_count(), 1);
        assert!(transport.is_installed(HookId("a")));
        assert!(!transport.is_installed(HookId("b")));
    }

    #[test]
    fn test_newest_hook_runs_first() {
        let mut transport = RequestTransport::new();
        transport.install(Box::new(Tagger("old")));
        transport.install(Box::new(Tagger("new")));
        let options = transport.prepare_request(
            RequestOptions::new(Url::from("https://a.com/s.ts")),
            &PlaybackSnapshot::empty(),
        );
        assert_eq!(options.uri.get_ref(), "https://a.com/s.ts?new&old");
        assert_eq!(options.method, "GET");
    }

    #[test]
    fn test_uninstall() {
        let mut transport = RequestTransport::new();
        transport.install(Box::new(Tagger("a")));
        transport.install(Box::new(Tagger("b")));
        assert!(transport.uninstall(HookId("a")));
        assert!(!transport.uninstall(HookId("a")));
        assert_eq!(transport.hook_count(), 1);
        let options = transport.prepare_request(
            RequestOptions::new(Url::from("s.ts")),
            &PlaybackSnapshot::empty(),
        );
        assert_eq!(options.uri.get_ref(), "s.ts?b");
    }

    #[test]
    fn test_empty_chain_keeps_options() {
        let mut transport = RequestTransport::new();
        let options = RequestOptions {
            uri: Url::from("https://a.com/init.mp4"),
            method: "HEAD".to_owned(),
            is_init_segment: true,
        };
        assert_eq!(
            transport.prepare_request(options.clone(), &PlaybackSnapshot::empty()),
            options
        );
    }
}
