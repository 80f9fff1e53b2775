//! Root-level `use` and preloading.

use keel_ir::{Locator, Value};

use super::Loader;
use crate::fetch::Continuation;

impl Loader {
    /// Load and compile `ids` (resolved from the page root), then call
    /// `callback` with one interface per identifier, in order.
    ///
    /// Identifiers that do not resolve, never loaded, or failed produce
    /// `None` at their position; they never hold up their siblings. Pending
    /// preloads run first.
    ///
    /// ```text
    /// loader
    ///     .use_modules(["app/main"], |interfaces| { /* ... */ })
    ///     .use_modules(["analytics"], |_| {});
    /// ```
    pub fn use_modules<I, S>(
        &self,
        ids: I,
        callback: impl FnOnce(Vec<Option<Value>>) + 'static,
    ) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let loader = self.clone();
        self.run_preload(Box::new(move || loader.use_from(None, &ids, callback)));
        self
    }

    /// `use` relative to `referrer` (the root when `None`), without the
    /// leading preload.
    pub(crate) fn use_from(
        &self,
        referrer: Option<&Locator>,
        ids: &[String],
        callback: impl FnOnce(Vec<Option<Value>>) + 'static,
    ) {
        let locators: Vec<Option<Locator>> = ids
            .iter()
            .map(|id| self.resolve(id, referrer))
            .collect();
        let requested = locators.iter().flatten().cloned().collect();

        let loader = self.clone();
        self.load(requested, move || {
            // Modules may have queued preloads while loading.
            let compiler = loader.clone();
            loader.run_preload(Box::new(move || {
                let interfaces = locators
                    .iter()
                    .map(|locator| {
                        let module = compiler.0.registry.get(locator.as_ref()?.as_str())?;
                        compiler.compile(&module)
                    })
                    .collect();
                callback(interfaces);
            }));
        });
    }

    /// Load and compile the queued preloads, then continue.
    fn run_preload(&self, then: Continuation) {
        let ids = std::mem::take(&mut *self.0.preload.borrow_mut());
        if ids.is_empty() {
            then();
            return;
        }
        tracing::debug!(?ids, "preload");
        self.use_from(None, &ids, move |_| then());
    }
}
