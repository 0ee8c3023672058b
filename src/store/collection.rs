use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use super::{JsonStore, StoreError};

/// Result of a mutation closure: whether the document must be written back.
pub enum Change<R> {
    Write(R),
    Keep(R),
}

/// One JSON document holding a whole collection.
///
/// Holds no cached copy: every read goes to disk, and every mutation runs
/// reload, apply and save under a per-document lock.
pub struct Collection<T> {
    store: Arc<JsonStore>,
    name: &'static str,
    lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Arc<JsonStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    /// Fresh snapshot of the document.
    pub async fn reload(&self) -> T {
        self.store.load(self.name, T::default()).await
    }

    /// Reload, apply `f`, and persist when it returns [`Change::Write`].
    ///
    /// A document that exists but cannot be read or parsed is an error; it is
    /// never replaced by a default.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> Change<R>) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.read::<T>(self.name).await?.unwrap_or_default();
        match f(&mut doc) {
            Change::Keep(out) => Ok(out),
            Change::Write(out) => {
                self.store.save(self.name, &doc).await?;
                Ok(out)
            }
        }
    }
}
