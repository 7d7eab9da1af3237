//! Deferred resource outputs.
//!
//! An [`Output`] is a value the engine fills in after a declaration has been
//! accepted: a resource id, a provider-computed field. It is written once and
//! read by any number of consumers. Consumers never block on it; they chain
//! continuations with [`Output::apply`] and the chain runs when somebody
//! finally awaits the result.

use std::fmt;
use std::future::Future;

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};

use crate::error::OutputError;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, OutputError>>>;

/// Write-once, read-many deferred value.
pub struct Output<T> {
    inner: SharedResult<T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Output<T>
where
    T: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.peek() {
            Some(Ok(value)) => f.debug_tuple("Output").field(value).finish(),
            Some(Err(err)) => f.debug_tuple("Output").field(err).finish(),
            None => f.write_str("Output(<pending>)"),
        }
    }
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a future. Nothing runs until the output is first awaited.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, OutputError>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// An output that is already known.
    pub fn resolved(value: T) -> Self {
        Self::from_future(future::ready(Ok(value)))
    }

    /// An output that has already failed.
    pub fn failed(err: OutputError) -> Self {
        Self::from_future(future::ready(Err(err)))
    }

    /// An output filled in later through the returned sender.
    pub fn pending() -> (OutputSender<T>, Self) {
        let (tx, rx) = oneshot::channel();
        let output =
            Self::from_future(async move { rx.await.unwrap_or(Err(OutputError::Dropped)) });
        (OutputSender { tx }, output)
    }

    /// Chain a continuation that runs once, when the value is known.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U, OutputError> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move { f(inner.await?) })
    }

    /// Infallible form of [`Output::apply`].
    pub fn map<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.apply(move |value| Ok(f(value)))
    }

    /// Pair this output with another.
    pub fn zip<U>(&self, other: &Output<U>) -> Output<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        let left = self.inner.clone();
        let right = other.inner.clone();
        Output::from_future(future::try_join(left, right))
    }

    /// Combine outputs, keeping their order. The first failure wins.
    pub fn all(outputs: impl IntoIterator<Item = Output<T>>) -> Output<Vec<T>> {
        let pending: Vec<_> = outputs.into_iter().map(|o| o.inner).collect();
        Output::from_future(future::try_join_all(pending))
    }

    /// Wait for the value.
    pub async fn resolve(&self) -> Result<T, OutputError> {
        self.inner.clone().await
    }

    /// The value, if it can be produced without waiting.
    pub fn try_now(&self) -> Option<Result<T, OutputError>> {
        self.inner.clone().now_or_never()
    }
}

/// Writing half of [`Output::pending`].
#[derive(Debug)]
pub struct OutputSender<T> {
    tx: oneshot::Sender<Result<T, OutputError>>,
}

impl<T> OutputSender<T> {
    pub fn resolve(self, value: T) {
        // A closed receiver means nobody reads this output anymore.
        let _ = self.tx.send(Ok(value));
    }

    pub fn fail(self, err: OutputError) {
        let _ = self.tx.send(Err(err));
    }
}
