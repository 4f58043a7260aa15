//!
//! An optional-valued computation that can be chained before it is run.
//!

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;

use crate::QueryResult;

///
/// A suspended `QueryResult<Option<T>>`.
///
/// Returned by `optional` on queries. The combinators compose further
/// optional steps without running anything; awaiting the value runs the
/// whole chain, short-circuiting on the first absent value or error.
///
#[must_use = "an Optional does nothing unless awaited"]
pub struct Optional<'a, T> {
    inner: BoxFuture<'a, QueryResult<Option<T>>>,
}

impl<'a, T: Send + 'a> Optional<'a, T> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = QueryResult<Option<T>>> + Send + 'a,
    {
        Self {
            inner: future.boxed(),
        }
    }

    pub fn some(value: T) -> Self {
        Self::new(future::ready(Ok(Some(value))))
    }

    pub fn none() -> Self {
        Self::new(future::ready(Ok(None)))
    }

    pub fn map<U, F>(self, func: F) -> Optional<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        Optional::new(self.inner.map(|result| result.map(|opt| opt.map(func))))
    }

    /// Continue with another optional computation when a value is present.
    pub fn and_then<U, F>(self, func: F) -> Optional<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> Optional<'a, U> + Send + 'a,
    {
        Optional::new(async move {
            match self.inner.await? {
                Some(value) => func(value).await,
                None => Ok(None),
            }
        })
    }

    /// Fall back to another optional computation when no value is present.
    pub fn or_else<F>(self, func: F) -> Self
    where
        F: FnOnce() -> Optional<'a, T> + Send + 'a,
    {
        Optional::new(async move {
            match self.inner.await? {
                Some(value) => Ok(Some(value)),
                None => func().await,
            }
        })
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnOnce(&T) -> bool + Send + 'a,
    {
        Optional::new(
            self.inner
                .map(|result| result.map(|opt| opt.filter(predicate))),
        )
    }

    /// Resolve to the value, or `default` when absent.
    pub fn unwrap_or(self, default: T) -> BoxFuture<'a, QueryResult<T>> {
        self.inner
            .map(|result| result.map(|opt| opt.unwrap_or(default)))
            .boxed()
    }
}

impl<'a, T> Future for Optional<'a, T> {
    type Output = QueryResult<Option<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CardinalityError;
    use crate::QueryError;

    #[tokio::test]
    async fn chains_short_circuit_on_none() -> QueryResult<()> {
        let called = std::sync::atomic::AtomicBool::new(false);

        let result = Optional::<i32>::none()
            .and_then(|v| {
                called.store(true, std::sync::atomic::Ordering::SeqCst);
                Optional::some(v + 1)
            })
            .await?;

        assert_eq!(result, None);
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
        Ok(())
    }

    #[tokio::test]
    async fn or_else_and_filter() -> QueryResult<()> {
        let value = Optional::some(3)
            .filter(|v| *v > 5)
            .or_else(|| Optional::some(10))
            .map(|v| v * 2)
            .await?;

        assert_eq!(value, Some(20));
        assert_eq!(Optional::<i32>::none().unwrap_or(7).await?, 7);
        Ok(())
    }

    #[tokio::test]
    async fn errors_propagate() {
        let failing = Optional::<i32>::new(async {
            Err::<Option<i32>, QueryError>(CardinalityError::TooMany { expected: "0 or 1" }.into())
        });

        let err = failing.or_else(|| Optional::some(1)).await.unwrap_err();
        assert!(matches!(err, QueryError::Cardinality(_)));
    }
}
