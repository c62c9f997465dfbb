use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::error::{ErrorKind, Result};

/// A handle used for awaiting on tasks spawned in `runtime::spawn`.
#[derive(Debug)]
pub(crate) struct AsyncJoinHandle<T>(tokio::task::JoinHandle<T>);

impl<T> AsyncJoinHandle<T> {
    pub(crate) fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::runtime::Handle::current();
        AsyncJoinHandle(handle.spawn(fut))
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl<T> Future for AsyncJoinHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A panic in the task is propagated; a task cancelled by its runtime shutting down is
        // reported as such.
        Pin::new(&mut self.0).poll(cx).map(|result| match result {
            Ok(output) => Ok(output),
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(_) => Err(ErrorKind::Shutdown.into()),
        })
    }
}
