use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type Handler<C> = Arc<dyn Fn(C, Value) -> HandlerFuture + Send + Sync>;

enum Message {
    Call { name: String, payload: Value },
    Closing,
}

/// Named async handlers reachable through queued, fire-and-forget calls.
pub struct Registry<C> {
    handlers: HashMap<String, Handler<C>>,
}

impl<C: Clone + Send + 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone + Send + 'static> Registry<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<F, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(C, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: Handler<C> = Arc::new(move |ctx: C, payload: Value| -> HandlerFuture {
            Box::pin(handler(ctx, payload))
        });
        self.handlers.insert(name.to_string(), handler);
    }

    /// Split into the client handed to callers and the worker that must be
    /// spawned to drain the queue.
    pub fn serve(self, ctx: C) -> (RpcClient, RpcWorker<C>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let names = self.handlers.keys().cloned().collect();
        let client = RpcClient {
            tx,
            names: Arc::new(names),
        };
        let worker = RpcWorker {
            rx,
            ctx,
            handlers: self.handlers,
        };
        (client, worker)
    }
}

#[derive(Clone)]
pub struct RpcClient {
    tx: mpsc::UnboundedSender<Message>,
    names: Arc<HashSet<String>>,
}

impl RpcClient {
    /// Queue a call and return immediately. Unknown names are rejected here,
    /// at the call site, rather than dropped by the worker.
    pub fn call(&self, name: &str, payload: Value) -> Result<()> {
        if !self.names.contains(name) {
            tracing::error!("Bridge call to unregistered method `{name}`");
            anyhow::bail!("bridge method `{name}` is not registered");
        }
        self.tx
            .send(Message::Call {
                name: name.to_string(),
                payload,
            })
            .map_err(|_| anyhow::anyhow!("bridge call queue is closed"))
    }

    /// Ask the worker to stop once it reaches this point in the queue.
    pub fn close(&self) {
        let _ = self.tx.send(Message::Closing);
    }

    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<_> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

pub struct RpcWorker<C> {
    rx: mpsc::UnboundedReceiver<Message>,
    ctx: C,
    handlers: HashMap<String, Handler<C>>,
}

impl<C: Clone + Send + 'static> RpcWorker<C> {
    /// Drain the queue in order, spawning one task per call, until closing.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            let (name, payload) = match message {
                Message::Closing => {
                    tracing::debug!("Bridge call queue closing");
                    break;
                }
                Message::Call { name, payload } => (name, payload),
            };
            let Some(handler) = self.handlers.get(&name) else {
                continue;
            };
            tracing::debug!("Dispatching bridge call `{name}`");
            let fut = (**handler)(self.ctx.clone(), payload);
            tokio::spawn(async move {
                if let Err(e) = fut.await {
                    tracing::error!("Bridge call `{name}` failed: {e:#}");
                }
            });
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    async fn echo(log: Log, payload: Value) -> Result<()> {
        log.lock().unwrap().push(payload.as_str().unwrap_or_default().to_string());
        Ok(())
    }

    async fn fail(_log: Log, _payload: Value) -> Result<()> {
        anyhow::bail!("boom")
    }

    fn registry() -> Registry<Log> {
        let mut reg = Registry::new();
        reg.register("echo", echo);
        reg.register("fail", fail);
        reg
    }

    #[tokio::test]
    async fn calls_are_dispatched_in_order_until_closing() {
        let log: Log = Arc::default();
        let (client, worker) = registry().serve(log.clone());
        client.call("echo", Value::from("one")).unwrap();
        client.call("fail", Value::Null).unwrap();
        client.call("echo", Value::from("two")).unwrap();
        client.close();
        client.call("echo", Value::from("late")).unwrap();

        worker.run().await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*log.lock().unwrap(), vec!["one", "two"]);

        // The worker is gone, so the queue rejects further calls.
        assert!(client.call("echo", Value::from("after")).is_err());
    }

    #[tokio::test]
    async fn unknown_method_fails_at_call_site() {
        let (client, _worker) = registry().serve(Arc::default());
        let err = client.call("open_file_dialog", Value::Null).unwrap_err();
        assert!(err.to_string().contains("not registered"));
        assert_eq!(client.methods(), vec!["echo", "fail"]);
    }
}
