//! Runs [`Request`]s on the tokio runtime and feeds replies back to the UI
//! thread over a channel.

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::api::TodoApi;
use crate::state::{Call, Reply, Request, Ticket};

#[derive(Debug)]
pub struct Settled {
    pub ticket: Ticket,
    pub reply: Reply,
}

pub struct Dispatcher {
    api: TodoApi,
    tx: UnboundedSender<Settled>,
    handle: Handle,
}

impl Dispatcher {
    pub fn new(api: TodoApi, handle: Handle) -> (Self, UnboundedReceiver<Settled>) {
        let (tx, rx) = unbounded_channel();
        (Self { api, tx, handle }, rx)
    }

    pub fn dispatch(&self, request: Request) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tracing::debug!(ticket = ?request.ticket, call = ?request.call, "dispatching");
        self.handle.spawn(async move {
            let reply = perform(&api, request.call).await;
            if tx.send(Settled { ticket: request.ticket, reply }).is_err() {
                tracing::debug!(ticket = ?request.ticket, "receiver gone; dropping reply");
            }
        });
    }
}

pub async fn perform(api: &TodoApi, call: Call) -> Reply {
    match call {
        Call::Load => Reply::Loaded(api.list().await),
        Call::Create { text } => Reply::Created(api.create(&text).await),
        Call::Update { id, patch } => Reply::Updated(api.update(&id, &patch).await),
        Call::Delete { id } => Reply::Deleted(api.delete(&id).await),
        Call::DeleteMany { ids } => Reply::DeletedMany(api.delete_many(&ids).await),
    }
}
