use super::*;
use tokio::sync::mpsc;

/// Forwards every dispatched bundle into a channel.
pub struct ChannelSink(pub mpsc::UnboundedSender<(Peer, Bytes)>);

impl ChannelSink {
    pub fn new() -> (std::sync::Arc<Self>, mpsc::UnboundedReceiver<(Peer, Bytes)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (std::sync::Arc::new(Self(tx)), rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn dispatch(&self, peer: &Peer, bundle: Bytes) {
        _ = self.0.send((peer.clone(), bundle));
    }
}
