use anyhow::anyhow;

use crate::models::changes::ModelChange;

/// The view layer's side of the projection.
///
/// Implementors receive every structural edit, content refresh and status change
/// in the order they happen. Errors are logged by the projection and never
/// interrupt the update that produced the change.
pub trait ModelObserver {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()>;
}

/// Records changes, mostly useful for adapters that batch updates per frame.
impl ModelObserver for Vec<ModelChange> {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()> {
        self.push(change);
        Ok(())
    }
}

/// Forwards changes to another thread, e.g. a UI event loop.
impl ModelObserver for crossbeam_channel::Sender<ModelChange> {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()> {
        self.send(change)
            .map_err(|_| anyhow!("model change receiver was dropped"))
    }
}

impl<O: ModelObserver + ?Sized> ModelObserver for &mut O {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()> {
        (**self).apply(change)
    }
}

impl<O: ModelObserver + ?Sized> ModelObserver for Box<O> {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()> {
        (**self).apply(change)
    }
}
