use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Asks the shell's router to leave the current view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigationOperation {
    RedirectTo { path: String },
}

impl Operation for NavigationOperation {
    type Output = ();
}

pub struct Navigator<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<Ev> Navigator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn redirect_to(&self, path: impl Into<String>) {
        let context = self.context.clone();
        let operation = NavigationOperation::RedirectTo { path: path.into() };
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}
