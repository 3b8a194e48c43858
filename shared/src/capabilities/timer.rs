use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    NotifyAfter { millis: u64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOutput {
    Elapsed,
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

/// One-shot delays resolved by the shell's clock.
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Raises `event` once `millis` have passed on the shell side.
    pub fn notify_after(&self, millis: u64, event: Ev)
    where
        Ev: Send,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let TimerOutput::Elapsed = context
                .request_from_shell(TimerOperation::NotifyAfter { millis })
                .await;
            context.update_app(event);
        });
    }
}
