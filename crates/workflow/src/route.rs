//! Routing destinations (spec §3): where a task's result goes next.

use serde_json::Value;
use skein_core::TaskName;

/// One entry of a parallel fan-out: the destination task and, optionally,
/// the data it should receive. When `data` is `None` the dispatcher uses
/// the predecessor's own result instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelDestination {
    pub task: TaskName,
    pub data: Option<Value>,
}

/// Where a task's result is routed, resolved in priority order from
/// `redirectTo` > the return value's `next` > the registered router
/// (spec §9's "three overlapping mechanisms").
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget {
    /// No successor (the default router, `() => undefined`).
    Terminal,
    /// The explicit literal `"end"`: halts the workflow even if other
    /// tasks elsewhere could still run.
    End,
    /// A single successor, awaited sequentially.
    Next(TaskName),
    /// Multiple successors, dispatched concurrently.
    Parallel(Vec<ParallelDestination>),
}

impl RouteTarget {
    /// A parallel fan-out where every destination receives the same data
    /// (the predecessor's result).
    #[must_use]
    pub fn parallel_same(tasks: impl IntoIterator<Item = TaskName>) -> Self {
        Self::Parallel(
            tasks
                .into_iter()
                .map(|task| ParallelDestination { task, data: None })
                .collect(),
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal | Self::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_same_gives_every_destination_no_override_data() {
        let target = RouteTarget::parallel_same([TaskName::new("x"), TaskName::new("y")]);
        let RouteTarget::Parallel(destinations) = target else {
            panic!("expected parallel");
        };
        assert!(destinations.iter().all(|d| d.data.is_none()));
    }

    #[test]
    fn terminal_and_end_are_both_terminal() {
        assert!(RouteTarget::Terminal.is_terminal());
        assert!(RouteTarget::End.is_terminal());
        assert!(!RouteTarget::Next(TaskName::new("a")).is_terminal());
    }
}
