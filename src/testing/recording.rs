//! Recording progress reporter for event-order assertions.

use crate::progress::{ProgressReporter, ProgressUpdate, TaskHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One reporter invocation, captured in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    BatchStart {
        total: usize,
    },
    TaskStart {
        task: TaskHandle,
        document: String,
    },
    Update {
        task: TaskHandle,
        update: ProgressUpdate,
        description: String,
    },
    TaskComplete {
        task: TaskHandle,
        page_count: usize,
    },
    TaskFailed {
        task: TaskHandle,
        error: String,
    },
    BatchComplete {
        converted: usize,
        failed: usize,
    },
}

impl ProgressEvent {
    /// The task this event belongs to, if it is task-scoped.
    pub fn task(&self) -> Option<TaskHandle> {
        match self {
            ProgressEvent::TaskStart { task, .. }
            | ProgressEvent::Update { task, .. }
            | ProgressEvent::TaskComplete { task, .. }
            | ProgressEvent::TaskFailed { task, .. } => Some(*task),
            _ => None,
        }
    }
}

/// A [`ProgressReporter`] that records every event and tracks how many tasks
/// were simultaneously between their start and terminal events.
///
/// `max_active` is the observable form of the scheduler's concurrency cap:
/// a task counts as active from `on_task_start` until `on_task_complete` or
/// `on_task_failed`, exactly the window in which it occupies a slot.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event, in arrival order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events belonging to one task, in arrival order.
    pub fn events_for(&self, task: TaskHandle) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.task() == Some(task))
            .cloned()
            .collect()
    }

    /// The task's progress percentage after each of its updates, applied in
    /// order with the same clamping the pipeline uses.
    pub fn percent_trace(&self, task: TaskHandle) -> Vec<u8> {
        let mut percent: u8 = 0;
        let mut trace = Vec::new();
        for event in self.events.lock().unwrap().iter() {
            if let ProgressEvent::Update {
                task: event_task,
                update,
                ..
            } = event
            {
                if *event_task != task {
                    continue;
                }
                percent = match update {
                    ProgressUpdate::Advance(points) => percent.saturating_add(*points).min(100),
                    ProgressUpdate::Set(value) => (*value).min(100).max(percent),
                };
                trace.push(percent);
            }
        }
        trace
    }

    /// Highest number of tasks that were ever active at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_batch_start(&self, total_documents: usize) {
        self.record(ProgressEvent::BatchStart {
            total: total_documents,
        });
    }

    fn on_task_start(&self, task: TaskHandle, document: &str) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.record(ProgressEvent::TaskStart {
            task,
            document: document.to_string(),
        });
    }

    fn on_update(&self, task: TaskHandle, update: ProgressUpdate, description: &str) {
        self.record(ProgressEvent::Update {
            task,
            update,
            description: description.to_string(),
        });
    }

    fn on_task_complete(&self, task: TaskHandle, page_count: usize) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.record(ProgressEvent::TaskComplete { task, page_count });
    }

    fn on_task_failed(&self, task: TaskHandle, error: &str) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.record(ProgressEvent::TaskFailed {
            task,
            error: error.to_string(),
        });
    }

    fn on_batch_complete(&self, converted: usize, failed: usize) {
        self.record(ProgressEvent::BatchComplete { converted, failed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_events_in_order_and_filters_by_task() {
        let reporter = RecordingReporter::new();
        reporter.on_batch_start(2);
        reporter.on_task_start(TaskHandle(0), "a");
        reporter.on_task_start(TaskHandle(1), "b");
        reporter.on_update(TaskHandle(0), ProgressUpdate::Advance(33), "rendered");
        reporter.on_task_failed(TaskHandle(1), "boom");
        reporter.on_task_complete(TaskHandle(0), 1);
        reporter.on_batch_complete(1, 1);

        assert_eq!(reporter.events().len(), 7);
        assert_eq!(reporter.events_for(TaskHandle(1)).len(), 2);
        assert_eq!(reporter.max_active(), 2);
    }

    #[test]
    fn percent_trace_applies_updates_cumulatively() {
        let reporter = RecordingReporter::new();
        let task = TaskHandle(0);
        reporter.on_update(task, ProgressUpdate::Advance(33), "one");
        reporter.on_update(task, ProgressUpdate::Advance(33), "two");
        reporter.on_update(task, ProgressUpdate::Advance(34), "three");
        reporter.on_update(task, ProgressUpdate::Set(100), "done");

        assert_eq!(reporter.percent_trace(task), vec![33, 66, 100, 100]);
    }
}
