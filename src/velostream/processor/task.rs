//! Single-partition processor driver
//!
//! Each partition runs its processor on one thread, one record at a time. A fatal
//! error poisons the task: the engine is expected to tear it down, and any further
//! record is refused without reaching the processor.

use super::context::{RecordingContext, TaskMetadata};
use super::{Processor, ProcessorContext, ProcessorSupplier, Record};
use crate::velostream::error::StreamsError;
use log::{debug, error};

pub struct PartitionTask<KIn, VIn, KOut, VOut> {
    processor: Box<dyn Processor<KIn, VIn, KOut, VOut>>,
    context: RecordingContext<KOut, VOut>,
    initialized: bool,
    failure: Option<String>,
}

impl<KIn, VIn, KOut, VOut> PartitionTask<KIn, VIn, KOut, VOut> {
    /// Create a task with a fresh processor instance from `supplier`
    pub fn new(
        supplier: &dyn ProcessorSupplier<KIn, VIn, KOut, VOut>,
        metadata: TaskMetadata,
    ) -> Self {
        Self {
            processor: supplier.get(),
            context: RecordingContext::new(metadata),
            initialized: false,
            failure: None,
        }
    }

    pub fn metadata(&self) -> &TaskMetadata {
        self.context.task_metadata()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn init(&mut self) -> Result<(), StreamsError> {
        let task_id = self.metadata().task_id;
        if self.initialized {
            return Err(StreamsError::AlreadyInitialized {
                processor: format!("task {}", task_id),
            });
        }
        self.processor.init(&mut self.context)?;
        self.initialized = true;
        debug!("Initialized partition task {}", task_id);
        Ok(())
    }

    /// Process one record and return what the processor forwarded for it
    pub fn process(
        &mut self,
        record: Record<KIn, VIn>,
    ) -> Result<Vec<Record<KOut, VOut>>, StreamsError> {
        let task_id = self.metadata().task_id;
        if let Some(reason) = &self.failure {
            return Err(StreamsError::TaskFailed {
                task_id: task_id.to_string(),
                reason: reason.clone(),
            });
        }
        if !self.initialized {
            return Err(StreamsError::NotInitialized {
                processor: format!("task {}", task_id),
            });
        }

        match self.processor.process(record, &mut self.context) {
            Ok(()) => Ok(self.context.take_forwarded()),
            Err(e) => {
                error!(
                    "Partition task {} failed ({:?}): {}",
                    task_id,
                    e.classification(),
                    e
                );
                // drop partial output of the failed record
                self.context.take_forwarded();
                self.failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        self.processor.close();
        debug!("Closed partition task {}", self.metadata().task_id);
    }
}
