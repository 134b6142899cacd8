//! Subscription join processor
//!
//! Runs on the foreign-key side after the subscription shuffle. For each
//! `(CombinedKey, Change<ValueAndTimestamp<SubscriptionWrapper>>)` it looks up the
//! foreign value in the local table partition, applies the subscription's
//! [`Instruction`], and emits at most one `(primary key, SubscriptionResponseWrapper)`
//! re-keyed by the primary key so it can be routed back to its origin partition.
//!
//! The emitted timestamp is the later of the subscription timestamp and the foreign
//! value timestamp, so a result never precedes either input.

use super::combined_key::CombinedKey;
use super::instruction::Instruction;
use super::response::SubscriptionResponseWrapper;
use super::subscription::SubscriptionWrapper;
use crate::velostream::error::StreamsError;
use crate::velostream::processor::{
    PartitionTask, Processor, ProcessorContext, ProcessorSupplier, Record,
};
use crate::velostream::state::{Change, ValueAndTimestamp, ValueGetter, ValueGetterSupplier};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const PROCESSOR_NAME: &str = "SubscriptionJoinProcessor";

pub type SubscriptionRecord<F, P> =
    Record<CombinedKey<F, P>, Change<ValueAndTimestamp<SubscriptionWrapper<F>>>>;

pub type ResponseRecord<P, V> = Record<P, SubscriptionResponseWrapper<V>>;

/// Partition task running a subscription join processor
pub type SubscriptionJoinTask<F, P, V> = PartitionTask<
    CombinedKey<F, P>,
    Change<ValueAndTimestamp<SubscriptionWrapper<F>>>,
    P,
    SubscriptionResponseWrapper<V>,
>;

/// Counters shared by every processor instance of one supplier
#[derive(Debug, Default)]
pub struct SubscriptionJoinMetrics {
    processed: AtomicU64,
    forwarded: AtomicU64,
    suppressed: AtomicU64,
}

impl SubscriptionJoinMetrics {
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Subscriptions whose instruction produced no response
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

/// Creates [`SubscriptionJoinProcessor`] instances bound to a foreign table
pub struct SubscriptionJoinProcessorSupplier<F, V> {
    foreign_values: Arc<dyn ValueGetterSupplier<F, V>>,
    metrics: Arc<SubscriptionJoinMetrics>,
}

impl<F, V> SubscriptionJoinProcessorSupplier<F, V> {
    pub fn new(foreign_values: Arc<dyn ValueGetterSupplier<F, V>>) -> Self {
        Self {
            foreign_values,
            metrics: Arc::new(SubscriptionJoinMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<SubscriptionJoinMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<F, P, V> ProcessorSupplier<
    CombinedKey<F, P>,
    Change<ValueAndTimestamp<SubscriptionWrapper<F>>>,
    P,
    SubscriptionResponseWrapper<V>,
> for SubscriptionJoinProcessorSupplier<F, V>
where
    F: Send + 'static,
    P: Send + 'static,
    V: Send + 'static,
{
    fn get(
        &self,
    ) -> Box<
        dyn Processor<
                CombinedKey<F, P>,
                Change<ValueAndTimestamp<SubscriptionWrapper<F>>>,
                P,
                SubscriptionResponseWrapper<V>,
            >,
    > {
        Box::new(SubscriptionJoinProcessor {
            foreign_values_supplier: Arc::clone(&self.foreign_values),
            foreign_values: None,
            closed: false,
            metrics: Arc::clone(&self.metrics),
        })
    }

    fn store_names(&self) -> Vec<String> {
        self.foreign_values.store_names()
    }
}

pub struct SubscriptionJoinProcessor<F, V> {
    foreign_values_supplier: Arc<dyn ValueGetterSupplier<F, V>>,
    /// Bound once in `init`
    foreign_values: Option<Box<dyn ValueGetter<F, V>>>,
    /// A closed processor can never be initialized again
    closed: bool,
    metrics: Arc<SubscriptionJoinMetrics>,
}

impl<F, V> SubscriptionJoinProcessor<F, V> {
    fn forward<P>(
        &self,
        context: &mut dyn ProcessorContext<P, SubscriptionResponseWrapper<V>>,
        primary_key: P,
        response: SubscriptionResponseWrapper<V>,
        timestamp: i64,
    ) {
        context.forward(Record::new(primary_key, response, timestamp));
        self.metrics.forwarded.fetch_add(1, Ordering::Relaxed);
    }
}

impl<F, P, V> Processor<
    CombinedKey<F, P>,
    Change<ValueAndTimestamp<SubscriptionWrapper<F>>>,
    P,
    SubscriptionResponseWrapper<V>,
> for SubscriptionJoinProcessor<F, V>
where
    F: Send + 'static,
    P: Send + 'static,
    V: Send + 'static,
{
    fn init(
        &mut self,
        context: &mut dyn ProcessorContext<P, SubscriptionResponseWrapper<V>>,
    ) -> Result<(), StreamsError> {
        if self.foreign_values.is_some() || self.closed {
            return Err(StreamsError::AlreadyInitialized {
                processor: PROCESSOR_NAME.to_string(),
            });
        }
        let mut getter = self.foreign_values_supplier.get();
        getter.init(context.task_metadata())?;
        self.foreign_values = Some(getter);
        debug!(
            "{} initialized for task {} (stores {:?})",
            PROCESSOR_NAME,
            context.task_metadata().task_id,
            self.foreign_values_supplier.store_names()
        );
        Ok(())
    }

    fn process(
        &mut self,
        record: SubscriptionRecord<F, P>,
        context: &mut dyn ProcessorContext<P, SubscriptionResponseWrapper<V>>,
    ) -> Result<(), StreamsError> {
        let foreign_values =
            self.foreign_values
                .as_ref()
                .ok_or_else(|| StreamsError::NotInitialized {
                    processor: PROCESSOR_NAME.to_string(),
                })?;

        let key = record
            .key
            .ok_or_else(|| StreamsError::missing_field(PROCESSOR_NAME, "key"))?;
        let change = record
            .value
            .ok_or_else(|| StreamsError::missing_field(PROCESSOR_NAME, "value"))?;
        let subscription = change
            .new_value
            .ok_or_else(|| StreamsError::missing_field(PROCESSOR_NAME, "newValue"))?;

        let ValueAndTimestamp {
            value: wrapper,
            timestamp: subscription_ts,
        } = subscription;
        if let Err(e) = wrapper.check_version() {
            warn!("{} rejected subscription: {}", PROCESSOR_NAME, e);
            return Err(e);
        }
        self.metrics.processed.fetch_add(1, Ordering::Relaxed);

        let (foreign_key, primary_key) = key.into_parts();
        let foreign_value = match &wrapper.foreign_key {
            None => None,
            Some(_) => foreign_values.get(&foreign_key),
        };

        let result_ts = match &foreign_value {
            Some(found) => subscription_ts.max(found.timestamp),
            None => subscription_ts,
        };

        trace!(
            "Subscription {} at {} (foreign value present: {}, result ts {})",
            wrapper.instruction,
            subscription_ts,
            foreign_value.is_some(),
            result_ts
        );

        let hash = wrapper.primary_value_hash;
        let partition = wrapper.primary_partition;
        match wrapper.instruction {
            Instruction::DeleteKeyAndPropagate => {
                self.forward(
                    context,
                    primary_key,
                    SubscriptionResponseWrapper::new(hash, None, partition),
                    result_ts,
                );
            }
            Instruction::PropagateNullIfNoForeignValue => {
                // the extracted foreign key changed; downstream must learn there is no match
                let value = foreign_value.map(|found| found.value);
                self.forward(
                    context,
                    primary_key,
                    SubscriptionResponseWrapper::new(hash, value, partition),
                    result_ts,
                );
            }
            Instruction::PropagateOnlyIfForeignValueAvailable => match foreign_value {
                Some(found) => {
                    self.forward(
                        context,
                        primary_key,
                        SubscriptionResponseWrapper::new(hash, Some(found.value), partition),
                        result_ts,
                    );
                }
                None => {
                    self.metrics.suppressed.fetch_add(1, Ordering::Relaxed);
                }
            },
            Instruction::DeleteKeyNoPropagate => {
                self.metrics.suppressed.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        if let Some(mut getter) = self.foreign_values.take() {
            getter.close();
        }
    }
}
