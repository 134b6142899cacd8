//! Foreign-key join demo
//!
//! Builds a small orders -> customers foreign-key join topology, validates it, then
//! drives a handful of subscriptions through one partition task and prints the
//! responses that would be routed back to the orders side.

use clap::Parser;
use log::{error, info};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use velostream_fkjoin::velostream::config::ForeignKeyJoinConfig;
use velostream_fkjoin::velostream::error::StreamsError;
use velostream_fkjoin::velostream::fkjoin::{
    CombinedKey, CombinedKeyPartitioner, Instruction, SubscriptionJoinProcessorSupplier,
    SubscriptionJoinTask, SubscriptionResponseWrapperSerde, SubscriptionWrapper,
    SubscriptionWrapperSerde, ValueHash,
};
use velostream_fkjoin::velostream::logging::init_logging;
use velostream_fkjoin::velostream::processor::{PartitionTask, Record, TaskId, TaskMetadata};
use velostream_fkjoin::velostream::serialization::StringSerde;
use velostream_fkjoin::velostream::state::{
    Change, InMemoryTable, ValueAndTimestamp, ValueGetterSupplier,
};
use velostream_fkjoin::velostream::topology::{
    ProcessorParameters, SourceNode, StoreDescriptor, StreamTableJoinNode, StreamsGraph,
    TableSourceNode,
};

const JOIN_PROCESSOR: &str = "orders-customers-subscription-join";
const CUSTOMERS_STORE: &str = "customers-store";

#[derive(Parser)]
#[command(name = "fkjoin-demo")]
#[command(about = "Velostream foreign-key join subscription demo")]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Join grace period in milliseconds (overrides the config file)
    #[arg(long)]
    grace_period_ms: Option<u64>,

    /// History retention of the versioned customers store in milliseconds
    #[arg(long, default_value = "60000")]
    history_retention_ms: u64,

    /// Materialize customers in a plain key-value store instead of a versioned one
    #[arg(long)]
    unversioned: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("fkjoin-demo failed: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ForeignKeyJoinConfig::from_yaml_file(path)?,
        None => ForeignKeyJoinConfig::default(),
    };
    if let Some(ms) = cli.grace_period_ms {
        config = config.with_grace_period(Duration::from_millis(ms));
    }
    info!(
        "Application '{}' with {} partition(s), grace period {:?}",
        config.application_id,
        config.num_partitions,
        config.grace_period()
    );

    let customers: InMemoryTable<String, String> = InMemoryTable::new(CUSTOMERS_STORE);
    let supplier = SubscriptionJoinProcessorSupplier::new(
        Arc::new(customers.value_getter_supplier()) as Arc<dyn ValueGetterSupplier<String, String>>
    );
    let metrics = supplier.metrics();

    let store = if cli.unversioned {
        StoreDescriptor::key_value(CUSTOMERS_STORE)
    } else {
        StoreDescriptor::versioned(
            CUSTOMERS_STORE,
            Duration::from_millis(cli.history_retention_ms),
        )
    };

    let mut graph = StreamsGraph::new();
    graph.add_node(TableSourceNode {
        name: "customers-source".to_string(),
        topic: "customers".to_string(),
        store,
    })?;
    graph.add_node(SourceNode {
        name: "subscriptions-source".to_string(),
        topics: vec!["orders-subscription-registration".to_string()],
    })?;
    graph.add_node(
        StreamTableJoinNode::new(
            JOIN_PROCESSOR,
            ProcessorParameters::new(JOIN_PROCESSOR, supplier),
            vec![CUSTOMERS_STORE.to_string()],
            Some("customers-source".to_string()),
            config.grace_period(),
        )
        .with_parents(["subscriptions-source"]),
    )?;

    let topology = graph.build()?;
    info!("Topology:\n{}", topology.describe());

    let join_supplier = topology
        .processor_supplier::<SubscriptionJoinProcessorSupplier<String, String>>(JOIN_PROCESSOR)
        .ok_or_else(|| format!("processor '{}' not found in topology", JOIN_PROCESSOR))?;

    customers.put("c1".to_string(), "Alice".to_string(), 200);
    customers.put("c2".to_string(), "Bob".to_string(), 50);

    let partitioner = CombinedKeyPartitioner::new(StringSerde, config.num_partitions);
    let partition = partitioner.partition_for_foreign_key(&"c1".to_string())?;
    let mut task: SubscriptionJoinTask<String, String, String> = PartitionTask::new(
        join_supplier.as_ref(),
        TaskMetadata::new(config.application_id.clone(), TaskId::new(1, partition)),
    );
    task.init()?;

    let subscription_serde = SubscriptionWrapperSerde::new(StringSerde);
    let response_serde = SubscriptionResponseWrapperSerde::new(StringSerde);

    let scenarios = [
        ("order-1", "c1", Instruction::PropagateOnlyIfForeignValueAvailable, 100),
        ("order-2", "c9", Instruction::PropagateOnlyIfForeignValueAvailable, 100),
        ("order-3", "c9", Instruction::PropagateNullIfNoForeignValue, 100),
        ("order-4", "c2", Instruction::DeleteKeyAndPropagate, 300),
        ("order-5", "c2", Instruction::DeleteKeyNoPropagate, 300),
    ];

    for (order, customer, instruction, ts) in scenarios {
        let wrapper = SubscriptionWrapper::new(
            Some(ValueHash::of(order.as_bytes())),
            instruction,
            Some(customer.to_string()),
            0,
        );
        // the subscription crosses a shuffle, so go through the wire format
        let wire = subscription_serde.encode(&wrapper)?;
        let wrapper = subscription_serde.decode(&wire)?;

        let record = Record::new(
            CombinedKey::new(customer.to_string(), order.to_string()),
            Change::insert(ValueAndTimestamp::new(wrapper, ts)),
            ts,
        );
        let responses = task.process(record)?;
        if responses.is_empty() {
            info!("{} -> {} ({}): no response", order, customer, instruction);
        }
        for response in responses {
            let value = response
                .value
                .ok_or_else(|| StreamsError::missing_field("fkjoin-demo", "value"))?;
            let bytes = response_serde.encode(&value)?;
            info!(
                "{} -> {} ({}): foreign value {:?} at {} ({} bytes on the wire)",
                order,
                customer,
                instruction,
                value.foreign_value,
                response.timestamp,
                bytes.len()
            );
        }
    }

    task.close();
    info!(
        "Processed {} subscription(s): {} forwarded, {} suppressed",
        metrics.processed(),
        metrics.forwarded(),
        metrics.suppressed()
    );
    Ok(())
}
