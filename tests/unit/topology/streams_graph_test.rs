use std::sync::Arc;
use std::time::Duration;
use velostream_fkjoin::velostream::error::TopologyError;
use velostream_fkjoin::velostream::fkjoin::{
    CombinedKey, Instruction, SubscriptionJoinProcessorSupplier, SubscriptionJoinTask,
    SubscriptionWrapper,
};
use velostream_fkjoin::velostream::processor::{PartitionTask, Record, TaskId, TaskMetadata};
use velostream_fkjoin::velostream::state::{
    Change, InMemoryTable, ValueAndTimestamp, ValueGetterSupplier,
};
use velostream_fkjoin::velostream::topology::{
    GraphNode, ProcessorGraphNode, ProcessorParameters, SourceNode, StoreDescriptor,
    StreamTableJoinNode, StreamsGraph, TableSourceNode,
};

fn table_source(name: &str, store: StoreDescriptor) -> TableSourceNode {
    TableSourceNode {
        name: name.to_string(),
        topic: format!("{}-topic", name),
        store,
    }
}

fn stream_source(name: &str) -> SourceNode {
    SourceNode {
        name: name.to_string(),
        topics: vec![format!("{}-topic", name)],
    }
}

fn join(name: &str, store: &str, table: &str, grace: Option<Duration>) -> StreamTableJoinNode {
    StreamTableJoinNode::new(
        name,
        ProcessorParameters::new(name, ()),
        vec![store.to_string()],
        Some(table.to_string()),
        grace,
    )
    .with_parents(["orders"])
}

#[test]
fn test_build_reports_every_invalid_join() {
    let mut graph = StreamsGraph::new();
    graph
        .add_node(table_source("customers", StoreDescriptor::key_value("customers-store")))
        .unwrap();
    graph
        .add_node(table_source(
            "products",
            StoreDescriptor::versioned("products-store", Duration::from_secs(10)),
        ))
        .unwrap();
    graph.add_node(stream_source("orders")).unwrap();
    graph
        .add_node(join(
            "join-customers",
            "customers-store",
            "customers",
            Some(Duration::from_secs(1)),
        ))
        .unwrap();
    graph
        .add_node(join(
            "join-products",
            "products-store",
            "products",
            Some(Duration::from_secs(30)),
        ))
        .unwrap();

    let err = graph.build().unwrap_err();

    assert_eq!(err.errors.len(), 2);
    assert!(matches!(
        &err.errors[0],
        TopologyError::UnversionedStore { store_name } if store_name == "customers-store"
    ));
    assert!(matches!(
        &err.errors[1],
        TopologyError::HistoryRetentionTooShort { store_name, .. } if store_name == "products-store"
    ));
    let message = err.to_string();
    assert!(message.starts_with("Topology construction failed with 2 error(s)"));
    assert!(message.contains("customers-store") && message.contains("products-store"));
}

#[test]
fn test_graph_rejects_duplicates_and_unknown_parents() {
    let mut graph = StreamsGraph::new();
    graph.add_node(stream_source("orders")).unwrap();

    assert_eq!(
        graph.add_node(stream_source("orders")),
        Err(TopologyError::DuplicateNode {
            name: "orders".to_string()
        })
    );

    let orphan = ProcessorGraphNode {
        parents: vec!["missing".to_string()],
        processor_parameters: ProcessorParameters::new("mapper", ()),
    };
    assert_eq!(
        graph.add_node(orphan),
        Err(TopologyError::UnknownParent {
            node: "mapper".to_string(),
            parent: "missing".to_string()
        })
    );
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_join_against_unknown_store_fails_build() {
    let mut graph = StreamsGraph::new();
    graph.add_node(stream_source("orders")).unwrap();
    graph
        .add_node(table_source("customers", StoreDescriptor::key_value("customers-store")))
        .unwrap();
    graph
        .add_node(join("join", "not-a-store", "customers", None))
        .unwrap();

    let err = graph.build().unwrap_err();
    assert_eq!(
        err.errors,
        vec![TopologyError::UnknownStore {
            processor: "join".to_string(),
            store_name: "not-a-store".to_string()
        }]
    );
}

#[test]
fn test_built_topology_runs_subscription_join() {
    let customers: InMemoryTable<String, String> = InMemoryTable::new("customers-store");
    customers.put("c1".to_string(), "Alice".to_string(), 100);
    let supplier = SubscriptionJoinProcessorSupplier::new(
        Arc::new(customers.value_getter_supplier()) as Arc<dyn ValueGetterSupplier<String, String>>
    );

    let mut graph = StreamsGraph::new();
    graph.add_node(stream_source("orders")).unwrap();
    graph
        .add_node(table_source(
            "customers",
            StoreDescriptor::versioned("customers-store", Duration::from_secs(60)),
        ))
        .unwrap();
    graph
        .add_node(
            StreamTableJoinNode::new(
                "fk-join",
                ProcessorParameters::new("fk-join", supplier),
                vec!["customers-store".to_string()],
                Some("customers".to_string()),
                Some(Duration::from_secs(5)),
            )
            .with_parents(["orders"]),
        )
        .unwrap();
    assert_eq!(graph.nodes()[2].node_name(), "fk-join");

    let topology = graph.build().unwrap();
    assert_eq!(topology.parents("fk-join"), Some(&["orders".to_string()][..]));
    assert!(topology.describe().contains("fk-join"));

    let supplier = topology
        .processor_supplier::<SubscriptionJoinProcessorSupplier<String, String>>("fk-join")
        .unwrap();
    let mut task: SubscriptionJoinTask<String, String, String> = PartitionTask::new(
        supplier.as_ref(),
        TaskMetadata::new("graph-test", TaskId::new(0, 0)),
    );
    task.init().unwrap();

    let wrapper = SubscriptionWrapper::new(
        None,
        Instruction::PropagateOnlyIfForeignValueAvailable,
        Some("c1".to_string()),
        0,
    );
    let output = task
        .process(Record::new(
            CombinedKey::new("c1".to_string(), "order-1".to_string()),
            Change::insert(ValueAndTimestamp::new(wrapper, 50)),
            50,
        ))
        .unwrap();

    assert_eq!(output.len(), 1);
    assert_eq!(output[0].key.as_deref(), Some("order-1"));
    assert_eq!(output[0].timestamp, 100);
    assert_eq!(
        output[0].value.as_ref().and_then(|v| v.foreign_value.as_deref()),
        Some("Alice")
    );
}

#[test]
fn test_processor_chained_under_join_node() {
    let mut graph = StreamsGraph::new();
    graph.add_node(stream_source("orders")).unwrap();
    graph
        .add_node(table_source("customers", StoreDescriptor::key_value("customers-store")))
        .unwrap();
    graph
        .add_node(
            StreamTableJoinNode::new(
                "join-node",
                ProcessorParameters::new("join-processor", ()),
                vec!["customers-store".to_string()],
                Some("customers".to_string()),
                None,
            )
            .with_parents(["orders"]),
        )
        .unwrap();
    graph
        .add_node(ProcessorGraphNode {
            parents: vec!["join-node".to_string()],
            processor_parameters: ProcessorParameters::new("enriched-sink", ()),
        })
        .unwrap();

    let topology = graph.build().unwrap();

    assert!(topology.contains_node("join-processor"));
    assert!(!topology.contains_node("join-node"));
    assert_eq!(
        topology.parents("enriched-sink"),
        Some(&["join-processor".to_string()][..])
    );
}
