//! End-to-end exchange: a producer manager streams structures and
//! operations over the loopback transport, a consumer manager drains and
//! replays them against its own mirror.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use vizlog::{
    DataStructure, InMemoryTransport, Locator, LogStreamManager, MessageKind, Operation, RawType,
    Settings, StreamListener,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<MessageKind>>);

struct RecorderListener(Arc<Recorder>);

impl StreamListener for RecorderListener {
    fn message_received(&self, kind: MessageKind) {
        self.0 .0.lock().push(kind);
    }
}

fn array(id: &str, values: &[f64]) -> DataStructure {
    let mut ds = DataStructure::new(id, RawType::Array, "", "", BTreeMap::new());
    for (i, v) in values.iter().enumerate() {
        ds.create_element(vec![i as i32], *v).unwrap();
    }
    ds
}

#[test]
fn produce_stream_replay_reconstructs_state() {
    let (producer_end, consumer_end) = InMemoryTransport::pair();
    let producer = LogStreamManager::new(Settings::for_agent("annotation-processor"), producer_end);
    let consumer = LogStreamManager::new(Settings::for_agent("gui"), consumer_end);

    let recorder = Arc::new(Recorder::default());
    consumer.set_listener(Box::new(RecorderListener(recorder.clone())));

    // Producer declares an array of three zeros plus a scratch variable and
    // records a write and a swap.
    producer.register_structure(array("A", &[0.0, 0.0, 0.0]));
    producer.register_structure(DataStructure::new(
        "tmp",
        RawType::IndependentElement,
        "",
        "",
        BTreeMap::new(),
    ));
    producer.append_operation(Operation::Write {
        target: Locator::new("A", vec![1]),
        value: vec![5.0],
    });
    producer.append_operation(Operation::Swap {
        var1: Locator::new("A", vec![1]),
        var2: Locator::new("A", vec![2]),
        value: [7.0, 5.0],
    });
    producer.stream_and_clear_log_data().unwrap();
    assert_eq!(producer.operation_count(), 0);

    // Delivery callback fires on the consumer side.
    consumer.on_message(MessageKind::Wrapper);
    assert_eq!(*recorder.0.lock(), vec![MessageKind::Wrapper]);
    assert_eq!(consumer.structure_count(), 2);

    // Replay the received log step by step.
    let ops = consumer.operations();
    assert_eq!(ops.len(), 2);
    consumer.apply_all(&ops).unwrap();

    let a = consumer.structure("A").unwrap();
    assert_eq!(a.value_at(&[1]), Some(7.0));
    assert_eq!(a.value_at(&[2]), Some(5.0));
    assert_eq!(a.element(&Locator::new("A", vec![1])).unwrap().counter().writes, 1);
    assert_eq!(a.element(&Locator::new("A", vec![1])).unwrap().counter().swaps, 1);
    assert_eq!(a.element(&Locator::new("A", vec![2])).unwrap().counter().swaps, 1);
    assert!(a.modified().contains(&vec![1]));
    assert!(a.modified().contains(&vec![2]));
}

#[test]
fn incremental_operation_batches_follow_a_declaration() {
    let (producer_end, consumer_end) = InMemoryTransport::pair();
    let producer = LogStreamManager::new(Settings::for_agent("producer"), producer_end);
    let consumer = LogStreamManager::new(Settings::for_agent("consumer"), consumer_end);
    let recorder = Arc::new(Recorder::default());
    consumer.set_listener(Box::new(RecorderListener(recorder.clone())));

    // Header-only wrapper first, then two body-only batches.
    let a = array("A", &[1.0, 2.0]);
    producer.stream_structure(&a).unwrap();
    producer
        .stream_operation(&Operation::Read {
            source: Locator::new("A", vec![0]),
            value: vec![1.0],
        })
        .unwrap();
    producer
        .stream_operations(&[Operation::Write {
            target: Locator::new("A", vec![0]),
            value: vec![9.0],
        }])
        .unwrap();

    consumer.on_message(MessageKind::Wrapper);
    assert_eq!(consumer.structure_count(), 1);
    assert_eq!(consumer.operation_count(), 2);
    assert_eq!(*recorder.0.lock(), vec![MessageKind::Wrapper]);
}

#[test]
fn persisted_log_restores_into_a_fresh_manager() {
    let dir = tempfile::tempdir().unwrap();
    let (producer_end, _consumer_end) = InMemoryTransport::pair();
    let mut settings = Settings::for_agent("producer");
    settings.pretty_printing = true;
    let producer = LogStreamManager::new(settings, producer_end);

    producer.register_structure(array("heap", &[3.0, 1.0, 2.0]));
    producer.append_operation(Operation::Swap {
        var1: Locator::new("heap", vec![0]),
        var2: Locator::new("heap", vec![1]),
        value: [1.0, 3.0],
    });
    let path = producer.write_log_auto_named(dir.path()).unwrap();
    assert_eq!(path.extension().unwrap(), "wrapper");

    let (fresh_end, _other) = InMemoryTransport::pair();
    let fresh = LogStreamManager::new(Settings::for_agent("gui"), fresh_end);
    fresh.read_log(&path).unwrap();
    assert_eq!(fresh.wrap(), producer.wrap());

    let ops = fresh.operations();
    fresh.apply_all(&ops).unwrap();
    let heap = fresh.structure("heap").unwrap();
    assert_eq!(heap.value_at(&[0]), Some(1.0));
    assert_eq!(heap.value_at(&[1]), Some(3.0));
}
