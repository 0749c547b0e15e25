use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tributary::{
    DispatchCore, DispatchError, Dispatcher, DispatcherExt, ErrorKind, EventSource,
    FanInDispatcher, Handler, HandlerResult, IdlePolicy, MultiplexDispatcher, Priority,
    WithPayload,
    testing::{FailingHandler, RecordingHandler, eventually},
};
use tokio::sync::mpsc;

mod common;
use common::{Harness, PRIORITIES, TestEvent, event};

#[tokio::test]
async fn test_closed_dispatcher_rejects_register_and_connect() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        h.dispatcher.close().unwrap();

        for _ in 0..3 {
            let err = h
                .dispatcher
                .on("ping", RecordingHandler::<TestEvent>::new())
                .unwrap_err();
            assert!(matches!(err, DispatchError::Closed), "{priority:?}");

            let (_tx, rx) = mpsc::channel::<TestEvent>(1);
            let err = h.dispatcher.attach(rx).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Closed, "{priority:?}");
        }
        assert!(!h.dispatcher.deregister("ping"));
    }
}

#[tokio::test]
async fn test_register_then_dispatch_invokes_exactly_once() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let recorder = RecordingHandler::new();
        h.dispatcher.on("ping", recorder.clone()).unwrap();

        let (tx, rx) = mpsc::channel(4);
        h.dispatcher.attach(rx).unwrap();
        tx.send(event("ping", 0, 1)).await.unwrap();

        assert!(eventually(|| recorder.count() == 1).await, "{priority:?}");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(recorder.count(), 1, "{priority:?}");
        assert_eq!(h.errors.count(), 0);
    }
}

#[tokio::test]
async fn test_deregister_drops_later_events_silently() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        assert!(!h.dispatcher.deregister("never"));

        let recorder = RecordingHandler::new();
        h.dispatcher.on("ping", recorder.clone()).unwrap();
        assert!(h.dispatcher.deregister("ping"));
        assert!(!h.dispatcher.deregister("ping"));

        let (tx, rx) = mpsc::channel(4);
        h.dispatcher.attach(rx).unwrap();
        tx.send(event("ping", 0, 1)).await.unwrap();

        assert!(eventually(|| h.seen.count() == 1).await, "{priority:?}");
        assert_eq!(recorder.count(), 0);
        assert_eq!(h.errors.count(), 0);
    }
}

#[tokio::test]
async fn test_reregister_replaces_handler() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let first = RecordingHandler::new();
        let second = RecordingHandler::new();
        h.dispatcher.on("ping", first.clone()).unwrap();
        h.dispatcher.on("ping", second.clone()).unwrap();

        let (tx, rx) = mpsc::channel(4);
        h.dispatcher.attach(rx).unwrap();
        tx.send(event("ping", 0, 1)).await.unwrap();

        assert!(eventually(|| second.count() == 1).await, "{priority:?}");
        assert_eq!(first.count(), 0);
    }
}

#[tokio::test]
async fn test_per_source_order_is_preserved() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let recorder = RecordingHandler::new();
        h.dispatcher.on("seq", recorder.clone()).unwrap();

        let (tx_a, rx_a) = mpsc::channel(16);
        let (tx_b, rx_b) = mpsc::channel(16);
        h.dispatcher.attach(rx_a).unwrap();
        h.dispatcher.attach(rx_b).unwrap();

        let a = tokio::spawn(async move {
            for seq in 1..=10 {
                tx_a.send(event("seq", 0, seq)).await.unwrap();
            }
        });
        let b = tokio::spawn(async move {
            for seq in 1..=10 {
                tx_b.send(event("seq", 1, seq)).await.unwrap();
            }
        });
        a.await.unwrap();
        b.await.unwrap();

        assert!(eventually(|| recorder.count() == 20).await, "{priority:?}");
        for source in 0..2 {
            let order: Vec<u32> = recorder
                .events()
                .iter()
                .map(WithPayload::payload)
                .filter(|(s, _)| *s == source)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(order, (1..=10).collect::<Vec<_>>(), "{priority:?}");
        }
    }
}

#[tokio::test]
async fn test_futures_channels_and_streams_as_sources() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let recorder = RecordingHandler::new();
        h.dispatcher.on("seq", recorder.clone()).unwrap();

        let (tx, rx) = futures::channel::mpsc::unbounded();
        h.dispatcher.attach(rx).unwrap();
        let finite = futures::stream::iter((1..=3).map(|seq| event("seq", 1, seq)));
        h.dispatcher
            .connect(EventSource::from_stream(finite))
            .unwrap();

        for seq in 1..=3 {
            tx.unbounded_send(event("seq", 0, seq)).unwrap();
        }

        assert!(eventually(|| recorder.count() == 6).await, "{priority:?}");
        for source in 0..2 {
            let order: Vec<u32> = recorder
                .events()
                .iter()
                .map(WithPayload::payload)
                .filter(|(s, _)| *s == source)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(order, vec![1, 2, 3], "{priority:?}");
        }
    }
}

#[tokio::test]
async fn test_close_with_open_sources_does_not_hang() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let mut senders = Vec::new();
        let mut signals = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel::<TestEvent>(1);
            signals.push(h.dispatcher.attach(rx).unwrap());
            senders.push(tx);
        }

        h.dispatcher.close().unwrap();
        h.dispatcher.close().unwrap();
        assert!(h.dispatcher.is_closed());

        for signal in signals {
            tokio::time::timeout(Duration::from_secs(1), signal.wait())
                .await
                .expect("shutdown signal never resolved");
        }
    }
}

#[tokio::test]
async fn test_close_after_sources_ended_naturally() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let (tx, rx) = mpsc::channel::<TestEvent>(1);
        let signal = h.dispatcher.attach(rx).unwrap();
        drop(tx);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!signal.is_shutdown());
        h.dispatcher.close().unwrap();
        h.dispatcher.close().unwrap();
        assert!(signal.is_shutdown());
    }
}

#[tokio::test]
async fn test_low_footprint_ping_then_unknown() {
    let h = Harness::new(Priority::LowFootprint);
    let (tx, rx) = mpsc::channel(4);
    h.dispatcher.attach(rx).unwrap();

    let recorder = RecordingHandler::new();
    h.dispatcher.on("ping", recorder.clone()).unwrap();

    tx.send(event("ping", 0, 1)).await.unwrap();
    assert!(eventually(|| recorder.count() == 1).await);
    assert_eq!(h.errors.count(), 0);

    tx.send(event("unknown", 0, 2)).await.unwrap();
    assert!(eventually(|| h.seen.count() == 2).await);
    assert_eq!(recorder.count(), 1);
    assert_eq!(h.errors.count(), 0);
}

#[tokio::test]
async fn test_low_latency_two_sources_without_handlers() {
    let core = Arc::new(DispatchCore::<TestEvent>::new());
    let dispatcher = FanInDispatcher::new(Arc::clone(&core));

    let (tx_a, rx_a) = mpsc::channel(1);
    let (tx_b, rx_b) = mpsc::channel(1);
    let signal = dispatcher.attach(rx_a).unwrap();
    dispatcher.attach(rx_b).unwrap();
    assert_eq!(dispatcher.forwarders(), 2);

    tx_a.send(event("a1", 0, 1)).await.unwrap();
    tx_b.send(event("b1", 1, 1)).await.unwrap();

    dispatcher.close().unwrap();
    dispatcher.close().unwrap();

    tokio::time::timeout(Duration::from_secs(1), signal.wait())
        .await
        .expect("shutdown signal never resolved");
    assert!(eventually(|| dispatcher.forwarders() == 0).await);
    assert!(eventually(|| !dispatcher.is_consuming()).await);
    drop((tx_a, tx_b));
}

#[tokio::test]
async fn test_failing_handler_reports_handler_error() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let failing = FailingHandler::new("boom");
        let recorder = RecordingHandler::new();
        h.dispatcher.on("fail", failing.clone()).unwrap();
        h.dispatcher.on("ok", recorder.clone()).unwrap();

        let (tx, rx) = mpsc::channel(4);
        h.dispatcher.attach(rx).unwrap();
        tx.send(event("fail", 0, 1)).await.unwrap();
        tx.send(event("ok", 0, 2)).await.unwrap();
        tx.send(event("fail", 0, 3)).await.unwrap();

        // A failure never stops the dispatcher.
        assert!(eventually(|| h.errors.count() == 2).await, "{priority:?}");
        assert_eq!(recorder.count(), 1);
        assert_eq!(failing.calls(), 2);

        for err in h.errors.take() {
            assert!(ErrorKind::Handler.is_in(&err));
            assert!(!ErrorKind::Closed.is_in(&err));
            assert_eq!(err.to_string(), "handler for `fail` failed");
        }
    }
}

#[tokio::test]
async fn test_exit_when_drained_keeps_source_behaviour() {
    let core = Arc::new(DispatchCore::<TestEvent>::new());
    let dispatcher = MultiplexDispatcher::new(core, IdlePolicy::ExitWhenDrained);

    let (tx, rx) = mpsc::channel::<TestEvent>(1);
    dispatcher.attach(rx).unwrap();
    assert!(eventually(|| dispatcher.connections() == 1).await);
    drop(tx);
    assert!(eventually(|| !dispatcher.is_consuming()).await);

    let (_tx, rx) = mpsc::channel::<TestEvent>(1);
    assert!(dispatcher.attach(rx).is_ok());
    assert!(!dispatcher.is_closed());
}

/// Fails the test if two invocations ever overlap.
struct ExclusiveHandler {
    busy: AtomicBool,
    calls: Arc<AtomicUsize>,
}

impl Handler<TestEvent> for ExclusiveHandler {
    async fn call(&self, _event: &TestEvent) -> HandlerResult {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err("handler entered concurrently".into());
        }
        tokio::task::yield_now().await;
        self.busy.store(false, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handlers_never_run_concurrently() {
    const SOURCES: usize = 8;
    const PER_SOURCE: u32 = 25;

    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let calls = Arc::new(AtomicUsize::new(0));
        h.dispatcher
            .on(
                "work",
                ExclusiveHandler {
                    busy: AtomicBool::new(false),
                    calls: Arc::clone(&calls),
                },
            )
            .unwrap();

        let mut producers = Vec::new();
        for source in 0..SOURCES {
            let (tx, rx) = mpsc::channel(4);
            h.dispatcher.attach(rx).unwrap();
            producers.push(tokio::spawn(async move {
                for seq in 0..PER_SOURCE {
                    tx.send(event("work", source, seq)).await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let expected = SOURCES * PER_SOURCE as usize;
        assert!(
            eventually(|| calls.load(Ordering::SeqCst) == expected).await,
            "{priority:?}"
        );
        assert_eq!(h.errors.count(), 0, "{:?}", h.errors.messages());
        h.dispatcher.close().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_register_while_dispatching() {
    for priority in PRIORITIES {
        let h = Harness::new(priority);
        let (tx, rx) = mpsc::channel(8);
        h.dispatcher.attach(rx).unwrap();

        let producer = tokio::spawn(async move {
            for seq in 0..200 {
                tx.send(event("late", 0, seq)).await.unwrap();
            }
        });

        let recorder = RecordingHandler::new();
        for _ in 0..50 {
            h.dispatcher.on("late", recorder.clone()).unwrap();
            tokio::task::yield_now().await;
        }
        producer.await.unwrap();

        assert!(eventually(|| h.seen.count() == 200).await, "{priority:?}");
        assert!(recorder.count() <= 200);
        assert_eq!(h.errors.count(), 0);
    }
}
