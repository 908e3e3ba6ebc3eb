#[cfg(test)]
mod multi_thread_tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use test_support::utils::{join_within, stays_blocked, wait_for};
    use yep_ciq::{CIFifoQueue, CIPriorityQueue, CIQueueError, CIShutdownState};

    #[test]
    /**
     * Capacity 1 holding one item: close, a concurrent get still receives the item, the next get sees `Closed`.
     */
    fn drain_on_close() {
        let queue = CIFifoQueue::new(1);
        queue.put(1, true, None).unwrap();
        queue.close();

        thread::scope(|s| {
            let consumer = s.spawn(|| queue.get(true, None));
            assert_eq!(join_within(consumer), Ok(1));
        });

        assert_eq!(queue.get(true, None), Err(CIQueueError::Closed));
    }

    #[test]
    /**
     * Capacity 1 holding one item: after close, a put blocks until a get makes room, then fails with `Closed`
     * without enqueuing anything.
     */
    fn backpressure_on_close() {
        let queue = CIFifoQueue::new(1);
        queue.put(1, true, None).unwrap();
        queue.close();

        thread::scope(|s| {
            let producer = s.spawn(|| queue.put(2, true, None).map_err(|e| e.into_parts()));
            assert!(stays_blocked(&producer), "put on a full closed queue should wait for room");

            assert_eq!(queue.get(true, None), Ok(1));
            assert_eq!(join_within(producer), Err((CIQueueError::Closed, 2)));
        });

        assert_eq!(queue.size(), Err(CIQueueError::Closed));
        assert_eq!(queue.get_nowait(), Err(CIQueueError::Closed));
    }

    #[test]
    /**
     * Several producers blocked on a full closed queue: a single get frees room and every one of them fails with
     * `Closed`, not just the first to wake.
     */
    fn one_get_releases_all_producers_after_close() {
        let queue = CIFifoQueue::new(1);
        queue.put(0, true, None).unwrap();
        queue.close();

        thread::scope(|s| {
            let producers: Vec<_> = (1..4)
                .map(|i| {
                    let queue = &queue;
                    s.spawn(move || queue.put(i, true, None).map_err(|e| e.kind()))
                })
                .collect();
            for producer in &producers {
                assert!(stays_blocked(producer));
            }

            assert_eq!(queue.get(true, None), Ok(0));
            for producer in producers {
                assert_eq!(join_within(producer), Err(CIQueueError::Closed));
            }
        });

        assert_eq!(queue.size(), Err(CIQueueError::Closed));
    }

    #[test]
    /**
     * A consumer blocked on an empty queue wakes up with `Closed` when the queue is closed.
     */
    fn close_wakes_blocked_consumers() {
        let queue = CIFifoQueue::<u32>::new(4);

        thread::scope(|s| {
            let consumers: Vec<_> = (0..4).map(|_| s.spawn(|| queue.get(true, None))).collect();
            for consumer in &consumers {
                assert!(stays_blocked(consumer));
            }

            queue.close();
            for consumer in consumers {
                assert_eq!(join_within(consumer), Err(CIQueueError::Closed));
            }
        });
    }

    #[test]
    /**
     * Items queued before the close reach the blocked consumers; the remaining consumers see `Closed`.
     */
    fn close_with_items_and_waiters() {
        let queue = CIFifoQueue::new(4);

        thread::scope(|s| {
            let consumers: Vec<_> = (0..3).map(|_| s.spawn(|| queue.get(true, None))).collect();
            for consumer in &consumers {
                assert!(stays_blocked(consumer));
            }

            queue.put(10, true, None).unwrap();
            wait_for(|| queue.size() == Ok(0));
            queue.close();

            let mut got = Vec::new();
            let mut closed = 0;
            for consumer in consumers {
                match join_within(consumer) {
                    Ok(item) => got.push(item),
                    Err(CIQueueError::Closed) => closed += 1,
                    Err(e) => panic!("unexpected error when consuming: {e:?}"),
                }
            }
            assert_eq!(got, vec![10]);
            assert_eq!(closed, 2);
        });
    }

    #[test]
    /**
     * Capacity 3 with two items: interrupt discards them, blocked consumers on another queue and blocked producers
     * on a full queue all wake with `Interrupted`.
     */
    fn interrupt_wakes_everyone() {
        let partial = CIFifoQueue::new(3);
        partial.put(1, true, None).unwrap();
        partial.put(2, true, None).unwrap();
        partial.interrupt();
        assert_eq!(partial.size(), Err(CIQueueError::Interrupted));

        let empty = CIFifoQueue::<u32>::new(3);
        let full = CIFifoQueue::new(1);
        full.put(0u32, true, None).unwrap();

        thread::scope(|s| {
            let consumers: Vec<_> = (0..3).map(|_| s.spawn(|| empty.get(true, None))).collect();
            let producers: Vec<_> = (1..4u32)
                .map(|i| {
                    let full = &full;
                    s.spawn(move || full.put(i, true, None).map_err(|e| e.kind()))
                })
                .collect();

            for consumer in &consumers {
                assert!(stays_blocked(consumer));
            }
            for producer in &producers {
                assert!(stays_blocked(producer));
            }

            empty.interrupt();
            full.interrupt();

            for consumer in consumers {
                assert_eq!(join_within(consumer), Err(CIQueueError::Interrupted));
            }
            for producer in producers {
                assert_eq!(join_within(producer), Err(CIQueueError::Interrupted));
            }
        });

        assert_eq!(full.size(), Err(CIQueueError::Interrupted));
        assert_eq!(full.state(), CIShutdownState::Interrupted);
    }

    #[test]
    /**
     * A producer waiting on a full closed queue is released by interrupt with `Interrupted`, not `Closed`.
     */
    fn interrupt_overrides_close_for_waiting_producer() {
        let queue = CIFifoQueue::new(1);
        queue.put(1, true, None).unwrap();
        queue.close();

        thread::scope(|s| {
            let producer = s.spawn(|| queue.put(2, true, None).map_err(|e| e.kind()));
            assert!(stays_blocked(&producer));

            queue.interrupt();
            assert_eq!(join_within(producer), Err(CIQueueError::Interrupted));
        });
    }

    #[test]
    /**
     * A timed get that is waiting is released early by a put.
     */
    fn put_wakes_timed_get() {
        let queue = CIFifoQueue::new(1);

        thread::scope(|s| {
            let consumer = s.spawn(|| queue.get(true, Some(Duration::from_secs(30))));
            assert!(stays_blocked(&consumer));

            queue.put(5, true, None).unwrap();
            assert_eq!(join_within(consumer), Ok(5));
        });
    }

    #[test]
    /**
     * Multiple producers and consumers over a small queue: every id is received exactly once, then close ends
     * the consumers.
     */
    fn multi_produce_consume_test() {
        let capacity: usize = 8;
        let num_producers: u32 = 4;
        let num_consumers: u32 = 4;
        let max_messages: u32 = 4000;

        let queue = Arc::new(CIFifoQueue::new(capacity));
        let produce_counter = Arc::new(AtomicU32::new(0));
        let received_ids = Arc::new(Mutex::new(HashSet::<u32>::new()));

        thread::scope(|s| {
            let consumers: Vec<_> = (0..num_consumers)
                .map(|i| {
                    let queue = Arc::clone(&queue);
                    let received_ids = Arc::clone(&received_ids);
                    thread::Builder::new()
                        .name(format!("consumer_{i}"))
                        .spawn_scoped(s, move || loop {
                            match queue.get(true, None) {
                                Ok(id) => {
                                    assert!(id < max_messages, "received id out of range: {id}");
                                    assert!(
                                        received_ids.lock().unwrap().insert(id),
                                        "duplicate message received: {id}"
                                    );
                                }
                                Err(CIQueueError::Closed) => break,
                                Err(e) => panic!("unexpected error when consuming: {e:?}"),
                            }
                        })
                        .unwrap()
                })
                .collect();

            let producers: Vec<_> = (0..num_producers)
                .map(|i| {
                    let queue = Arc::clone(&queue);
                    let counter = Arc::clone(&produce_counter);
                    thread::Builder::new()
                        .name(format!("producer_{i}"))
                        .spawn_scoped(s, move || {
                            let mut id = counter.fetch_add(1, Ordering::AcqRel);
                            while id < max_messages {
                                queue.put(id, true, None).unwrap();
                                id = counter.fetch_add(1, Ordering::AcqRel);
                            }
                        })
                        .unwrap()
                })
                .collect();

            for producer in producers {
                producer.join().unwrap();
            }
            queue.close();
            for consumer in consumers {
                consumer.join().unwrap();
            }
        });

        let received_ids = received_ids.lock().unwrap();
        assert_eq!(received_ids.len(), max_messages as usize);
        for i in 0..max_messages {
            assert!(received_ids.contains(&i), "missing received id: {i}");
        }
    }

    #[test]
    /**
     * Interrupting a busy queue: every item is either received once or lost to the interrupt, and every worker
     * exits with `Interrupted`.
     */
    fn interrupt_under_load() {
        let queue = CIPriorityQueue::new(16);
        let accepted = Mutex::new(HashSet::<u32>::new());
        let received = Mutex::new(HashSet::<u32>::new());
        let next_id = AtomicU32::new(0);

        thread::scope(|s| {
            let producers: Vec<_> = (0..3)
                .map(|_| {
                    s.spawn(|| loop {
                        let id = next_id.fetch_add(1, Ordering::AcqRel);
                        match queue.put(id, true, None) {
                            Ok(()) => assert!(accepted.lock().unwrap().insert(id)),
                            Err(e) => return e.kind(),
                        }
                    })
                })
                .collect();
            let consumers: Vec<_> = (0..3)
                .map(|_| {
                    s.spawn(|| loop {
                        match queue.get(true, None) {
                            Ok(id) => assert!(received.lock().unwrap().insert(id)),
                            Err(e) => return e,
                        }
                    })
                })
                .collect();

            wait_for(|| received.lock().unwrap().len() > 500);
            queue.interrupt();

            for producer in producers {
                assert_eq!(join_within(producer), CIQueueError::Interrupted);
            }
            for consumer in consumers {
                assert_eq!(join_within(consumer), CIQueueError::Interrupted);
            }
        });

        let accepted = accepted.lock().unwrap();
        let received = received.lock().unwrap();
        assert!(received.is_subset(&accepted));
        // at most one queue's worth was thrown away
        assert!(accepted.len() - received.len() <= 16);
    }
}
