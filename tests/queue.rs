use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use levelqueue::{Error, Queue, QueueConfig, WriteMode};
use tempfile::tempdir;

#[test]
fn push_pop_scenario() {
    let dir = tempdir().expect("tempdir");
    let queue = Queue::open(dir.path().join("queue")).expect("queue open");

    queue.rpush(b"test").expect("rpush");
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.lpop().expect("lpop"), b"test");
    assert_eq!(queue.len(), 0);

    assert!(matches!(queue.lpop(), Err(Error::NotFound)));
    assert_eq!(queue.len(), 0);

    queue.lpush(b"test2").expect("lpush");
    assert_eq!(queue.lpop().expect("lpop"), b"test2");
    assert_eq!(queue.len(), 0);

    assert!(matches!(queue.lpop(), Err(Error::NotFound)));
    assert!(matches!(queue.rpop(), Err(Error::NotFound)));
    queue.close().expect("close");
}

#[test]
fn len_counts_pushes_at_both_ends() {
    let dir = tempdir().expect("tempdir");
    let queue = Queue::open(dir.path().join("queue")).expect("queue open");
    for i in 0..50u32 {
        if i % 3 == 0 {
            queue.lpush(&i.to_le_bytes()).expect("lpush");
        } else {
            queue.rpush(&i.to_le_bytes()).expect("rpush");
        }
        assert_eq!(queue.len(), u64::from(i) + 1);
    }
}

#[test]
fn push_then_pop_same_end_restores_len() {
    let dir = tempdir().expect("tempdir");
    let queue = Queue::open(dir.path().join("queue")).expect("queue open");
    queue.rpush(b"base").expect("rpush");

    queue.rpush(b"right").expect("rpush");
    assert_eq!(queue.rpop().expect("rpop"), b"right");
    assert_eq!(queue.len(), 1);

    queue.lpush(b"left").expect("lpush");
    assert_eq!(queue.lpop().expect("lpop"), b"left");
    assert_eq!(queue.len(), 1);
}

#[test]
fn rpush_drains_fifo_from_front_and_lifo_from_back() {
    let dir = tempdir().expect("tempdir");
    let queue = Queue::open(dir.path().join("queue")).expect("queue open");

    for item in [b"a", b"b", b"c"] {
        queue.rpush(item).expect("rpush");
    }
    let front: Vec<Vec<u8>> = (0..3).map(|_| queue.lpop().expect("lpop")).collect();
    assert_eq!(front, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

    for item in [b"a", b"b", b"c"] {
        queue.rpush(item).expect("rpush");
    }
    let back: Vec<Vec<u8>> = (0..3).map(|_| queue.rpop().expect("rpop")).collect();
    assert_eq!(back, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    assert!(queue.is_empty());
}

#[test]
fn reopen_recovers_unconsumed_items() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue");

    let queue = Queue::open(&path).expect("queue open");
    for i in 0..10u8 {
        queue.rpush(&[i]).expect("rpush");
    }
    queue.lpush(b"head").expect("lpush");
    assert_eq!(queue.lpop().expect("lpop"), b"head");
    assert_eq!(queue.lpop().expect("lpop"), [0]);
    assert_eq!(queue.rpop().expect("rpop"), [9]);
    let bounds = queue.bounds();
    queue.close().expect("close");

    let queue = Queue::open(&path).expect("queue reopen");
    assert_eq!(queue.bounds(), bounds);
    assert_eq!(queue.len(), 8);
    for i in 1..9u8 {
        assert_eq!(queue.lpop().expect("lpop"), [i]);
    }
    assert!(matches!(queue.rpop(), Err(Error::NotFound)));
    queue.close().expect("close");

    let queue = Queue::open(&path).expect("queue reopen");
    queue.rpush(b"test3").expect("rpush");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.rpop().expect("rpop"), b"test3");
}

#[test]
fn repeated_close_and_reopen_on_one_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue");

    for i in 0..100u32 {
        let queue = Queue::open(&path).expect("queue reopen");
        assert_eq!(queue.len(), u64::from(i));
        queue.rpush(&i.to_le_bytes()).expect("rpush");
        queue.close().expect("close");
    }

    let queue = Queue::open(&path).expect("queue reopen");
    assert_eq!(queue.len(), 100);
    for i in 0..100u32 {
        assert_eq!(queue.lpop().expect("lpop"), i.to_le_bytes());
    }
    assert!(queue.is_empty());
}

#[test]
fn two_step_mode_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue");
    let config = QueueConfig::durable().with_write_mode(WriteMode::TwoStep);

    let queue = Queue::open_with_config(&path, config.clone()).expect("queue open");
    queue.rpush(b"one").expect("rpush");
    queue.lpush(b"zero").expect("lpush");
    queue.close().expect("close");

    let queue = Queue::open_with_config(&path, config).expect("queue reopen");
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.lpop().expect("lpop"), b"zero");
    assert_eq!(queue.lpop().expect("lpop"), b"one");
}

#[test]
fn concurrent_pushes_are_neither_lost_nor_duplicated() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let dir = tempdir().expect("tempdir");
    let queue = Arc::new(Queue::open(dir.path().join("queue")).expect("queue open"));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let item = format!("{t}-{i}");
                    if i % 2 == 0 {
                        queue.rpush(item.as_bytes()).expect("rpush");
                    } else {
                        queue.lpush(item.as_bytes()).expect("lpush");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("pusher");
    }
    assert_eq!(queue.len(), (THREADS * PER_THREAD) as u64);

    let poppers: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut popped = Vec::new();
                loop {
                    let result = if t % 2 == 0 { queue.rpop() } else { queue.lpop() };
                    match result {
                        Ok(item) => popped.push(item),
                        Err(Error::NotFound) => break,
                        Err(err) => panic!("pop failed: {err}"),
                    }
                }
                popped
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in poppers {
        for item in handle.join().expect("popper") {
            total += 1;
            assert!(seen.insert(item), "item popped twice");
        }
    }
    assert_eq!(total, THREADS * PER_THREAD);
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert!(queue.is_empty());
}

#[test]
fn mixed_concurrent_push_and_pop() {
    let dir = tempdir().expect("tempdir");
    let queue = Arc::new(Queue::open(dir.path().join("queue")).expect("queue open"));
    for _ in 0..10 {
        queue.rpush(b"test").expect("rpush");
    }

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                if i % 2 == 0 {
                    queue.rpush(b"test").expect("rpush");
                } else {
                    queue.rpop().expect("rpop");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }
    assert_eq!(queue.len(), 10);
}
