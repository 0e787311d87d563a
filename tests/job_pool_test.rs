//! Behavioural tests for the job pool: work accounting, ordering, failures,
//! pause/resume and shutdown

use job_pool::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Run `wait_for_idle` on another thread and fail the test if it hangs.
fn wait_with_timeout(pool: &Arc<JobPool>, timeout: Duration) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let waiter_pool = Arc::clone(pool);
    thread::spawn(move || {
        let _ = tx.send(waiter_pool.wait_for_idle());
    });
    rx.recv_timeout(timeout)
        .expect("wait_for_idle did not return in time")
}

#[test]
fn test_executes_all_jobs() {
    init_logger();
    let pool = JobPool::new(4).expect("Failed to create pool");
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let counter_clone = Arc::clone(&counter);
        pool.execute(move || {
            counter_clone.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .expect("Failed to submit job");
    }

    pool.wait_for_idle().expect("no job should fail");
    assert_eq!(counter.load(Ordering::Relaxed), 100);
    assert_eq!(pool.queue_size(), 0);
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn test_empty_pool_wait_returns_promptly() {
    let pool = Arc::new(JobPool::new(4).expect("Failed to create pool"));

    let start = Instant::now();
    wait_with_timeout(&pool, Duration::from_secs(5)).expect("empty pool is idle");
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_wait_for_idle_twice() {
    let pool = JobPool::new(2).expect("Failed to create pool");
    pool.execute(|| Ok(())).expect("Failed to submit job");

    pool.wait_for_idle().expect("first wait");

    let start = Instant::now();
    pool.wait_for_idle().expect("second wait");
    pool.wait_for_idle().expect("third wait");
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_concurrent_add_and_wait() {
    let pool = Arc::new(JobPool::new(4).expect("Failed to create pool"));
    let counter = Arc::new(AtomicUsize::new(0));
    let keep_adding = Arc::new(AtomicBool::new(true));
    const MAX_JOBS: usize = 10_000;

    let adder = {
        let pool = Arc::clone(&pool);
        let counter = Arc::clone(&counter);
        let keep_adding = Arc::clone(&keep_adding);
        thread::spawn(move || {
            let mut added = 0;
            while keep_adding.load(Ordering::Relaxed) && added < MAX_JOBS {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    thread::sleep(Duration::from_micros(10));
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
                .expect("Failed to submit job");
                added += 1;
            }
            added
        })
    };

    thread::sleep(Duration::from_millis(100));
    keep_adding.store(false, Ordering::Relaxed);
    let added = adder.join().expect("adder thread panicked");

    wait_with_timeout(&pool, Duration::from_secs(30)).expect("no job should fail");
    assert!(added > 0);
    assert_eq!(counter.load(Ordering::Relaxed), added);
}

#[test]
fn test_concurrency_limit_under_concurrent_producers() {
    const THREADS: usize = 4;
    let pool = Arc::new(JobPool::new(THREADS).expect("Failed to create pool"));
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let observed_active = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..150 {
                    let current = Arc::clone(&current);
                    let peak = Arc::clone(&peak);
                    pool.execute(move || {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(200));
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .expect("Failed to submit job");
                }
            })
        })
        .collect();

    // Sample the pool's own in-flight count while producers are busy
    for _ in 0..50 {
        observed_active.fetch_max(pool.active_count(), Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
    }

    for producer in producers {
        producer.join().expect("producer panicked");
    }
    pool.wait_for_idle().expect("no job should fail");

    assert!(peak.load(Ordering::SeqCst) <= THREADS);
    assert!(peak.load(Ordering::SeqCst) >= 1);
    assert!(observed_active.load(Ordering::SeqCst) <= THREADS);
    assert_eq!(pool.stats().jobs_completed, 1200);
}

#[test]
fn test_fifo_order_single_producer() {
    let pool = JobPool::new(1).expect("Failed to create pool");
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in 0..50 {
        let order = Arc::clone(&order);
        pool.execute(move || {
            order.lock().expect("order lock").push(tag);
            Ok(())
        })
        .expect("Failed to submit job");
    }

    pool.wait_for_idle().expect("no job should fail");
    let order = order.lock().expect("order lock");
    assert_eq!(*order, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_batch_runs_each_job_once() {
    let pool = JobPool::new(4).expect("Failed to create pool");
    let runs = Arc::new(Mutex::new(Vec::new()));

    pool.pause();
    let jobs: Vec<_> = (0..40)
        .map(|tag| {
            let runs = Arc::clone(&runs);
            move || {
                runs.lock().expect("runs lock").push(tag);
                Ok(())
            }
        })
        .collect();
    let ids = pool.execute_batch(jobs).expect("Failed to submit batch");
    assert_eq!(ids.clone().count(), 40);
    assert_eq!(pool.queue_size(), 40);

    pool.resume();
    pool.wait_for_idle().expect("no job should fail");

    let mut runs = runs.lock().expect("runs lock").clone();
    runs.sort_unstable();
    assert_eq!(runs, (0..40).collect::<Vec<_>>());
}

#[test]
fn test_failure_isolation() {
    init_logger();
    let pool = JobPool::new(4).expect("Failed to create pool");
    let succeeded = Arc::new(AtomicUsize::new(0));
    let attempted = Arc::new(AtomicUsize::new(0));

    for i in 0..10 {
        let attempted = Arc::clone(&attempted);
        pool.execute(move || {
            attempted.fetch_add(1, Ordering::SeqCst);
            Err(PoolError::execution(format!("failure {}", i)))
        })
        .expect("Failed to submit job");
    }
    for _ in 0..10 {
        let succeeded = Arc::clone(&succeeded);
        pool.execute(move || {
            thread::sleep(Duration::from_millis(10));
            succeeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit job");
    }

    let err = pool.wait_for_idle().expect_err("a failure should be reported");
    assert!(matches!(err, PoolError::JobFailed(_)));
    assert_eq!(attempted.load(Ordering::SeqCst), 10);
    assert_eq!(succeeded.load(Ordering::SeqCst), 10);

    // Exactly one failure indication: the slot is empty afterwards
    pool.wait_for_idle().expect("failure already consumed");

    let stats = pool.stats();
    assert_eq!(stats.jobs_failed, 10);
    assert_eq!(stats.jobs_completed, 10);
}

#[test]
fn test_latest_failure_wins() {
    let pool = JobPool::new(1).expect("Failed to create pool");

    for i in 0..5 {
        pool.submit(ClosureJob::with_name(
            move || Err(PoolError::execution(format!("failure {}", i))),
            format!("Failing{}", i),
        ))
        .expect("Failed to submit job");
    }

    // One worker runs them in order, so the last one submitted fails last
    let err = pool.wait_for_idle().expect_err("a failure should be reported");
    let failure = err.job_failure().expect("JobFailed error");
    assert_eq!(failure.job_id, 5);
    assert_eq!(failure.job_type, "Failing4");
    assert_eq!(
        failure.kind,
        FailureKind::Error("Job execution failed: failure 4".to_string())
    );
}

#[test]
fn test_panicking_jobs_are_captured() {
    init_logger();
    let pool = JobPool::new(2).expect("Failed to create pool");
    let counter = Arc::new(AtomicUsize::new(0));

    pool.execute(|| panic!("Intentional panic for testing"))
        .expect("Failed to submit job");
    pool.wait_for_idle()
        .expect_err("panic should be reported");

    // Workers survived the panic
    for _ in 0..10 {
        let counter = Arc::clone(&counter);
        pool.execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit job");
    }
    pool.wait_for_idle().expect("no further failures");
    assert_eq!(counter.load(Ordering::SeqCst), 10);
    assert_eq!(pool.stats().jobs_panicked, 1);
}

#[test]
fn test_panic_failure_kind() {
    let pool = JobPool::new(1).expect("Failed to create pool");
    pool.execute(|| panic!("resolver exploded"))
        .expect("Failed to submit job");

    match pool.wait_for_idle() {
        Err(PoolError::JobFailed(failure)) => {
            assert!(failure.kind.is_panic());
            assert_eq!(failure.kind.message(), "resolver exploded");
        }
        other => panic!("Expected JobFailed, got {:?}", other),
    }
}

struct PanicOnDrop;

impl Drop for PanicOnDrop {
    fn drop(&mut self) {
        panic!("cleanup failed");
    }
}

struct DropPanicJob(#[allow(dead_code)] PanicOnDrop);

impl Job for DropPanicJob {
    fn execute(&mut self) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_panicking_destructor_does_not_stall_pool() {
    init_logger();
    let pool = Arc::new(JobPool::new(1).expect("Failed to create pool"));
    pool.submit(DropPanicJob(PanicOnDrop))
        .expect("Failed to submit job");

    match wait_with_timeout(&pool, Duration::from_secs(5)) {
        Err(PoolError::JobFailed(failure)) => {
            assert!(failure.kind.is_panic());
            assert_eq!(failure.kind.message(), "cleanup failed");
        }
        other => panic!("Expected JobFailed, got {:?}", other),
    }
    assert_eq!(pool.active_count(), 0);

    // The single worker is still there to run the next job
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);
    pool.execute(move || {
        ran_clone.store(true, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit job");
    wait_with_timeout(&pool, Duration::from_secs(5)).expect("follow-up job should succeed");
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_pause_blocks_new_dequeues() {
    let pool = JobPool::new(2).expect("Failed to create pool");
    pool.pause();

    let started = Arc::new(AtomicBool::new(false));
    let started_clone = Arc::clone(&started);
    pool.execute(move || {
        started_clone.store(true, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit job");
    pool.execute(|| Ok(())).expect("Failed to submit job");

    thread::sleep(Duration::from_millis(200));
    assert!(!started.load(Ordering::SeqCst));
    assert_eq!(pool.queue_size(), 2);
    assert_eq!(pool.active_count(), 0);

    pool.resume();
    pool.wait_for_idle().expect("no job should fail");
    assert!(started.load(Ordering::SeqCst));
    assert_eq!(pool.queue_size(), 0);
}

#[test]
fn test_pause_lets_running_job_finish() {
    let pool = JobPool::new(1).expect("Failed to create pool");
    let (started_tx, started_rx) = mpsc::channel();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_clone = Arc::clone(&finished);

    pool.execute(move || {
        started_tx.send(()).expect("receiver alive");
        thread::sleep(Duration::from_millis(100));
        finished_clone.store(true, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit job");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("job should start");

    pool.pause();
    pool.execute(|| Ok(())).expect("Failed to submit job");

    // Running job completes, queued one stays put
    let result = pool.wait_for_idle();
    assert!(finished.load(Ordering::SeqCst));
    assert!(matches!(result, Err(PoolError::Paused { pending_jobs: 1 })));
    assert_eq!(pool.queue_size(), 1);

    pool.resume();
    pool.wait_for_idle().expect("no job should fail");
}

#[test]
fn test_paused_wait_keeps_failure_for_later() {
    let pool = JobPool::new(1).expect("Failed to create pool");
    pool.execute(|| Err(PoolError::other("early failure")))
        .expect("Failed to submit job");
    pool.wait_for_idle().expect_err("failure reported");

    pool.execute(|| Err(PoolError::other("second failure")))
        .expect("Failed to submit job");
    pool.pause();
    pool.execute(|| Ok(())).expect("Failed to submit job");
    assert!(matches!(
        pool.wait_for_idle(),
        Err(PoolError::Paused { .. })
    ));

    pool.resume();
    let err = pool.wait_for_idle().expect_err("stored failure surfaces");
    assert_eq!(err.job_failure().map(|f| f.job_id), Some(3));
}

#[test]
fn test_shutdown_discards_pending_and_honors_in_flight() {
    init_logger();
    let pool = JobPool::new(1).expect("Failed to create pool");
    let (started_tx, started_rx) = mpsc::channel();
    let slow_finished = Arc::new(AtomicBool::new(false));
    let trailing_ran = Arc::new(AtomicUsize::new(0));

    let slow_finished_clone = Arc::clone(&slow_finished);
    pool.execute(move || {
        started_tx.send(()).expect("receiver alive");
        thread::sleep(Duration::from_millis(200));
        slow_finished_clone.store(true, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit slow job");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow job should start");

    for _ in 0..5 {
        let trailing_ran = Arc::clone(&trailing_ran);
        pool.execute(move || {
            trailing_ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit trailing job");
    }
    assert_eq!(pool.queue_size(), 5);

    pool.shutdown();

    assert!(slow_finished.load(Ordering::SeqCst));
    assert_eq!(trailing_ran.load(Ordering::SeqCst), 0);
    assert_eq!(pool.queue_size(), 0);

    let stats = pool.stats();
    assert_eq!(stats.jobs_discarded, 5);
    assert_eq!(stats.jobs_completed, 1);
}

#[test]
fn test_drop_joins_workers() {
    let finished = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = mpsc::channel();
    {
        let pool = JobPool::new(2).expect("Failed to create pool");
        let finished = Arc::clone(&finished);
        pool.execute(move || {
            started_tx.send(()).expect("receiver alive");
            thread::sleep(Duration::from_millis(100));
            finished.store(true, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit job");
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("job should start");
    }
    // Drop waited for the running job
    assert!(finished.load(Ordering::SeqCst));
}

#[test]
fn test_shutdown_wakes_blocked_waiter() {
    let pool = Arc::new(JobPool::new(1).expect("Failed to create pool"));
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let queued_ran = Arc::new(AtomicBool::new(false));

    pool.execute(move || {
        started_tx.send(()).expect("receiver alive");
        let _ = done_rx.recv();
        Ok(())
    })
    .expect("Failed to submit blocking job");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("blocking job should start");

    let queued_ran_clone = Arc::clone(&queued_ran);
    pool.execute(move || {
        queued_ran_clone.store(true, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit queued job");

    let (waited_tx, waited_rx) = mpsc::channel();
    let waiter_pool = Arc::clone(&pool);
    thread::spawn(move || {
        let _ = waited_tx.send(waiter_pool.wait_for_idle());
    });

    let stopper_pool = Arc::clone(&pool);
    let stopper = thread::spawn(move || stopper_pool.shutdown());
    while !pool.is_shutdown() {
        thread::sleep(Duration::from_millis(1));
    }

    // Queue is already discarded; release the running job
    let _ = done_tx.send(());
    stopper.join().expect("shutdown thread panicked");

    waited_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("waiter should wake after shutdown")
        .expect("no job failed");
    assert!(!queued_ran.load(Ordering::SeqCst));
    assert_eq!(pool.stats().jobs_discarded, 1);
}

#[test]
fn test_reuses_pool() {
    let pool = JobPool::new(4).expect("Failed to create pool");
    let counter = Arc::new(AtomicUsize::new(0));

    for round in 1..=2 {
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .expect("Failed to submit job");
        }
        pool.wait_for_idle().expect("no job should fail");
        assert_eq!(counter.load(Ordering::Relaxed), 50 * round);
    }
}

#[test]
fn test_long_running_jobs_run_in_parallel() {
    const THREADS: usize = 4;
    const JOBS: usize = 8;
    const JOB_MS: u64 = 100;

    let pool = JobPool::new(THREADS).expect("Failed to create pool");
    let completed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    for _ in 0..JOBS {
        let completed = Arc::clone(&completed);
        pool.execute(move || {
            thread::sleep(Duration::from_millis(JOB_MS));
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit job");
    }
    pool.wait_for_idle().expect("no job should fail");
    let elapsed = start.elapsed();

    assert_eq!(completed.load(Ordering::SeqCst), JOBS);
    assert!(elapsed >= Duration::from_millis(JOB_MS * (JOBS / THREADS) as u64));
    // Sequential execution would take JOBS * JOB_MS
    assert!(
        elapsed < Duration::from_millis(JOB_MS * JOBS as u64),
        "jobs did not overlap: {:?}",
        elapsed
    );
}

#[test]
fn test_stress() {
    const JOBS: usize = 10_000;
    let pool = JobPool::new(8).expect("Failed to create pool");
    let counter = Arc::new(AtomicUsize::new(0));

    let jobs: Vec<_> = (0..JOBS)
        .map(|_| {
            let counter = Arc::clone(&counter);
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        })
        .collect();
    pool.execute_batch(jobs).expect("Failed to submit batch");

    pool.wait_for_idle().expect("no job should fail");
    assert_eq!(counter.load(Ordering::Relaxed), JOBS);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(counter.load(Ordering::Relaxed), JOBS);
    assert_eq!(pool.stats().jobs_submitted, JOBS as u64);
}

#[test]
fn test_jobs_can_submit_jobs() {
    let pool = Arc::new(JobPool::new(2).expect("Failed to create pool"));
    let counter = Arc::new(AtomicUsize::new(0));

    let inner_pool = Arc::clone(&pool);
    let inner_counter = Arc::clone(&counter);
    pool.execute(move || {
        for _ in 0..10 {
            let counter = Arc::clone(&inner_counter);
            inner_pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })?;
        }
        Ok(())
    })
    .expect("Failed to submit job");

    // The outer job enqueues before it completes, so idle implies all ran
    wait_with_timeout(&pool, Duration::from_secs(5)).expect("no job should fail");
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}
