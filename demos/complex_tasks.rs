//! Mixed CPU-bound and blocking workload
//!
//! Runs Fibonacci, prime factorization and Collatz jobs next to DNS lookups
//! on one pool, waits for the pool to go idle and prints every result.
//!
//! Run with: RUST_LOG=info cargo run --example complex_tasks

use crossbeam_channel::{bounded, Receiver};
use job_pool::prelude::*;
use log::{debug, info};
use parking_lot::Mutex;
use rand::Rng;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::thread;

fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 2..=n {
        let next = a + b;
        a = b;
        b = next;
    }
    b
}

fn prime_factorization(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut i = 2;
    while i * i <= n {
        while n % i == 0 {
            factors.push(i);
            n /= i;
        }
        i += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

fn collatz_steps(mut n: u64) -> u32 {
    let mut steps = 0;
    while n != 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

/// Resolves host names on a dedicated thread per request
struct DnsResolver;

impl DnsResolver {
    /// Starts a lookup and returns the channel its answer arrives on
    fn resolve(&self, hostname: &str) -> Receiver<String> {
        let (tx, rx) = bounded(1);
        let hostname = hostname.to_string();

        thread::spawn(move || {
            let answer = match (hostname.as_str(), 0).to_socket_addrs() {
                Ok(mut addrs) => match addrs.next() {
                    Some(addr) => addr.ip().to_string(),
                    None => "No results".to_string(),
                },
                Err(e) => format!("Error: {}", e),
            };
            // The receiver may be gone if the driver stopped early
            let _ = tx.send(answer);
        });

        rx
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    const NUM_THREADS: usize = 8;
    let pool = JobPool::with_config(
        PoolConfig::new(NUM_THREADS).with_thread_name_prefix("complex"),
    )?;
    info!("Starting complex tasks with {} threads", NUM_THREADS);

    // Fibonacci(30) to Fibonacci(49)
    let fib_inputs: Vec<u32> = (30..50).collect();
    let fib_results = Arc::new(Mutex::new(vec![0u64; fib_inputs.len()]));
    pool.execute_batch(fib_inputs.iter().copied().enumerate().map(|(i, n)| {
        let results = Arc::clone(&fib_results);
        move || {
            let value = fibonacci(n);
            results.lock()[i] = value;
            debug!("Calculated Fibonacci({}) = {}", n, value);
            Ok(())
        }
    }))?;

    let prime_inputs: Vec<u64> = vec![
        1_000_000_007,
        999_999_937,
        999_999_929,
        999_999_893,
        999_999_797,
        999_999_761,
        999_999_757,
        999_999_751,
        999_999_739,
        999_999_733,
    ];
    let prime_results = Arc::new(Mutex::new(vec![Vec::new(); prime_inputs.len()]));
    for (i, &n) in prime_inputs.iter().enumerate() {
        let results = Arc::clone(&prime_results);
        pool.execute(move || {
            results.lock()[i] = prime_factorization(n);
            debug!("Calculated prime factorization of {}", n);
            Ok(())
        })?;
    }

    let mut collatz_inputs: Vec<u64> = vec![
        27, 31, 41, 47, 54, 73, 97, 129, 171, 231, 313, 327, 649, 871, 1161,
    ];
    let mut rng = rand::thread_rng();
    collatz_inputs.extend((0..5).map(|_| rng.gen_range(1..1_000_000u64)));
    let collatz_results = Arc::new(Mutex::new(vec![0u32; collatz_inputs.len()]));
    for (i, &n) in collatz_inputs.iter().enumerate() {
        let results = Arc::clone(&collatz_results);
        pool.execute(move || {
            let steps = collatz_steps(n);
            results.lock()[i] = steps;
            debug!("Calculated Collatz steps for {} = {}", n, steps);
            Ok(())
        })?;
    }

    let hostnames = [
        "www.google.com",
        "www.github.com",
        "www.stackoverflow.com",
        "www.wikipedia.org",
        "www.reddit.com",
    ];
    let resolver = Arc::new(DnsResolver);
    let dns_pending: Arc<Mutex<Vec<Option<Receiver<String>>>>> =
        Arc::new(Mutex::new(vec![None; hostnames.len()]));
    for (i, &host) in hostnames.iter().enumerate() {
        let resolver = Arc::clone(&resolver);
        let pending = Arc::clone(&dns_pending);
        pool.execute(move || {
            info!("Starting DNS resolution for {}", host);
            pending.lock()[i] = Some(resolver.resolve(host));
            Ok(())
        })?;
    }

    pool.wait_for_idle()?;
    info!("All jobs completed");

    info!("Fibonacci Results:");
    for (n, value) in fib_inputs.iter().zip(fib_results.lock().iter()) {
        info!("Fibonacci({}) = {}", n, value);
    }

    info!("Prime Factorization Results:");
    for (n, factors) in prime_inputs.iter().zip(prime_results.lock().iter()) {
        let rendered: Vec<String> = factors.iter().map(u64::to_string).collect();
        info!("Factors of {} = {}", n, rendered.join(" "));
    }

    info!("Collatz Conjecture Results:");
    for (n, steps) in collatz_inputs.iter().zip(collatz_results.lock().iter()) {
        info!("Collatz steps for {} = {}", n, steps);
    }

    info!("DNS Resolution Results:");
    for (host, pending) in hostnames.iter().zip(dns_pending.lock().iter_mut()) {
        let answer = pending
            .take()
            .and_then(|rx| rx.recv().ok())
            .unwrap_or_else(|| "No results".to_string());
        info!("{}: {}", host, answer);
    }

    let stats = pool.stats();
    info!(
        "Pool statistics: {} submitted, {} completed, {} failed, avg {:.2}us",
        stats.jobs_submitted,
        stats.jobs_completed,
        stats.jobs_failed,
        stats.average_processing_time_us()
    );

    Ok(())
}
