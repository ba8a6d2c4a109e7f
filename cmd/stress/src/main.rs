//! Stress test - many emissions, concurrent registry churn
//!
//! Phase 1 pushes a large number of emissions through thread-pooled and
//! strand slots and checks nothing is lost. Phase 2 runs connect and
//! disconnect against emit on a `SafeSignal` for a fixed duration and
//! checks the final slot count. The churned slots use `scheme`, one of
//! `sync`, `async`, `strand` or `pool` (default `sync`).
//!
//! Usage: `stress [emits] [seconds] [scheme]`

use bsignals::{ExecutorScheme, Signal, SignalResult, SlotId};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POOL_SLOTS: u64 = 4;
const MAX_CHURN_SLOTS: usize = 8;

fn main() -> SignalResult<()> {
    println!("=== bsignals Stress Test ===\n");

    let num_emits: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let churn_secs: u64 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);
    let churn_scheme = match std::env::args().nth(3) {
        Some(arg) => match arg.parse::<ExecutorScheme>() {
            Ok(scheme) => scheme,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => ExecutorScheme::Synchronous,
    };

    throughput(num_emits)?;
    churn(Duration::from_secs(churn_secs), churn_scheme)?;

    println!("\n=== Stress Test Complete ===");
    Ok(())
}

fn throughput(num_emits: u64) -> SignalResult<()> {
    println!("Emitting {} events to {} pooled slots + 1 strand...", num_emits, POOL_SLOTS);

    let mut signal: Signal<u64> = Signal::new();
    let pooled = Arc::new(AtomicU64::new(0));
    let stranded = Arc::new(AtomicU64::new(0));
    let in_order = Arc::new(AtomicBool::new(true));

    for _ in 0..POOL_SLOTS {
        let pooled = pooled.clone();
        signal.connect(ExecutorScheme::ThreadPooled, move |_| {
            pooled.fetch_add(1, Ordering::Relaxed);
        })?;
    }
    {
        let stranded = stranded.clone();
        let in_order = in_order.clone();
        signal.connect(ExecutorScheme::Strand, move |n| {
            // Strand delivery is strictly ordered: n is the count seen so far
            if stranded.fetch_add(1, Ordering::Relaxed) != *n {
                in_order.store(false, Ordering::Relaxed);
            }
        })?;
    }

    let start = Instant::now();
    for n in 0..num_emits {
        signal.emit(n);
        if (n + 1) % 10_000 == 0 {
            print!("\rEmitted: {}/{}", n + 1, num_emits);
        }
    }
    let emit_time = start.elapsed();

    let expected_pooled = num_emits * POOL_SLOTS;
    let wait_start = Instant::now();
    loop {
        let done = pooled.load(Ordering::Relaxed) + stranded.load(Ordering::Relaxed);
        if done >= expected_pooled + num_emits {
            break;
        }
        if wait_start.elapsed().as_secs() > 30 {
            println!("\nTimeout! Only {}/{} delivered", done, expected_pooled + num_emits);
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }
    let total_time = start.elapsed();

    println!("\n\n=== Throughput ===");
    println!("Pooled deliveries: {}/{}", pooled.load(Ordering::Relaxed), expected_pooled);
    println!("Strand deliveries: {}/{}", stranded.load(Ordering::Relaxed), num_emits);
    println!("Strand in order:   {}", in_order.load(Ordering::Relaxed));
    println!("Emit time:         {:?}", emit_time);
    println!("Total time:        {:?}", total_time);
    println!("Throughput:        {:.0} emits/sec", num_emits as f64 / total_time.as_secs_f64());
    println!("Stats:             {:?}", signal.stats());
    Ok(())
}

fn churn(duration: Duration, scheme: ExecutorScheme) -> SignalResult<()> {
    println!("\nChurning {} connect/disconnect against emit for {:?}...", scheme, duration);

    let signal = Arc::new(Signal::<u64>::with_safety());
    let stop = Arc::new(AtomicBool::new(false));
    let net = Arc::new(AtomicI64::new(0));
    let delivered = Arc::new(AtomicU64::new(0));

    let emitter = {
        let signal = signal.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut n = 0u64;
            while !stop.load(Ordering::Relaxed) {
                signal.emit(n);
                n += 1;
            }
            n
        })
    };

    let mutator = {
        let signal = signal.clone();
        let stop = stop.clone();
        let net = net.clone();
        let delivered = delivered.clone();
        thread::spawn(move || -> SignalResult<()> {
            let mut kept: Vec<SlotId> = Vec::new();
            let mut round = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let delivered = delivered.clone();
                let id = signal.connect(scheme, move |_| {
                    delivered.fetch_add(1, Ordering::Relaxed);
                })?;
                net.fetch_add(1, Ordering::Relaxed);
                kept.push(id);

                // Disconnect the oldest slot on two rounds out of three
                if round % 3 != 0 || kept.len() > MAX_CHURN_SLOTS {
                    let oldest = kept.remove(0);
                    if signal.disconnect(oldest) {
                        net.fetch_sub(1, Ordering::Relaxed);
                    }
                }
                round += 1;
            }
            Ok(())
        })
    };

    thread::sleep(duration);
    stop.store(true, Ordering::Relaxed);

    let emits = emitter.join().unwrap_or(0);
    if let Ok(result) = mutator.join() {
        result?;
    }

    println!("\n=== Churn ===");
    println!("Emits:             {}", emits);
    println!("Stats:             {:?}", signal.stats());
    println!("Deliveries:        {}", delivered.load(Ordering::Relaxed));
    println!("Net connects:      {}", net.load(Ordering::Relaxed));
    println!("Final slot count:  {}", signal.len());
    println!(
        "Registry intact:   {}",
        signal.len() as i64 == net.load(Ordering::Relaxed)
    );
    Ok(())
}
