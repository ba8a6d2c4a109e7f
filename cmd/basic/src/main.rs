//! Basic bsignals example
//!
//! Connects one slot per execution scheme plus a member slot, emits a
//! few events and prints what each slot saw.
//!
//! # Environment Variables
//!
//! - `BSIG_FLUSH_EPRINT=1` - Flush debug output immediately (useful for crash debugging)
//! - `BSIG_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `BSIG_MAX_ASYNC_THREADS=2` - Cap live asynchronous threads

use bsignals::{kdebug, kinfo, ExecutorScheme, Signal, SignalResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Observer whose method is connected as a slot
struct Thermostat {
    name: &'static str,
    readings: Mutex<Vec<f64>>,
}

impl Thermostat {
    fn on_reading(&self, (sensor, value): &(u32, f64)) {
        kdebug!("[{}] sensor {} reads {:.1}", self.name, sensor, value);
        self.readings.lock().unwrap().push(*value);
    }
}

// BSIG_LOG_LEVEL=debug BSIG_FLUSH_EPRINT=1 cargo run -p bsignals-basic
fn main() -> SignalResult<()> {
    println!("=== bsignals Basic Example ===\n");

    let mut signal: Signal<(u32, f64)> = Signal::new();
    signal.config().print();

    let completed = Arc::new(AtomicUsize::new(0));
    let strand_log = Arc::new(Mutex::new(Vec::new()));

    let sync_id = signal.connect(ExecutorScheme::Synchronous, |(sensor, value)| {
        println!("[sync]   sensor {} -> {:.1}", sensor, value);
    })?;

    let c = completed.clone();
    signal.connect(ExecutorScheme::Asynchronous, move |(sensor, _)| {
        kdebug!("[async]  sensor {}", sensor);
        c.fetch_add(1, Ordering::SeqCst);
    })?;

    let c = completed.clone();
    let log = strand_log.clone();
    signal.connect(ExecutorScheme::Strand, move |(sensor, _)| {
        log.lock().unwrap().push(*sensor);
        c.fetch_add(1, Ordering::SeqCst);
    })?;

    let c = completed.clone();
    signal.connect(ExecutorScheme::ThreadPooled, move |(sensor, _)| {
        kdebug!("[pool]   sensor {}", sensor);
        c.fetch_add(1, Ordering::SeqCst);
    })?;

    let thermostat = Arc::new(Thermostat {
        name: "hall",
        readings: Mutex::new(Vec::new()),
    });
    signal.connect_member(ExecutorScheme::Synchronous, thermostat.clone(), Thermostat::on_reading)?;

    println!("Connected {} slots\n", signal.len());

    let emits = 5;
    for sensor in 1..=emits {
        signal.emit((sensor, 18.0 + sensor as f64 * 0.5));
    }

    // Three deferred slots per emission
    let expected = emits as usize * 3;
    let start = Instant::now();
    while completed.load(Ordering::SeqCst) < expected {
        if start.elapsed() > Duration::from_secs(10) {
            println!("WARNING: Timeout!");
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("\nStrand order:     {:?}", strand_log.lock().unwrap());
    println!("Member readings:  {:?}", thermostat.readings.lock().unwrap());

    signal.disconnect(sync_id);
    signal.emit((99, 0.0));
    println!("After disconnect: {} slots", signal.len());

    signal.disconnect_all();
    kinfo!("stats: {:?}", signal.stats());

    println!("\n=== Example Complete ===");
    Ok(())
}
