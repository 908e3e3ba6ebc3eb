//! A multi-producer, multi-consumer demo of CIQueue shutdown.
//!
//! Producers push numbered messages until they have sent their share, then the main thread ends
//! the run with either `close` (consumers drain what is left) or `interrupt` (what is left is
//! discarded). With `--shutdown-after` the shutdown happens mid-run instead, so producers see
//! it too. Every worker reports the error that made it stop.

use clap::{Parser, ValueEnum};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{Level, debug, info, warn};
use yep_ciq::{CIFifoStore, CILifoStore, CIPriorityStore, CIQueue, CIQueueError, CIStore};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Order {
    Fifo,
    Lifo,
    Priority,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Shutdown {
    /// Let consumers drain the queue, then stop them
    Close,
    /// Throw away whatever is still queued and stop everyone now
    Interrupt,
}

/// Run producers and consumers over a closable, interruptible queue
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Queue capacity (0 for unbounded)
    #[arg(short = 'd', long, default_value = "16")]
    capacity: usize,

    /// Total number of messages to send
    #[arg(short = 'n', long, default_value = "1000")]
    msg_count: u64,

    /// Number of producer threads
    #[arg(short = 'p', long, default_value = "2")]
    producer_threads: u16,

    /// Number of consumer threads
    #[arg(short = 'c', long, default_value = "2")]
    consumer_threads: u16,

    /// Ordering of queued messages
    #[arg(short = 'o', long, value_enum, default_value_t = Order::Fifo)]
    order: Order,

    /// How to end the run
    #[arg(short = 's', long, value_enum, default_value_t = Shutdown::Close)]
    shutdown: Shutdown,

    /// Shut the queue down once this many messages were produced, while producers are still
    /// running, instead of waiting for them to finish
    #[arg(short = 'a', long)]
    shutdown_after: Option<u64>,

    /// Delay per consumed message in microseconds, to leave work queued at shutdown
    #[arg(long, default_value = "0")]
    consume_delay_us: u64,

    /// Enable verbose logging
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Report {
    produced: u64,
    consumed: u64,
    producer_exits: Vec<Option<CIQueueError>>,
    consumer_exits: Vec<CIQueueError>,
}

fn shut_down<S: CIStore<u64>>(queue: &CIQueue<u64, S>, mode: Shutdown) {
    info!(queued = ?queue.size(), ?mode, "shutting down");
    match mode {
        Shutdown::Close => queue.close(),
        Shutdown::Interrupt => queue.interrupt(),
    }
}

fn run<S>(args: &Args) -> Report
where
    S: CIStore<u64> + Default + Send,
{
    let queue: CIQueue<u64, S> = CIQueue::new(args.capacity);
    let next_id = AtomicU64::new(0);
    let produced = AtomicU64::new(0);
    let consumed = AtomicU64::new(0);
    let consume_delay = Duration::from_micros(args.consume_delay_us);

    let (producer_exits, consumer_exits) = thread::scope(|s| {
        let consumers: Vec<_> = (0..args.consumer_threads)
            .map(|i| {
                let (queue, consumed) = (&queue, &consumed);
                s.spawn(move || loop {
                    match queue.get(true, None) {
                        Ok(id) => {
                            debug!(consumer = i, id, "consumed");
                            consumed.fetch_add(1, Ordering::Relaxed);
                            if !consume_delay.is_zero() {
                                thread::sleep(consume_delay);
                            }
                        }
                        Err(e) => return e,
                    }
                })
            })
            .collect();

        let producers: Vec<_> = (0..args.producer_threads)
            .map(|i| {
                let (queue, next_id, produced) = (&queue, &next_id, &produced);
                let msg_count = args.msg_count;
                s.spawn(move || {
                    loop {
                        let id = next_id.fetch_add(1, Ordering::AcqRel);
                        if id >= msg_count {
                            return None;
                        }
                        if let Err(e) = queue.put(id, true, None) {
                            return Some(e.kind());
                        }
                        debug!(producer = i, id, "produced");
                        produced.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        if let Some(threshold) = args.shutdown_after {
            while produced.load(Ordering::Relaxed) < threshold
                && !producers.iter().all(|p| p.is_finished())
            {
                thread::sleep(Duration::from_millis(1));
            }
            shut_down(&queue, args.shutdown);
        }

        let producer_exits: Vec<_> = producers
            .into_iter()
            .map(|p| p.join().expect("producer panicked"))
            .collect();
        info!("producers finished");

        if args.shutdown_after.is_none() {
            shut_down(&queue, args.shutdown);
        }

        let consumer_exits: Vec<_> = consumers
            .into_iter()
            .map(|c| c.join().expect("consumer panicked"))
            .collect();

        (producer_exits, consumer_exits)
    });

    Report {
        produced: produced.load(Ordering::Relaxed),
        consumed: consumed.load(Ordering::Relaxed),
        producer_exits,
        consumer_exits,
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_thread_names(true)
        .init();

    if args.producer_threads == 0 || args.consumer_threads == 0 {
        warn!("need at least one producer and one consumer");
        std::process::exit(1);
    }

    info!(
        capacity = args.capacity,
        order = ?args.order,
        shutdown = ?args.shutdown,
        "starting run"
    );

    let report = match args.order {
        Order::Fifo => run::<CIFifoStore<u64>>(&args),
        Order::Lifo => run::<CILifoStore<u64>>(&args),
        Order::Priority => run::<CIPriorityStore<u64>>(&args),
    };

    let discarded = report.produced - report.consumed;
    println!("produced:  {}", report.produced);
    println!("consumed:  {}", report.consumed);
    println!("discarded: {discarded}");
    println!("producer exits: {:?}", report.producer_exits);
    println!("consumer exits: {:?}", report.consumer_exits);

    if matches!(args.shutdown, Shutdown::Close) && discarded != 0 {
        warn!(discarded, "close should never lose messages");
        std::process::exit(1);
    }
}
