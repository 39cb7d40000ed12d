// src/main.rs
use aqua_miner_rs::miner::{
    ArgonParams, CANONICAL_PARAMS, HeapAllocator, MemoryAllocator, Seed, network_verifier,
    seed::JOB_HASH_LEN,
};
use aqua_miner_rs::network::{HttpTransport, RequestIds, RpcTransport, submit::Connector};
use aqua_miner_rs::utils::logging::init_bench_logging;
use aqua_miner_rs::*;
use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Timeout of a single JSON-RPC request
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between hashrate lines
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Nonces per benchmark search call
const BENCH_BATCH: u64 = 256;

/// Main entry point for the Aquachain miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Starts the mining operation with given configuration options
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads configuration and applies CLI overrides
/// 3. Sets and freezes the Argon2id parameters
/// 4. Starts the work updater, the workers and the reporter
/// 5. Runs until Ctrl+C, then stops everything in reverse order
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = if opts.config.exists() {
        config::load(&opts.config)?
    } else {
        log::warn!(
            "{} not found, using default configuration",
            opts.config.display()
        );
        Config::default()
    };
    apply_overrides(&mut config, &opts)?;
    config.validate()?;

    // Parameters are written here only; building the hasher freezes them.
    let params = Arc::new(HashParameters::new());
    let argon: ArgonParams = config.argon.into();
    params.set(argon.time_cost, argon.memory_cost, argon.lanes);
    if config.force_submit {
        params.force_submit();
    }
    let hasher: Arc<dyn KeyedHasher> = Arc::new(Argon2idHasher::new(&params)?);
    if !params.is_mineable() {
        log::warn!(
            "argon parameters {:?} are not the network's {:?}; {}",
            argon,
            CANONICAL_PARAMS,
            if params.submit_enabled() {
                "submitting anyway (--force-submit)"
            } else {
                "winners will not be submitted"
            }
        );
    }
    let verifier = network_verifier(hasher.clone(), &params);

    log::info!(
        "{} mining on {} with {} devices, batch {}",
        config.mode,
        config.getwork_url,
        config.devices,
        config.batch_size
    );

    let runtime = Runtime::new()?;
    let counters = Arc::new(GlobalCounters::new());
    let ids = Arc::new(RequestIds::new());
    let feed = Arc::new(SharedJobFeed::new());

    let transport: Arc<dyn RpcTransport> = Arc::new(HttpTransport::new(RPC_TIMEOUT)?);
    let updater = WorkUpdater::new(
        NodeClient::new(config.getwork_url.clone(), transport, ids.clone()),
        feed.clone(),
        config.refresh_interval(),
    );
    let updater_run = Arc::new(AtomicBool::new(true));
    let updater_task = runtime.spawn(updater.run(updater_run.clone()));

    let connector: Connector =
        Box::new(|| Ok(Box::new(HttpTransport::new(RPC_TIMEOUT)?) as Box<dyn RpcTransport>));
    let submissions = Arc::new(SubmissionChannel::new(
        config.submit_endpoint(),
        config.mode,
        params.clone(),
        counters.clone(),
        ids,
        connector,
        runtime.handle().clone(),
    ));

    let allocator: Arc<dyn MemoryAllocator> = Arc::new(HeapAllocator);
    let ctx = Arc::new(WorkerContext {
        mode: config.mode,
        batch_size: config.batch_size,
        poll_interval: config.refresh_interval(),
        reject_wait: config.reject_wait(),
        run: Arc::new(AtomicBool::new(false)),
        feed,
        counters: counters.clone(),
        submissions,
        verifier,
        allocator: allocator.clone(),
    });
    let supervisor = Supervisor::new(ctx, CpuSearch::factory(hasher, allocator));
    supervisor.start(config.devices)?;

    let reporter = StatsReporter::new(counters, REPORT_INTERVAL, config.devices, config.mode).start();

    runtime.block_on(tokio::signal::ctrl_c())?;
    log::info!("interrupt received, shutting down");

    reporter.stop();
    updater_run.store(false, Ordering::Relaxed);
    updater_task.abort();
    supervisor.stop()?;
    Ok(())
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, opts: &cli::StartOptions) -> Result<(), MinerError> {
    if let Some(devices) = opts.devices {
        config.devices = devices;
    }
    if opts.solo {
        config.mode = MiningMode::Solo;
    }
    if let Some(url) = &opts.url {
        config.getwork_url = url.clone();
    }
    if let Some(argon) = &opts.argon {
        config.argon = config::parse_argon(argon)?.into();
    }
    if opts.force_submit {
        config.force_submit = true;
    }
    if let Some(refresh) = &opts.refresh {
        let interval = config::parse_refresh_rate(refresh)?;
        config.refresh_rate_ms = (interval.as_millis() as u64).max(1);
    }
    Ok(())
}

/// Runs a CPU hashrate benchmark
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Builds an Argon2id hasher for the requested parameters
/// 3. Runs one CPU search device per thread against an unreachable target
/// 4. Reports total hashes and average hashrate
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let argon = config::parse_argon(&opts.argon)?;
    let params = HashParameters::new();
    params.set(argon.time_cost, argon.memory_cost, argon.lanes);
    let hasher: Arc<dyn KeyedHasher> = Arc::new(Argon2idHasher::new(&params)?);
    let allocator: Arc<dyn MemoryAllocator> = Arc::new(HeapAllocator);
    let counters = Arc::new(GlobalCounters::new());
    let reporter = StatsReporter::new(
        counters.clone(),
        REPORT_INTERVAL,
        opts.threads,
        MiningMode::Solo,
    )
    .start();

    log::info!(
        "Starting {} {:?} benchmark for {} seconds on {} threads",
        hasher.name(),
        argon,
        opts.duration,
        opts.threads
    );

    let start_time = Instant::now();
    let deadline = start_time + Duration::from_secs(opts.duration);
    let handles: Vec<_> = (0..opts.threads)
        .map(|index| {
            let mut device = CpuSearch::new(index, hasher.clone(), allocator.clone());
            let counters = counters.clone();
            std::thread::spawn(move || -> Result<(), MinerError> {
                let seed = Seed::derive(&[0u8; JOB_HASH_LEN], 0)?;
                let unreachable = Target::zero();
                let mut nonce = (index as u64) << 40;
                let mut last_log = Instant::now();
                let mut hashes = 0u64;

                while Instant::now() < deadline {
                    device.search(&seed, nonce, BENCH_BATCH, &unreachable)?;
                    counters.add_hashes(BENCH_BATCH);
                    nonce = nonce.wrapping_add(BENCH_BATCH);
                    hashes += BENCH_BATCH;

                    if last_log.elapsed().as_secs() >= 1 {
                        log::debug!(
                            "{}: {:.1} H/s",
                            device.name(),
                            hashes as f64 / last_log.elapsed().as_secs_f64()
                        );
                        hashes = 0;
                        last_log = Instant::now();
                    }
                }
                Ok(())
            })
        })
        .collect();

    // Wait for all threads to complete
    for handle in handles {
        handle
            .join()
            .map_err(|_| MinerError::TaskError("benchmark thread panicked".into()))??;
    }
    reporter.stop();

    let total = counters.total_hashes_computed();
    let elapsed = start_time.elapsed().as_secs_f64();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", total);
    log::info!("Average hashrate: {:.2} H/s", total as f64 / elapsed.max(f64::EPSILON));
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template(opts.solo);
    std::fs::write(&opts.output, config)?;
    println!("wrote {}", opts.output.display());
    Ok(())
}
