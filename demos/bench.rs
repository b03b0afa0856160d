use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use spin_anneal::{
    BigFloat, ConsoleSink, Lattice, LinkSpec, RandomBlockTemplate, RunScheduler, ScheduleConfig,
};

const N: usize = 100;
const RUNS: usize = 16;
const CONCURRENCY: usize = 4;

fn main() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(10);
    let lattice: Lattice<f32> = Lattice::random(N, &mut rng);

    let config = ScheduleConfig {
        start_temperature: 10.0,
        final_temperature: 5.0,
        temperature_step: 0.1,
        temperature_threshold: 1.0,
        interaction_multiplier: BigFloat::from_decimal_log(-30.0),
        run_count: RUNS,
        concurrency: CONCURRENCY,
        sweep_cap: None,
    };

    // Two mutually coupled sets per block.
    let template = RandomBlockTemplate::new(
        N,
        vec![LinkSpec::Targets(vec![1]), LinkSpec::Targets(vec![0])],
        42,
    );

    println!(
        "Lattice: {N}x{N}  |  Runs: {RUNS}  |  Concurrency: {CONCURRENCY}  |  Step: {}",
        config.temperature_step
    );
    println!("{}", "-".repeat(70));

    let scheduler = RunScheduler::new(Arc::new(lattice), config).unwrap();
    let sink = ConsoleSink::stdout();

    let t0 = Instant::now();
    let reports = scheduler.run(&template, &sink).unwrap();
    let elapsed = t0.elapsed().as_secs_f64();

    let best = reports
        .iter()
        .flat_map(|r| r.sets.iter().map(|s| s.hamiltonian))
        .fold(f64::INFINITY, f64::min);
    println!("{}", "-".repeat(70));
    println!("Total: {elapsed:.3} s  |  best Hamiltonian: {best:.4}");
}
