// scripts/benchmark.rs
use chrono::NaiveDate;
use const_sde::analytics::bs_analytic;
use const_sde::market::{
    BlackConstantVol, BlackVarianceCurve, DayCounter, FlatForward, ForwardCurve, SimpleQuote,
};
use const_sde::mc::{McEngine, McEngineBuilder, McResult, Payoff};
use const_sde::process::{BlackScholesProcess, ConstantParameterProcess};
use const_sde::rng::RngPolicy;
use const_sde::{SdeResult, StochasticProcess};
use std::env;
use std::sync::Arc;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rayon_threads: usize,
    rustc_flags: String,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rayon_threads: rayon::current_num_threads(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    samples: usize,
    steps: usize,
    time_ms: f64,
    throughput_samples_per_sec: f64,
    value: f64,
    error_estimate: Option<f64>,
    reference: Option<f64>,
}

impl BenchmarkResult {
    fn from_run(name: &str, engine: &McEngine, result: &McResult, reference: Option<f64>) -> Self {
        BenchmarkResult {
            name: name.to_string(),
            samples: result.samples,
            steps: engine.time_grid().steps(),
            time_ms: result.elapsed_ms,
            throughput_samples_per_sec: result.samples as f64 / (result.elapsed_ms / 1000.0),
            value: result.price,
            error_estimate: result.error_estimate,
            reference,
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Valid calendar date")
}

fn flat_process() -> SdeResult<Arc<BlackScholesProcess>> {
    let today = date(1998, 5, 15);
    let dc = DayCounter::Actual365Fixed;
    Ok(Arc::new(BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(36.0)),
        Arc::new(FlatForward::new(today, 0.0, dc)?),
        Arc::new(FlatForward::new(today, 0.06, dc)?),
        Arc::new(BlackConstantVol::new(today, 0.20, dc)),
    )))
}

fn term_structure_process() -> SdeResult<Arc<BlackScholesProcess>> {
    let dc = DayCounter::Actual365Fixed;
    let nodes = [date(1998, 5, 17), date(1999, 5, 17), date(2001, 5, 17)];
    Ok(Arc::new(BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(36.0)),
        Arc::new(FlatForward::new(date(1998, 5, 17), 0.0, dc)?),
        Arc::new(ForwardCurve::new(nodes.to_vec(), vec![0.06, 0.05, 0.04], dc)?),
        Arc::new(BlackVarianceCurve::new(date(1998, 5, 15), &nodes, &[0.20, 0.25, 0.33], dc)?),
    )))
}

fn put_engine(process: Arc<BlackScholesProcess>, samples: usize) -> McEngineBuilder {
    McEngine::builder(process)
        .with_maturity_date(date(2001, 5, 17))
        .with_payoff(Payoff::EuropeanPut { k: 40.0 })
        .with_samples(samples)
        .with_seed(42)
}

fn run(name: &str, builder: McEngineBuilder, reference: Option<f64>) -> SdeResult<BenchmarkResult> {
    println!("Running {}...", name);
    let mut engine = builder.build()?;
    let result = engine.calculate()?;
    Ok(BenchmarkResult::from_run(name, &engine, &result, reference))
}

fn run_benchmarks() -> SdeResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();

    let flat = flat_process()?;
    let t = flat.time(date(2001, 5, 17));
    let flat_reference = bs_analytic::bs_put_price(36.0, 40.0, 0.06, 0.0, 0.20, t);

    for &samples in &[10_000, 100_000, 1_000_000] {
        let k = samples / 1000;
        results.push(run(
            &format!("Flat, constant, 1 step ({}k)", k),
            put_engine(flat.clone(), samples)
                .with_steps(1)
                .with_antithetic_variate(true)
                .with_constant_parameter_model(true),
            Some(flat_reference),
        )?);
        results.push(run(
            &format!("Flat, general, 1 step ({}k)", k),
            put_engine(flat.clone(), samples)
                .with_steps(1)
                .with_antithetic_variate(true),
            Some(flat_reference),
        )?);
    }

    results.push(run(
        "Flat, constant, parallel batches (1M)",
        put_engine(flat.clone(), 1_000_000)
            .with_steps(1)
            .with_antithetic_variate(true)
            .with_constant_parameter_model(true)
            .with_parallel_batches(),
        Some(flat_reference),
    )?);
    results.push(run(
        "Flat, constant, Sobol (65k)",
        put_engine(flat, 65_535)
            .with_steps(1)
            .with_rng(RngPolicy::LowDiscrepancy)
            .with_constant_parameter_model(true),
        Some(flat_reference),
    )?);

    // frozen parameters give the closed form its inputs
    let curves = term_structure_process()?;
    let t = curves.time(date(2001, 5, 17));
    let frozen = ConstantParameterProcess::from_process(&curves, t)?;
    let frozen_reference = bs_analytic::bs_put_price(
        36.0,
        40.0,
        frozen.frozen_risk_free_rate(),
        frozen.frozen_dividend_rate(),
        frozen.frozen_volatility(),
        t,
    );

    for &steps_per_year in &[12, 52, 365] {
        results.push(run(
            &format!("Curves, general, {} steps/year", steps_per_year),
            put_engine(curves.clone(), 100_000)
                .with_steps_per_year(steps_per_year)
                .with_antithetic_variate(true),
            Some(frozen_reference),
        )?);
    }
    results.push(run(
        "Curves, constant, 1 step",
        put_engine(curves, 100_000)
            .with_steps(1)
            .with_antithetic_variate(true)
            .with_constant_parameter_model(true),
        Some(frozen_reference),
    )?);

    Ok(results)
}

fn main() -> SdeResult<()> {
    println!("const-sde Benchmark Suite");
    println!("=========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let results = run_benchmarks()?;

    println!("\n{:=<110}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<110}", "");
    println!(
        "{:<40} {:>8} {:>6} {:>10} {:>12} {:>9} {:>9} {:>9}",
        "Benchmark", "Samples", "Steps", "Time (ms)", "Throughput", "Value", "Std Err", "Ref"
    );
    println!("{:-<110}", "");
    for result in &results {
        println!(
            "{:<40} {:>8} {:>6} {:>10.2} {:>12.0} {:>9.4} {:>9} {:>9}",
            result.name,
            result.samples,
            result.steps,
            result.time_ms,
            result.throughput_samples_per_sec,
            result.value,
            result
                .error_estimate
                .map(|e| format!("{:.4}", e))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .reference
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
    Ok(())
}
