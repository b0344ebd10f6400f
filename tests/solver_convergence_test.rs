// tests/solver_convergence_test.rs
use chrono::NaiveDate;
use const_sde::market::{
    BlackConstantVol, BlackVarianceCurve, BlackVolTermStructure, DayCounter, FlatForward,
    ForwardCurve, SimpleQuote, YieldTermStructure,
};
use const_sde::mc::{McEngine, Payoff};
use const_sde::process::{BlackScholesProcess, ConstantParameterProcess, StochasticProcess};
use const_sde::rng::{PseudoRandomSequence, RandomSequenceGenerator};
use const_sde::TimeGrid;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn flat_constant(r: f64, q: f64, vol: f64, horizon: f64) -> ConstantParameterProcess {
    let today = date(2020, 1, 1);
    let dc = DayCounter::Actual365Fixed;
    ConstantParameterProcess::builder()
        .spot(Arc::new(SimpleQuote::new(100.0)))
        .dividend_yield(Arc::new(FlatForward::new(today, q, dc).unwrap()))
        .risk_free_rate(Arc::new(FlatForward::new(today, r, dc).unwrap()))
        .black_volatility(Arc::new(BlackConstantVol::new(today, vol, dc)))
        .horizon(horizon)
        .build()
        .unwrap()
}

// Term structures of the 36/40 put example: piecewise forwards and a
// variance curve with three nodes.
fn term_structure_process() -> BlackScholesProcess {
    let dc = DayCounter::Actual365Fixed;
    let nodes = [date(1998, 5, 17), date(1999, 5, 17), date(2001, 5, 17)];
    let rates = ForwardCurve::new(nodes.to_vec(), vec![0.06, 0.05, 0.04], dc).unwrap();
    let vols = BlackVarianceCurve::new(date(1998, 5, 15), &nodes, &[0.20, 0.25, 0.33], dc).unwrap();
    BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(36.0)),
        Arc::new(FlatForward::new(date(1998, 5, 17), 0.0, dc).unwrap()),
        Arc::new(rates),
        Arc::new(vols),
    )
}

#[test]
fn test_constant_process_law_of_large_numbers() {
    let n = 200_000;
    for &dt in &[0.25, 1.0, 3.0] {
        let process = flat_constant(0.05, 0.01, 0.3, dt);
        let x0 = process.x0();
        let mut rng = PseudoRandomSequence::new(1, 7);

        let (mut sum, mut sum_sq, mut sum_log) = (0.0, 0.0, 0.0);
        for _ in 0..n {
            let x = process.evolve(0.0, x0, dt, rng.next_sequence()[0]);
            sum += x;
            sum_sq += x * x;
            sum_log += (x / x0).ln();
        }
        let mean = sum / n as f64;
        let se = ((sum_sq / n as f64 - mean * mean) / n as f64).sqrt();
        let log_mean = sum_log / n as f64;
        let log_se = process.frozen_volatility() * dt.sqrt() / (n as f64).sqrt();

        // the log-increment is centred on Δt·μ; the level on x0·exp((r − q)Δt)
        let expected_log = dt * process.frozen_drift();
        let expected_mean = x0 * ((0.05 - 0.01) * dt).exp();
        println!(
            "dt={}: log mean {} vs {}, mean {} vs {}",
            dt, log_mean, expected_log, mean, expected_mean
        );
        assert!((log_mean - expected_log).abs() < 4.0 * log_se);
        assert!((mean - expected_mean).abs() < 4.0 * se);
    }
}

#[test]
fn test_constant_process_one_step_equals_two_half_steps() {
    let n = 200_000;
    let dt = 2.0;
    let process = flat_constant(0.04, 0.0, 0.25, dt);
    let x0 = process.x0();
    let mut one_rng = PseudoRandomSequence::new(1, 11);
    let mut two_rng = PseudoRandomSequence::new(2, 13);

    let mut one = Vec::with_capacity(n);
    let mut two = Vec::with_capacity(n);
    for _ in 0..n {
        one.push(process.evolve(0.0, x0, dt, one_rng.next_sequence()[0]).ln());
        let z = two_rng.next_sequence();
        let mid = process.evolve(0.0, x0, dt / 2.0, z[0]);
        two.push(process.evolve(dt / 2.0, mid, dt / 2.0, z[1]).ln());
    }

    let moments = |v: &[f64]| {
        let m = v.iter().sum::<f64>() / v.len() as f64;
        let var = v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() - 1) as f64;
        (m, var)
    };
    let (m1, v1) = moments(&one);
    let (m2, v2) = moments(&two);
    let exact_var = 0.25 * 0.25 * dt;
    let mean_se = (2.0 * exact_var / n as f64).sqrt();

    println!("one step: ({}, {}), two half steps: ({}, {})", m1, v1, m2, v2);
    assert!((m1 - m2).abs() < 4.0 * mean_se);
    assert!((v1 / v2 - 1.0).abs() < 0.02);
    assert!((v1 / exact_var - 1.0).abs() < 0.02);
}

#[test]
fn test_euler_bias_shrinks_with_step_size() {
    // deterministic: the Euler log-drift and variance sums against their integrals
    let process = term_structure_process();
    let t_end = process.time(date(2001, 5, 17));
    let exact_variance = process.black_volatility().black_variance(t_end, 36.0);
    let exact_log_drift = process.risk_free_rate().zero_rate(t_end) * t_end - 0.5 * exact_variance;

    let errors: Vec<(usize, f64, f64)> = [12, 52, 365]
        .iter()
        .map(|&steps| {
            let grid = TimeGrid::new(t_end, steps).unwrap();
            let (mut drift, mut variance) = (0.0, 0.0);
            for i in 0..grid.steps() {
                let (t, dt) = (grid.times()[i], grid.dt(i));
                drift += process.drift(t, 36.0) * dt;
                variance += process.diffusion(t, 36.0).powi(2) * dt;
            }
            (steps, (drift - exact_log_drift).abs(), (variance - exact_variance).abs())
        })
        .collect();

    for (steps, drift_err, var_err) in &errors {
        println!("steps={}: drift error {:e}, variance error {:e}", steps, drift_err, var_err);
    }
    assert!(errors[2].1 < errors[0].1);
    assert!(errors[2].2 < errors[0].2);
    assert!(errors[2].1 < 1e-3);
    assert!(errors[2].2 < 1e-3);
}

#[test]
fn test_constant_process_has_no_step_bias_on_term_structures() {
    // the frozen process at T reproduces the same terminal moments with 1 or 50 steps
    let general = term_structure_process();
    let t_end = general.time(date(2001, 5, 17));
    let frozen = ConstantParameterProcess::from_process(&general, t_end).unwrap();

    let log_moments = |steps: usize| {
        let grid = TimeGrid::new(t_end, steps).unwrap();
        let (mut drift, mut variance) = (0.0, 0.0);
        for i in 0..grid.steps() {
            drift += frozen.drift(grid.times()[i], 36.0) * grid.dt(i);
            variance += frozen.diffusion(grid.times()[i], 36.0).powi(2) * grid.dt(i);
        }
        (drift, variance)
    };
    let (d1, v1) = log_moments(1);
    let (d50, v50) = log_moments(50);
    assert!((d1 - frozen.expected_log_return()).abs() < 1e-14);
    assert!((d1 - d50).abs() < 1e-12);
    assert!((v1 - v50).abs() < 1e-12);
    assert!((v1 - frozen.step_std_dev().powi(2)).abs() < 1e-12);
}

#[test]
fn test_general_and_constant_engines_on_term_structures() {
    let process = Arc::new(term_structure_process());
    let base = McEngine::builder(process)
        .with_maturity_date(date(2001, 5, 17))
        .with_payoff(Payoff::EuropeanPut { k: 40.0 })
        .with_antithetic_variate(true)
        .with_samples(50_000)
        .with_seed(42);

    let mut general = base.clone().with_steps_per_year(52).build().unwrap();
    let mut constant = base
        .with_steps(1)
        .with_constant_parameter_model(true)
        .build()
        .unwrap();

    let g = general.calculate().unwrap();
    let c = constant.calculate().unwrap();
    let se = g.error_estimate.unwrap().hypot(c.error_estimate.unwrap());

    println!("\nGeneral (Euler, weekly): {} ± {:?}", g.price, g.error_estimate);
    println!("Constant (exact, 1 step): {} ± {:?}", c.price, c.error_estimate);

    // terminal law depends on integrated rate and variance only; what is left
    // is Euler bias at the curve nodes plus Monte Carlo noise
    assert!((g.price - c.price).abs() < 5.0 * se + 0.05);
}
