// tests/integration_test.rs
use chrono::NaiveDate;
use const_sde::analytics::{asian_geometric, bs_analytic};
use const_sde::market::{
    BlackConstantVol, BlackVarianceCurve, DayCounter, FlatForward, ForwardCurve, SimpleQuote,
};
use const_sde::mc::{EngineState, McConfig, McEngine, McEngineBuilder, Payoff};
use const_sde::process::{BlackScholesProcess, StochasticProcess};
use const_sde::rng::{PseudoRandomSequence, RandomSequenceGenerator, RngPolicy};
use const_sde::SdeError;
use std::sync::Arc;

const SPOT: f64 = 36.0;
const STRIKE: f64 = 40.0;
const RATE: f64 = 0.06;
const VOL: f64 = 0.20;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(1998, 5, 15)
}

fn maturity_date() -> NaiveDate {
    date(2001, 5, 17)
}

fn flat_process() -> Arc<BlackScholesProcess> {
    let dc = DayCounter::Actual365Fixed;
    Arc::new(BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(SPOT)),
        Arc::new(FlatForward::new(today(), 0.0, dc).unwrap()),
        Arc::new(FlatForward::new(today(), RATE, dc).unwrap()),
        Arc::new(BlackConstantVol::new(today(), VOL, dc)),
    ))
}

fn maturity() -> f64 {
    flat_process().time(maturity_date())
}

fn put_engine(process: Arc<BlackScholesProcess>) -> McEngineBuilder {
    McEngine::builder(process)
        .with_maturity_date(maturity_date())
        .with_payoff(Payoff::EuropeanPut { k: STRIKE })
        .with_seed(42)
}

fn analytic_put() -> f64 {
    bs_analytic::bs_put_price(SPOT, STRIKE, RATE, 0.0, VOL, maturity())
}

#[test]
fn test_constant_engine_vs_analytic() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_samples(200_000)
        .with_antithetic_variate(true)
        .with_constant_parameter_model(true)
        .build()
        .expect("Valid configuration");

    let result = engine.calculate().expect("Simulation runs");
    let analytic = analytic_put();
    let se = result.error_estimate.unwrap();
    let abs_error = (result.price - analytic).abs();

    println!("\nMC Price (constant model): {}", result.price);
    println!("Analytic Price: {}", analytic);
    println!("Standard error: {}", se);

    assert!(abs_error < 5.0 * se, "error {} exceeds 5 standard errors ({})", abs_error, se);
    assert!(abs_error / analytic < 0.01, "Relative error exceeds 1%: {}", abs_error / analytic);
    assert_eq!(result.state, EngineState::Converged);
    assert!(result.tolerance_met);
}

#[test]
fn test_seeded_single_step_matches_closed_form() {
    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_samples(1)
        .with_constant_parameter_model(true)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();

    let t = maturity();
    let dw = PseudoRandomSequence::new(1, 42).next_sequence()[0];
    let terminal = SPOT * (t * (RATE - 0.0 - 0.5 * VOL * VOL) + t.sqrt() * VOL * dw).exp();
    let expected = (-RATE * t).exp() * (STRIKE - terminal).max(0.0);

    println!("first draw: {}, terminal: {}, price: {}", dw, terminal, result.price);
    assert!((result.price - expected).abs() < 1e-10);
    assert_eq!(result.samples, 1);
    assert!(result.error_estimate.is_none());
}

#[test]
fn test_model_switch_on_single_segment_curves() {
    let dc = DayCounter::Actual365Fixed;
    let rates = ForwardCurve::new(
        vec![today(), date(2003, 5, 15)],
        vec![RATE, RATE],
        dc,
    )
    .unwrap();
    let vols = BlackVarianceCurve::new(today(), &[date(2003, 5, 15)], &[VOL], dc).unwrap();
    let process = Arc::new(BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(SPOT)),
        Arc::new(FlatForward::new(today(), 0.0, dc).unwrap()),
        Arc::new(rates),
        Arc::new(vols),
    ));

    let mut engine = put_engine(process)
        .with_steps_per_year(4)
        .with_samples(50_000)
        .build()
        .unwrap();
    let general = engine.calculate().unwrap();
    engine.set_constant_parameter_model(true).unwrap();
    let constant = engine.calculate().unwrap();

    println!("\nGeneral: {} ± {:?}", general.price, general.error_estimate);
    println!("Constant: {} ± {:?}", constant.price, constant.error_estimate);

    let se = general.error_estimate.unwrap().hypot(constant.error_estimate.unwrap());
    assert!(
        (general.price - constant.price).abs() < 3.0 * se,
        "models disagree: {} vs {}",
        general.price,
        constant.price
    );
    assert_eq!(engine.time_grid().steps(), 12);
}

#[test]
fn test_flat_models_share_random_stream() {
    // with flat inputs both variants compute the same coefficients, so the
    // same seed gives the same path-dependent price
    let mut engine = put_engine(flat_process())
        .with_payoff(Payoff::AsianCall { k: STRIKE })
        .with_steps(12)
        .with_samples(5_000)
        .with_brownian_bridge(true)
        .build()
        .unwrap();
    let general = engine.calculate().unwrap();
    engine.set_constant_parameter_model(true).unwrap();
    let constant = engine.calculate().unwrap();

    println!("\nAsian general: {}, constant: {}", general.price, constant.price);
    assert!((general.price - constant.price).abs() < 1e-9);
}

#[test]
fn test_antithetic_variance_reduction() {
    let build = |antithetic: bool| {
        put_engine(flat_process())
            .with_steps(1)
            .with_samples(20_000)
            .with_antithetic_variate(antithetic)
            .with_constant_parameter_model(true)
            .build()
            .unwrap()
    };
    let mut plain = build(false);
    let mut paired = build(true);
    let plain_result = plain.calculate().unwrap();
    let paired_result = paired.calculate().unwrap();

    // a pair spends two paths; two independent paths would only halve the variance
    let var_single = plain.statistics().variance().unwrap();
    let var_pair = paired.statistics().variance().unwrap();
    println!(
        "\nVariance per pair: {}, single-path variance / 2: {}",
        var_pair,
        var_single / 2.0
    );

    assert!(
        var_pair < var_single / 2.0,
        "antithetic pairs no better than independent pairs: {} >= {}",
        var_pair,
        var_single / 2.0
    );
    assert!(paired_result.error_estimate.unwrap() < plain_result.error_estimate.unwrap());
}

#[test]
fn test_tolerance_termination() {
    let tolerance = 0.02;
    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_absolute_tolerance(tolerance)
        .with_constant_parameter_model(true)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();

    println!("\nTolerance run: {} samples, error {:?}", result.samples, result.error_estimate);
    assert_eq!(result.state, EngineState::Converged);
    assert!(result.tolerance_met);
    assert!(result.error_estimate.unwrap() <= tolerance);
    assert!(result.samples >= 1023);
    assert!((result.price - analytic_put()).abs() < 5.0 * tolerance);
}

#[test]
fn test_tolerance_budget_exhausted() {
    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_absolute_tolerance(1e-6)
        .with_max_samples(5_000)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();

    assert_eq!(result.state, EngineState::ExhaustedBudget);
    assert!(!result.tolerance_met);
    assert_eq!(result.samples, 5_000);
    assert!(result.price > 0.0);
}

#[test]
fn test_low_discrepancy_engine() {
    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_samples(4_095)
        .with_rng(RngPolicy::LowDiscrepancy)
        .with_constant_parameter_model(true)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();
    let analytic = analytic_put();

    println!("\nSobol price: {}, analytic: {}", result.price, analytic);
    assert!(result.error_estimate.is_none());
    assert!((result.price - analytic).abs() / analytic < 0.01);
}

#[test]
fn test_brownian_bridge_with_sobol_multi_step() {
    // the bridge puts the terminal value on the first Sobol coordinate
    let mut engine = put_engine(flat_process())
        .with_steps(12)
        .with_samples(8_191)
        .with_rng(RngPolicy::LowDiscrepancy)
        .with_brownian_bridge(true)
        .with_constant_parameter_model(true)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();
    let analytic = analytic_put();

    println!("\nSobol + bridge price: {}, analytic: {}", result.price, analytic);
    assert!((result.price - analytic).abs() / analytic < 0.005);
}

#[test]
fn test_parallel_batches_are_deterministic() {
    let build = |batches: usize| {
        put_engine(flat_process())
            .with_steps(1)
            .with_samples(40_000)
            .with_batches(batches)
            .with_constant_parameter_model(true)
            .build()
            .unwrap()
    };
    let first = build(4).calculate().unwrap();
    let second = build(4).calculate().unwrap();
    // the batch count picks the seed streams, so it is part of the result
    let regrouped = build(3).calculate().unwrap();

    assert_eq!(first.price, second.price);
    assert_ne!(first.price, regrouped.price);
    assert_eq!(first.samples, 40_000);
    let se = first.error_estimate.unwrap();
    assert!((first.price - analytic_put()).abs() < 5.0 * se);
}

#[test]
fn test_configuration_errors() {
    let both_steps = put_engine(flat_process())
        .with_steps(1)
        .with_steps_per_year(12)
        .with_samples(10)
        .build();
    assert!(matches!(both_steps, Err(SdeError::InvalidConfiguration { .. })));

    let no_steps = put_engine(flat_process()).with_samples(10).build();
    assert!(matches!(no_steps, Err(SdeError::InvalidConfiguration { .. })));

    let both_rules = put_engine(flat_process())
        .with_steps(1)
        .with_samples(10)
        .with_absolute_tolerance(0.1)
        .build();
    assert!(matches!(both_rules, Err(SdeError::InvalidConfiguration { .. })));

    let sobol_tolerance = put_engine(flat_process())
        .with_steps(1)
        .with_absolute_tolerance(0.1)
        .with_rng(RngPolicy::LowDiscrepancy)
        .build();
    assert!(matches!(sobol_tolerance, Err(SdeError::InvalidConfiguration { .. })));
}

#[test]
fn test_degenerate_volatility_is_reported() {
    let dc = DayCounter::Actual365Fixed;
    let process = Arc::new(BlackScholesProcess::new(
        Arc::new(SimpleQuote::new(SPOT)),
        Arc::new(FlatForward::new(today(), 0.0, dc).unwrap()),
        Arc::new(FlatForward::new(today(), RATE, dc).unwrap()),
        Arc::new(BlackConstantVol::new(today(), 0.0, dc)),
    ));
    let result = put_engine(process)
        .with_steps(1)
        .with_samples(10)
        .with_constant_parameter_model(true)
        .build();
    assert!(matches!(result, Err(SdeError::NumericalDegeneracy { .. })));
}

#[test]
fn test_engine_from_toml_config() {
    let config = McConfig::from_toml_str(
        r#"
        steps_per_year = 1
        antithetic_variate = true
        required_samples = 20000
        seed = 42
        use_constant_parameter_model = true
        "#,
    )
    .unwrap();

    let mut engine = McEngineBuilder::from_config(flat_process(), config)
        .with_maturity_date(maturity_date())
        .with_payoff(Payoff::EuropeanPut { k: STRIKE })
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();

    assert_eq!(engine.time_grid().steps(), 3);
    assert!(engine.uses_constant_parameter_model());
    let se = result.error_estimate.unwrap();
    assert!((result.price - analytic_put()).abs() < 5.0 * se);
}

fn asian_engine(payoff: Payoff) -> McEngineBuilder {
    McEngine::builder(flat_process())
        .with_maturity_date(maturity_date())
        .with_payoff(payoff)
        .with_steps(12)
        .with_samples(20_000)
        .with_constant_parameter_model(true)
        .with_seed(42)
}

#[test]
fn test_geometric_asian_matches_closed_form() {
    let mut engine = asian_engine(Payoff::GeometricAsianCall { k: STRIKE })
        .with_samples(50_000)
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();
    let fixings = engine.time_grid().times()[1..].to_vec();
    let analytic = asian_geometric::discrete_geometric_average_price(
        true,
        SPOT,
        STRIKE,
        RATE,
        0.0,
        VOL,
        &fixings,
        maturity(),
    )
    .unwrap();
    let se = result.error_estimate.unwrap();

    println!("\nGeometric Asian MC: {}, closed form: {}, SE: {}", result.price, analytic, se);
    assert!((result.price - analytic).abs() < 5.0 * se);
}

#[test]
fn test_control_variate_reduces_asian_variance() {
    let mut plain = asian_engine(Payoff::AsianCall { k: STRIKE }).build().unwrap();
    let mut controlled = asian_engine(Payoff::AsianCall { k: STRIKE })
        .with_control_variate(true)
        .build()
        .unwrap();
    let plain_result = plain.calculate().unwrap();
    let controlled_result = controlled.calculate().unwrap();

    let var_plain = plain.statistics().variance().unwrap();
    let var_controlled = controlled.statistics().variance().unwrap();
    println!(
        "\nAsian plain: {} (var {}), controlled: {} (var {})",
        plain_result.price, var_plain, controlled_result.price, var_controlled
    );

    assert!(plain.control_value().is_none());
    assert!(controlled.control_value().unwrap() > 0.0);
    assert!(
        var_controlled < var_plain / 10.0,
        "control variate barely helps: {} vs {}",
        var_controlled,
        var_plain
    );
    let se = plain_result.error_estimate.unwrap();
    assert!((controlled_result.price - plain_result.price).abs() < 4.0 * se);
}

#[test]
fn test_control_variate_needs_a_control() {
    let result = put_engine(flat_process())
        .with_steps(1)
        .with_samples(100)
        .with_control_variate(true)
        .build();
    assert!(matches!(result, Err(SdeError::InvalidConfiguration { ref field, .. }) if field == "control_variate"));
}

#[test]
fn test_custom_control_pricer_is_applied() {
    use const_sde::mc::DiscountedPayoffPricer;

    // the payoff as its own control leaves exactly its known value
    let discount = (-RATE * maturity()).exp();
    let control = Arc::new(DiscountedPayoffPricer::new(Payoff::EuropeanPut { k: STRIKE }, discount));
    let mut engine = put_engine(flat_process())
        .with_steps(1)
        .with_samples(1_000)
        .with_control_pricer(control, analytic_put())
        .build()
        .unwrap();
    let result = engine.calculate().unwrap();

    assert!((result.price - analytic_put()).abs() < 1e-9);
    assert!(result.error_estimate.unwrap() < 1e-9);
}
