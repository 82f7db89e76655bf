//! Capbank - Capacitor Bank Unbalance Calculator
//!
//! Computes neutral current and neutral voltage for shunt capacitor bank
//! arrangements per IEEE Std C37.99.
//!
//! # Usage
//!
//! ```bash
//! capbank double_star_internal_fuses -p S=4 -p Pt=11 -p Pa=6 -p P=3 -p N=14 -p Su=3 --sweep
//! capbank double_star_external_fuses -p S=4 -p Pt=14 -p Pa=8 -p F=1 --line-voltage 13800 --power 5.4e6
//! ```

use clap::Parser;

use capbank_core::{
    bank::param, compute, sweep, validate, BankRatings, NeutralQuantities, ParameterSet, Result,
    Topology, DEFAULT_FREQUENCY_HZ,
};

/// Capacitor bank unbalance calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Topology key (double_star_internal_fuses, double_star_external_fuses,
    /// h_bridge_internal_fuses, single_star_internal_fuses)
    #[arg(value_name = "TOPOLOGY")]
    topology: String,

    /// Bank parameter as NAME=VALUE (repeatable), e.g. -p Pa=6
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Sweep the full failed-element range instead of a single point
    #[arg(long)]
    sweep: bool,

    /// Emit JSON instead of a plain table
    #[arg(long)]
    json: bool,

    /// Line-to-line voltage in volts, for SI conversion
    #[arg(long, value_name = "VOLTS")]
    line_voltage: Option<f64>,

    /// Three-phase reactive power in VAr, for SI conversion
    #[arg(long, value_name = "VAR")]
    power: Option<f64>,

    /// System frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_HZ)]
    frequency: f64,
}

fn parse_param(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number (in '{s}')"))?;
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let topology = Topology::from_key(&args.topology)?;
    let params: ParameterSet = args.params.iter().cloned().collect();

    // Validation gates computation; diagnostics go to the user, not up the stack
    let verdict = validate(topology, &params);
    for warning in &verdict.warnings {
        eprintln!("warning: {warning}");
    }
    if !verdict.is_valid() {
        for error in &verdict.errors {
            eprintln!("error: {error}");
        }
        eprintln!("{}: parameter set rejected, nothing computed", topology.key());
        std::process::exit(1);
    }

    let ratings = match (args.line_voltage, args.power) {
        (Some(line_voltage), Some(power)) => Some(BankRatings {
            line_voltage,
            reactive_power: power,
            frequency: args.frequency,
        }),
        (None, None) => None,
        _ => {
            eprintln!("error: --line-voltage and --power must be given together");
            std::process::exit(1);
        }
    };
    let base = match ratings {
        Some(r) => {
            let s = params.get_or(param::S, 1.0) as u32;
            let pt = params.get_or(param::PT, 1.0) as u32;
            Some(r.base_quantities(s, pt)?)
        }
        None => None,
    };

    let rows: Vec<(u32, NeutralQuantities)> = if args.sweep {
        sweep(topology, &params)?
            .into_iter()
            .map(|point| (point.failed, point.quantities))
            .collect()
    } else {
        let failed = params.get_or(param::F, 0.0) as u32;
        vec![(failed, compute(topology, &params)?)]
    };

    if args.json {
        let rows_json: Vec<serde_json::Value> = rows
            .iter()
            .map(|(failed, q)| {
                let mut row = serde_json::json!({ "failed": failed, "per_unit": q });
                if let Some(base) = &base {
                    row["si"] = serde_json::to_value(q.to_si(base)).unwrap_or_default();
                }
                row
            })
            .collect();
        let out = serde_json::json!({
            "topology": topology.key(),
            "label": topology.label(),
            "warnings": verdict.warnings,
            "rows": rows_json,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        println!("{}", topology.label());
        println!("{:>4}  {:>12}  {:>12}  {:>12}  {:>12}", "F", "In [pu]", "Vn [pu]", "Vcu [pu]", "Iu [pu]");
        for (failed, q) in &rows {
            println!(
                "{failed:>4}  {:>12.6}  {:>12.6}  {:>12.6}  {:>12.6}",
                q.neutral_current, q.neutral_voltage, q.unit_voltage, q.unit_current
            );
        }
        if let Some(base) = &base {
            println!();
            println!("{:>4}  {:>12}  {:>12}  {:>12}  {:>12}", "F", "In [A]", "Vn [V]", "Vcu [V]", "Iu [A]");
            for (failed, q) in &rows {
                let si = q.to_si(base);
                println!(
                    "{failed:>4}  {:>12.3}  {:>12.3}  {:>12.3}  {:>12.3}",
                    si.neutral_current, si.neutral_voltage, si.unit_voltage, si.unit_current
                );
            }
        }
    }

    Ok(())
}
