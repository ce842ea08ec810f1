//! intake-runner: headless runner for the ED intake simulation.
//!
//! Usage:
//!   intake-runner --seed 12345 --minutes 1440 --clinicians 5 --beds 10 --rate 5.0
//!   intake-runner --config scenario.json --json

use anyhow::Result;
use ed_intake_core::{SimConfig, SimEngine, SimSummary};
use std::env;

#[derive(serde::Serialize)]
struct RunReport<'a> {
    config:  &'a SimConfig,
    summary: &'a SimSummary,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_mode = args.iter().any(|a| a == "--json");

    let base = match args.windows(2).find(|w| w[0] == "--config") {
        Some(w) => SimConfig::load(&w[1])?,
        None => SimConfig::default(),
    };
    let config = SimConfig {
        seed:              parse_arg(&args, "--seed", base.seed),
        horizon_minutes:   parse_arg(&args, "--minutes", base.horizon_minutes),
        clinicians:        parse_arg(&args, "--clinicians", base.clinicians),
        beds:              parse_arg(&args, "--beds", base.beds),
        base_arrival_rate: parse_arg(&args, "--rate", base.base_arrival_rate),
        ..base
    };

    if !json_mode {
        println!("ED intake simulation, intake-runner");
        println!("  seed:        {}", config.seed);
        println!("  minutes:     {}", config.horizon_minutes);
        println!("  clinicians:  {}", config.clinicians);
        println!("  beds:        {}", config.beds);
        println!("  base rate:   {:.2}/h", config.base_arrival_rate);
        println!();
    }

    let mut engine = SimEngine::build(config.clone())?;
    let summary = engine.run()?;

    if json_mode {
        let report = RunReport { config: &config, summary: &summary };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&summary, engine.ticks());
    }
    Ok(())
}

fn print_summary(summary: &SimSummary, ticks: u64) {
    println!("=== RUN SUMMARY ===");
    println!("  total patients arrived:  {}", summary.total_patients);
    println!("  patients treated:        {}", summary.patients_treated);
    println!("  average wait (minutes):  {:.2}", summary.average_wait_time);
    println!("  max wait (minutes):      {}", summary.max_wait_time);
    println!("  clinician utilization:   {:.2}%", summary.clinician_utilization * 100.0);
    println!("  bed utilization:         {:.2}%", summary.bed_utilization * 100.0);
    println!("  final minute:            {}", summary.final_minute);
    println!("  ticks run:               {ticks}");
    if summary.clinician_utilization > 1.0 || summary.bed_utilization > 1.0 {
        log::warn!("utilization above 100%: the queue kept draining past the horizon");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
