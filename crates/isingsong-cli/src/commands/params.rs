//! `isingsong params` — show what a seed draws, without integrating.

use std::f64::consts::TAU;

use isingsong_core::{CouplingMatrix, Parameters, Simulation};

use super::{SimArgs, fail};

pub fn run(args: &SimArgs, json: bool) {
    let config = args
        .resolve()
        .unwrap_or_else(|e| fail("invalid configuration", e));
    let sim = Simulation::new(config).unwrap_or_else(|e| fail("setup failed", e));
    let params = sim.parameters();

    if json {
        match serde_json::to_string_pretty(params) {
            Ok(s) => println!("{s}"),
            Err(e) => fail("serializing parameters", e),
        }
        return;
    }
    print_table(params);
}

fn print_table(params: &Parameters) {
    let ens = &params.ensemble;
    println!(
        "  {:>4} {:>10} {:>10} {:>8}",
        "#", "f0 (Hz)", "f1 (Hz)", "θ0"
    );
    println!("  {}", "-".repeat(36));
    for i in 0..ens.len() {
        println!(
            "  {:>4} {:>10.2} {:>10.2} {:>8.4}",
            i,
            ens.omega_start[i] / TAU,
            ens.omega_end[i] / TAU,
            ens.phases[i]
        );
    }
    println!("\nCoupling matrix K:");
    print_matrix(&params.coupling);
}

fn print_matrix(k: &CouplingMatrix) {
    for i in 0..k.n() {
        let row: Vec<String> = k.row(i).iter().map(|v| format!("{v:>6.2}")).collect();
        println!("  {}", row.join(" "));
    }
}
