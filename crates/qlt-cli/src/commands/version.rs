//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - lottery tickets in variational quantum circuits",
        style("qlt").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qlt-ir        Parameterized circuit representation");
    println!("  qlt-sim       Statevector simulation and Pauli observables");
    println!("  qlt-models    Hamiltonians, ansätze and target distributions");
    println!("  qlt-prune     Parameter pruning");
    println!("  qlt-optimize  Classical optimizers");
    println!("  qlt-cost      Cost functions and run tracking");
    println!("  qlt-cli       Command-line interface");
}
