//! SSH key id miner CLI
//!
//! Usage:
//!   mineid cafe           # Find a key whose id starts with "cafe"
//!   mineid cafe 8         # ... using 8 worker threads
//!   mineid cafe -r 5      # ... reporting progress every 5 seconds

use std::io::Write;
use std::process;

use clap::Parser;
use console::style;

use ssh_vanity::crypto::openssh;
use ssh_vanity::stats::format_duration;
use ssh_vanity::{Config, Odds, ProgressSnapshot, SearchResult, WorkerPool};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let config = Config::parse();

    // Validate configuration
    let prefix = match config.validate() {
        Ok(prefix) => prefix,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let workers = config.worker_count();
    let expected = Odds::for_prefix_len(prefix.len()).expected_attempts();
    println!(
        "Starting {} threads. Expected number of tries for a prefix of this length: {}",
        workers,
        style(format_count(expected)).yellow()
    );

    let pool = match WorkerPool::new(workers, prefix) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    // Set up ctrl-c handler
    let stop_flag = pool.stop_flag_clone();
    if let Err(e) = ctrlc::set_handler(move || {
        stop_flag.store(true, std::sync::atomic::Ordering::Relaxed);
    }) {
        log::warn!("could not install Ctrl-C handler: {}", e);
    }

    let estimator = pool.estimator().with_smoothing(config.smoothing);
    let mut first_report = true;
    let outcome = pool.run(estimator, config.report_interval(), |snapshot| {
        print_progress(snapshot, &mut first_report);
    });

    match outcome {
        Ok(result) => {
            if let Err(e) = print_result(&result, expected) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\nerror: {}", e);
            process::exit(1);
        }
    }
}

fn print_progress(snapshot: &ProgressSnapshot, first_report: &mut bool) {
    let mut stdout = std::io::stdout().lock();
    if *first_report {
        let _ = writeln!(stdout, "\n");
        *first_report = false;
    }
    // Move up one line and clear it so the report overwrites itself.
    let _ = writeln!(
        stdout,
        "\x1b[A\x1b[2K\rCurrent speed: {:.1} keys/ms. 50% - 75% chance of being done in: {} - {}",
        snapshot.keys_per_second / 1000.0,
        style(snapshot.eta_50).yellow(),
        style(snapshot.eta_75).yellow()
    );
    let _ = stdout.flush();
}

fn print_result(result: &SearchResult, expected: f64) -> ssh_key::Result<()> {
    let pem = openssh::private_key_pem(&result.keypair)?;
    let public = openssh::authorized_key(&result.keypair)?;

    println!("\nFound key with id: {}", style(&result.fingerprint).yellow());
    println!("\n{}", style("Private key:").yellow());
    print!("{}", pem.as_str());
    println!("\n{}", style("Public key:").yellow());
    println!("{}", public);
    println!(
        "\nTook {} and approximately {} tries. Expected to take {} on average",
        style(format_duration(result.elapsed)).yellow(),
        style(format_count(result.attempts as f64)).yellow(),
        style(format_count(expected)).yellow()
    );
    Ok(())
}

/// Formats a count with thousands separators, e.g. `16,777,216`.
fn format_count(n: f64) -> String {
    if !n.is_finite() || n >= 1e21 {
        return format!("{:.3e}", n);
    }
    let digits = format!("{:.0}", n);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
