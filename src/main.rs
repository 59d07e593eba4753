use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rand::{SeedableRng, XorShiftRng};
use std::error::Error;
use std::process;
use usurping_treap::trials::{self, TrialConfig};

const LOCALITY_SIZE: u32 = 10;
const LOCALITY_HOT_KEYS: [u32; 2] = [1, 8];
const LOCALITY_ROUNDS: usize = 20;

fn make_options_parser() -> Command {
    Command::new("treap-trials")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds treaps from ascending keys and compares their depth with log2(N)")
        .arg(
            Arg::new("repetitions")
                .short('r')
                .long("repetitions")
                .value_name("COUNT")
                .help("Number of passes over all trial sizes [default: 20]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-size")
                .short('n')
                .long("max-size")
                .value_name("SIZE")
                .help("Exclusive bound on trial sizes, which double from 2 [default: 2000000]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("SEED")
                .help("Seed for priorities; drawn from the OS when absent")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("locality")
                .long("locality")
                .help("Run the hot-key promotion trial instead of the depth trials")
                .action(ArgAction::SetTrue),
        )
}

fn make_rng(seed: Option<u32>) -> XorShiftRng {
    match seed {
        Some(seed) => SeedableRng::from_seed([seed, 0x9e37_79b9, 0x243f_6a88, 0xb7e1_5162]),
        None => rand::weak_rng(),
    }
}

fn run_locality(rng: XorShiftRng, json: bool) -> Result<(), Box<dyn Error>> {
    let report = trials::locality_trial(LOCALITY_SIZE, &LOCALITY_HOT_KEYS, LOCALITY_ROUNDS, rng)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", report.before);
    println!("{}", report.after);
    for (key, (before, after)) in report
        .hot_keys
        .iter()
        .zip(report.depths_before.iter().zip(&report.depths_after))
    {
        println!("Key {}: depth {} -> {}", key, before, after);
    }
    Ok(())
}

fn run_depth(config: &TrialConfig, mut rng: XorShiftRng, json: bool) -> Result<(), Box<dyn Error>> {
    let summary = trials::run_depth_trials(config, &mut rng)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    for report in &summary.reports {
        println!("\nRunning {} times!", report.size);
        println!("In-order?: {}", report.valid_after_insert);
        println!("Max Depth: {}", report.max_depth_after_insert);
        println!("Log Factor: {:.6}", report.log_factor);
        println!("Post-deletions: In order? {}", report.valid_after_removal);
        println!("Max Depth: {}", report.max_depth_after_removal);
    }
    println!("\n\nAverage LogTime Factor: {:.6}", summary.average_log_factor);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let rng = make_rng(matches.get_one::<u32>("seed").copied());
    let json = matches.get_flag("json");
    if matches.get_flag("locality") {
        return run_locality(rng, json);
    }

    let defaults = TrialConfig::default();
    let config = TrialConfig {
        repetitions: matches
            .get_one::<usize>("repetitions")
            .copied()
            .unwrap_or(defaults.repetitions),
        max_size: matches
            .get_one::<u32>("max-size")
            .copied()
            .unwrap_or(defaults.max_size),
    };
    run_depth(&config, rng, json)
}

fn main() {
    env_logger::init();
    let matches = make_options_parser().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
