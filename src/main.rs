use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use pddl_symbolic::Pddl;

/// Load a PDDL domain and problem, list the actions applicable in the
/// initial state and optionally validate a plan.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Domain file
    domain: PathBuf,
    /// Problem file
    problem: PathBuf,
    /// Print type check diagnostics and a dump of the loaded definitions
    #[arg(short, long)]
    verbose: bool,
    /// Plan to validate, one action call per value, e.g. --plan "pick-up(a)"
    #[arg(long, num_args = 1..)]
    plan: Vec<String>,
}

fn run(args: &Args) -> pddl_symbolic::Result<bool> {
    let pddl = Pddl::from_files(&args.domain, &args.problem)?;
    let mut stdout = std::io::stdout();
    let type_checked = pddl.is_valid(args.verbose, &mut stdout)?;
    if !type_checked {
        println!("Type check failed.");
    }
    if args.verbose {
        println!("{}", pddl);
    }
    println!("Valid actions in the initial state:");
    for call in pddl.list_valid_actions(pddl.initial_state())? {
        println!("\t{}", call);
    }
    if args.plan.is_empty() {
        return Ok(type_checked);
    }
    let valid = pddl.is_valid_plan(&args.plan)?;
    println!("Plan is {}.", if valid { "valid" } else { "invalid" });
    Ok(type_checked && valid)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        },
    }
}
