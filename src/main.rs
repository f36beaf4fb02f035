use gfill::cli::Cli;
use gfill::error::exit_code_for;
use gfill::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.common.verbose);
    if let Err(err) = cli.execute() {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}
