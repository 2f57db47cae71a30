use contagion::runner::run_with_args;

fn main() {
    if let Err(error) = run_with_args() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
