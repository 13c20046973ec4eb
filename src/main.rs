//! cts-harness CLI entry point

fn main() -> std::process::ExitCode {
    cts_harness::cli::main()
}
