use std::process::ExitCode;

fn main() -> ExitCode {
    yamlconf_cli::run()
}
