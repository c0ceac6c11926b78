use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    tn_installer::run()
}
