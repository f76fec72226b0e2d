use std::process::ExitCode;

fn main() -> ExitCode {
    invoice_desk_lib::run()
}
