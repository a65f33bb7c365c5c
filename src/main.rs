#![warn(clippy::pedantic)]

use std::{env, ffi::OsString, process};

use console::style;
use human_panic::setup_panic;

use focus::{error::LaunchError, interpreter::Interpreter, launcher::Launcher};

fn run(args: &[OsString]) -> Result<i32, LaunchError> {
    let launcher = Launcher::resolve(Interpreter::from_env())?;
    launcher.run(args)
}

fn main() {
    setup_panic!();
    env_logger::init();

    let args: Vec<OsString> = env::args_os().skip(1).collect();
    log::debug!("Forwarding {} argument(s)", args.len());
    log::trace!("Arguments: {args:?}");

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", style(format!("Error: {err}")).for_stderr().red());
            err.exit_code()
        }
    };
    log::debug!("Exiting with code {code}");
    process::exit(code);
}
