use argh::{EarlyExit, FromArgs};
use std::process;
use tinysh::{Config, Environment, Interpreter, Session, VERSION_MAJOR, VERSION_MINOR};

#[derive(FromArgs, Debug, PartialEq)]
/// A small interactive shell.
struct Args {
    #[argh(switch, short = 'v')]
    /// print the version and exit.
    version: bool,
}

/// Parse `args` (program name first), printing help or usage on early exit.
fn parse_args(args: &[String]) -> Result<Args, i32> {
    let cmd = args.first().map(String::as_str).unwrap_or("tinysh");
    let rest: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
    Args::from_args(&[cmd], &rest).map_err(|EarlyExit { output, status }| match status {
        Ok(()) => {
            println!("{}", output);
            0
        }
        Err(()) => {
            eprintln!("{}", output);
            eprintln!("Usage: {} [-v]", cmd);
            1
        }
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let argv: Vec<String> = std::env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(code) => process::exit(code),
    };
    if args.version {
        println!("Shell Version: {}.{}", VERSION_MAJOR, VERSION_MINOR);
        return Ok(());
    }

    let env = Environment::new();
    let config = Config::from_env(&env);
    let session = match Session::init(&config, &env) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("tinysh: {}", e);
            process::exit(1);
        }
    };

    Interpreter::new(session, env, config).repl()
}
