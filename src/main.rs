//! Purpose: `jsonecho` CLI entry point.
//! Role: Binary crate root; parses args, builds `ServeConfig`, runs the server.
//! Invariants: With no flags the server binds 0.0.0.0:5000 in permissive mode.
//! Invariants: Errors are emitted on stderr (text on a TTY, JSON otherwise).
//! Invariants: Process exit code is derived from `error::to_exit_code`.
use std::io::{self, IsTerminal};
use std::net::SocketAddr;

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;

use jsonecho::error::{Error, ErrorKind, to_exit_code};
use jsonecho::serve::{self, DEFAULT_BIND, DEFAULT_MAX_BODY_BYTES, ServeConfig};

#[derive(Parser, Debug)]
#[command(
    name = "jsonecho",
    version,
    about = "Echo posted JSON back inside a {\"status\":\"ok\",\"received\":...} envelope",
    long_about = None,
    after_help = r#"EXAMPLES
  $ jsonecho
  $ curl -s -X POST localhost:5000/ -d '{"led": true}'
  {"status":"ok","received":{"led":true}}
  $ jsonecho --bind 127.0.0.1:8080 --strict-json"#
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_BIND, help = "Bind address")]
    bind: String,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BODY_BYTES,
        help = "Max request body size in bytes"
    )]
    max_body_bytes: u64,
    #[arg(
        long,
        help = "Reject bodies that are not valid JSON with 400 instead of echoing null"
    )]
    strict_json: bool,
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(0);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `jsonecho --help` for usage."));
            }
        },
    };

    serve_from_cli(cli)?;
    Ok(0)
}

fn serve_from_cli(cli: Cli) -> Result<(), Error> {
    let config = serve_config_from_cli(&cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })?;
    runtime.block_on(serve::serve(config))
}

fn serve_config_from_cli(cli: &Cli) -> Result<ServeConfig, Error> {
    let bind: SocketAddr = cli.bind.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid bind address")
            .with_hint("Use a host:port value like 0.0.0.0:5000.")
    })?;
    Ok(ServeConfig {
        bind,
        max_body_bytes: cli.max_body_bytes,
        strict_json: cli.strict_json,
    })
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error: ").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Cli, error_json, error_text, serve_config_from_cli};
    use clap::Parser;
    use jsonecho::error::{Error, ErrorKind};

    #[test]
    fn no_flags_reproduce_fixed_defaults() {
        let cli = Cli::try_parse_from(["jsonecho"]).expect("parse");
        let config = serve_config_from_cli(&cli).expect("config");
        assert_eq!(config.bind.to_string(), "0.0.0.0:5000");
        assert!(!config.strict_json);
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn invalid_bind_is_usage_error() {
        let cli = Cli::try_parse_from(["jsonecho", "--bind", "not-an-addr"]).expect("parse");
        let err = serve_config_from_cli(&cli).expect_err("bad bind");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn error_text_lists_hint_and_causes() {
        let err = Error::new(ErrorKind::Io)
            .with_message("failed to bind server")
            .with_hint("pick another port")
            .with_source(std::io::Error::other("address in use"));
        assert_eq!(
            error_text(&err),
            "error: failed to bind server\nhint: pick another port\ncaused by: address in use"
        );
    }

    #[test]
    fn error_json_lists_causes() {
        let err = Error::new(ErrorKind::Io)
            .with_message("failed to bind server")
            .with_source(std::io::Error::other("address in use"));
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Io");
        assert_eq!(value["error"]["message"], "failed to bind server");
        assert_eq!(value["error"]["causes"][0], "address in use");
    }
}
