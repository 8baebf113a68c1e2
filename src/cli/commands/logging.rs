use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count they stand for.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accept a level name (any case) or its verbosity count.
/// `WORLDPASS_LOG_LEVEL` may hold either.
fn parse_level(level: &str) -> Result<u8, String> {
    let level = level.trim();

    let by_name = LEVEL_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(level));

    by_name
        .and_then(|index| u8::try_from(index).ok())
        .or_else(|| level.parse::<u8>().ok().filter(|count| *count <= 5))
        .ok_or_else(|| format!("invalid log level '{level}', expected one of {LEVEL_NAMES:?}"))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity, repeat to increase: -v WARN ... -vvvv TRACE")
            .env("WORLDPASS_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
