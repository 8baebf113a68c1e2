pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_REST_COUNTRIES_URL: &str = "rest-countries-url";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("worldpass")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("WORLDPASS_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("WORLDPASS_DSN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long("secret-key")
                .help("Key used to sign and verify bearer tokens")
                .env("WORLDPASS_SECRET_KEY")
                .hide_env_values(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .required(true),
        )
        .arg(
            Arg::new(ARG_REST_COUNTRIES_URL)
                .long("rest-countries-url")
                .help("Base URL of the REST Countries API")
                .default_value(crate::country::DEFAULT_REST_COUNTRIES_URL)
                .env("WORLDPASS_REST_COUNTRIES_URL"),
        );

    logging::with_args(command)
}
