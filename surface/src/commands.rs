use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("surface")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("surface")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Recursively crawl a target origin, classifying every discovered link and \
                mining its JavaScript for endpoints.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The target origin URL to crawl (scheme optional, http assumed)"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"verify-tls")
                        .required(false)
                        .help(
                            "Verify TLS certificates (default: off, scan targets often use \
                        self-signed certs)",
                        )
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-k --"shodan-key" <KEY>)
                        .required(false)
                        .help("Shodan API key for the post-crawl host lookup (omit to skip)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("extract")
                .about(
                    "Extract endpoint strings from a single JavaScript source, given as a URL \
                or a local file path.",
                )
                .arg(
                    arg!(-i --"input" <INPUT>)
                        .required(true)
                        .help("A JS source URL or local file path"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to save the results, one endpoint per line (default: stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
}
