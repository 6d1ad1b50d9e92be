
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> super::CliCommand {
    super::Cli::parse_from(args).command
}
