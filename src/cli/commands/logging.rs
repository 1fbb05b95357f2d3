use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("BETLINK_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_command() -> Command {
        Command::new("betlink").arg(
            Arg::new("level")
                .long("level")
                .value_parser(validator_log_level()),
        )
    }

    #[test]
    fn named_levels_parse() {
        for (level, expected) in [
            ("error", 0u8),
            ("WARN", 1),
            ("info", 2),
            ("Debug", 3),
            ("trace", 4),
        ] {
            let matches = level_command().get_matches_from(vec!["betlink", "--level", level]);
            assert_eq!(matches.get_one::<u8>("level").copied(), Some(expected));
        }
    }

    #[test]
    fn numeric_levels_parse_up_to_five() {
        let matches = level_command().get_matches_from(vec!["betlink", "--level", "5"]);
        assert_eq!(matches.get_one::<u8>("level").copied(), Some(5));

        assert!(
            level_command()
                .try_get_matches_from(vec!["betlink", "--level", "6"])
                .is_err()
        );
        assert!(
            level_command()
                .try_get_matches_from(vec!["betlink", "--level", "loud"])
                .is_err()
        );
    }
}
