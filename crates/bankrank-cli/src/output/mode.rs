use crate::cli::Commands;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    match command {
        Commands::Run { json, .. } | Commands::Sql { json, .. } => {
            if *json {
                OutputMode::Json
            } else {
                OutputMode::Text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn json_flag_selects_json_mode() {
        let run = parse_from(["bankrank", "run", "--json"]);
        assert!(run.is_ok());
        if let Ok(cli) = run {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
        }

        let sql = parse_from(["bankrank", "sql", "SELECT 1", "--json"]);
        assert!(sql.is_ok());
        if let Ok(cli) = sql {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
        }
    }

    #[test]
    fn default_mode_is_text() {
        let run = parse_from(["bankrank", "run"]);
        assert!(run.is_ok());
        if let Ok(cli) = run {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Text);
        }
    }
}
