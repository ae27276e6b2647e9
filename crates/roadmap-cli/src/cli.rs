use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Data file used when neither `--data` nor the config names one
pub(crate) const DEFAULT_DATA_FILE: &str = "roadmaps.json";

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .help("Roadmap id or sanitized name")
}

fn items_arg() -> Arg {
    Arg::new("items")
        .long("items")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file with the learning items to group")
}

pub(crate) fn build() -> Command {
    Command::new("roadmap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan, store and back up study roadmaps")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON data file (default: roadmaps.json)"),
        )
        .subcommand(
            Command::new("phases")
                .about("Group an item list into phases and print them")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with learning items"),
                )
                .arg(
                    Arg::new("max-items")
                        .long("max-items")
                        .value_parser(value_parser!(usize))
                        .help("Items per phase before splitting"),
                )
                .arg(
                    Arg::new("preferred")
                        .long("preferred")
                        .value_parser(value_parser!(i64))
                        .help("Difficulty treated as core"),
                )
                .arg(
                    Arg::new("time-constraint")
                        .long("time-constraint")
                        .value_parser(value_parser!(f64))
                        .help("Duration cap per phase"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Create a roadmap and generate its phases")
                .arg(Arg::new("title").long("title").required(true))
                .arg(Arg::new("objective").long("objective").required(true))
                .arg(Arg::new("goal").long("goal").required(true).help("Final goal"))
                .arg(
                    Arg::new("constraint")
                        .long("constraint")
                        .action(ArgAction::Append)
                        .help("Extra constraint, repeatable"),
                )
                .arg(items_arg()),
        )
        .subcommand(
            Command::new("resume")
                .about("Continue generation of a queued or paused roadmap")
                .arg(id_arg())
                .arg(items_arg()),
        )
        .subcommand(
            Command::new("pause")
                .about("Mark a roadmap paused")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List stored roadmaps, favorites first")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print one roadmap as JSON")
                .arg(id_arg()),
        )
        .subcommand(Command::new("stats").about("Print collection statistics"))
        .subcommand(
            Command::new("export")
                .about("Export the collection as a backup snapshot")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the collection with a backup snapshot")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Confirm replacing the stored roadmaps"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a roadmap")
                .arg(id_arg()),
        )
        .subcommand(Command::new("reset").about("Delete all roadmaps and forget the user id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        build().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = build()
            .try_get_matches_from(["roadmap", "list", "--data", "x.json", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("data"),
            Some(&PathBuf::from("x.json"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "list");
        assert!(args.get_flag("json"));
    }

    #[test]
    fn plan_requires_items() {
        let result = build().try_get_matches_from([
            "roadmap", "plan", "--title", "t", "--objective", "o", "--goal", "g",
        ]);
        assert!(result.is_err());
    }
}
