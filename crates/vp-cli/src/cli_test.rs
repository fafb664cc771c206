use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "vp",
        "status",
        "--json",
        "--project-dir",
        "clinic",
        "--database",
        "practice.duckdb",
        "-v",
    ])
    .unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, "clinic");
    assert_eq!(cli.global.database.as_deref(), Some("practice.duckdb"));
    assert!(matches!(cli.command, Commands::Status(StatusArgs { json: true })));
}

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["vp", "migrate"]).unwrap();
    assert_eq!(cli.global.project_dir, ".");
    assert_eq!(cli.global.config, None);
    assert!(!cli.global.verbose);
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn test_subcommand_required() {
    assert!(Cli::try_parse_from(["vp"]).is_err());
}
