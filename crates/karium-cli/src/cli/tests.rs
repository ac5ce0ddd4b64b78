#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn build_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["karium", "build"]).unwrap();
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.root(), PathBuf::from("."));
                assert!(!args.stub);
                assert!(!args.no_clean);
                assert!(!args.no_fail_on_warn);
            }
            _ => panic!("Expected build command"),
        }
    }

    #[test]
    fn build_flags() {
        let cli = Cli::try_parse_from([
            "karium",
            "build",
            "packages/ui",
            "--stub",
            "--no-clean",
            "--no-fail-on-warn",
        ])
        .unwrap();
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.root(), PathBuf::from("packages/ui"));
                assert!(args.stub);
                assert!(args.no_clean);
                assert!(args.no_fail_on_warn);
            }
            _ => panic!("Expected build command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["karium", "check", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Check(_)));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["karium", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["karium"]).is_err());
    }
}
