//! Command line interface definition

use clap::{Parser, Subcommand};
use pacsmith_types::{Arch, RepoKey};
use std::path::PathBuf;

/// pacsmith - Arch package repository host
#[derive(Parser)]
#[command(name = "pacsmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Host Arch Linux package repositories and request builds for upstream updates")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format (log lines become JSON too)
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository storage root (overrides config and environment)
    #[arg(long, global = true, value_name = "DIR")]
    pub storage: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Register a repository and create its empty databases
    Init {
        /// Repository as owner/name
        repo: RepoKey,

        /// Hosted architectures (default: storage.default_archs)
        #[arg(long = "arch", value_name = "ARCH")]
        archs: Vec<Arch>,

        /// Git repository with the package sources, as owner/name
        #[arg(long, value_name = "OWNER/NAME")]
        source: Option<RepoKey>,

        /// Branch holding the sources and packages.yml
        #[arg(long, default_value = "master")]
        source_branch: String,

        /// Branch build requests are committed to
        #[arg(long, default_value = "build")]
        build_branch: String,

        /// Mark the repository private
        #[arg(long)]
        private: bool,
    },

    /// Add package files to a repository
    Add {
        repo: RepoKey,

        /// Package files (*.pkg.tar.xz, *.pkg.tar.zst and their .sig)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Add even if the repository already holds the same or a newer version
        #[arg(long)]
        force: bool,
    },

    /// Remove packages from one architecture database
    #[command(alias = "rm")]
    Remove {
        repo: RepoKey,

        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List the packages of one architecture
    #[command(alias = "ls")]
    List {
        repo: RepoKey,

        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        /// Include file lists
        #[arg(long)]
        files: bool,
    },

    /// Show one package
    Show {
        repo: RepoKey,

        package: String,

        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        /// Include the file list
        #[arg(long)]
        files: bool,
    },

    /// Tell whether a version would be an update
    #[command(name = "is-new")]
    IsNew {
        repo: RepoKey,

        /// Package name, or a package filename when no version is given
        target: String,

        version: Option<String>,

        /// Architecture to compare against (`any` checks all)
        #[arg(long, default_value = "any")]
        arch: Arch,
    },

    /// List packages not needed by the given ones
    Obsolete {
        repo: RepoKey,

        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        /// Packages to keep, together with their dependencies
        keep: Vec<String>,
    },

    /// Delete a repository's files and unregister it
    Delete { repo: RepoKey },

    /// List registered repositories
    Repos,

    /// Run one update check over every due repository
    Check,

    /// Run the update checker until interrupted
    Run {
        /// Enable the checker even if the configuration disables it
        #[arg(long)]
        check: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["pacsmith", "add", "mikkel/repo", "zlib-1.2.8-5-x86_64.pkg.tar.xz"]);
        if let Commands::Add { repo, files, force } = cli.command {
            assert_eq!(repo, RepoKey::new("mikkel", "repo"));
            assert_eq!(files, vec![PathBuf::from("zlib-1.2.8-5-x86_64.pkg.tar.xz")]);
            assert!(!force);
        } else {
            panic!("Expected Add command");
        }

        let cli = Cli::parse_from(["pacsmith", "--json", "--debug", "repos"]);
        assert!(cli.global.json);
        assert!(cli.global.debug);
        assert!(matches!(cli.command, Commands::Repos));
    }

    #[test]
    fn test_init_arguments() {
        let cli = Cli::parse_from([
            "pacsmith", "init", "mikkel/repo", "--arch", "x86_64", "--arch", "i686", "--source",
            "mikkeloscar/pkgbuilds",
        ]);
        let Commands::Init {
            archs,
            source,
            source_branch,
            build_branch,
            ..
        } = cli.command
        else {
            panic!("Expected Init command");
        };
        assert_eq!(archs, vec![Arch::X86_64, Arch::I686]);
        assert_eq!(source, Some(RepoKey::new("mikkeloscar", "pkgbuilds")));
        assert_eq!(source_branch, "master");
        assert_eq!(build_branch, "build");
    }

    #[test]
    fn test_arch_defaults() {
        let cli = Cli::parse_from(["pacsmith", "is-new", "mikkel/repo", "zlib", "1.2.8-5"]);
        assert!(matches!(
            cli.command,
            Commands::IsNew { arch: Arch::Any, version: Some(_), .. }
        ));

        let cli = Cli::parse_from(["pacsmith", "ls", "mikkel/repo"]);
        assert!(matches!(cli.command, Commands::List { arch: Arch::X86_64, files: false, .. }));
    }

    #[test]
    fn test_rejects_bad_repository() {
        assert!(Cli::try_parse_from(["pacsmith", "list", "no-owner"]).is_err());
        assert!(Cli::try_parse_from(["pacsmith", "list", "mikkel/repo", "--arch", "sparc"]).is_err());
    }
}
