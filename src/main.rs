use std::path::PathBuf;

use anyhow::{bail, Context as _};
use checker::data::Report;
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use context::Context;
use log::info;

mod checker;
mod collect;
mod config;
mod context;
mod export;
mod listing;
mod outline;
mod post;
mod report;

fn cli() -> Command {
    command!()
        .args([
            Arg::new("article_dir")
                .long("article-dir")
                .help("Directory path of articles")
                .env("POSTLINT_ARTICLE_DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("posts"),
            Arg::new("config")
                .long("config")
                .help("Configuration file. Defaults are used when it does not exist.")
                .value_parser(value_parser!(PathBuf))
                .default_value("postlint.json"),
        ])
        .subcommand_required(true)
        .subcommand(
            Command::new("check")
                .about("Validate front matter and Markdown structure of posts")
                .args([
                    Arg::new("paths")
                        .help("Files or directories to check instead of article_dir")
                        .num_args(0..)
                        .value_parser(value_parser!(PathBuf)),
                    Arg::new("report")
                        .long("report")
                        .help("Write the full report as JSON to this path")
                        .value_parser(value_parser!(PathBuf)),
                    Arg::new("deny_warnings")
                        .long("deny-warnings")
                        .help("Fail when any warning is reported")
                        .action(ArgAction::SetTrue),
                ]),
        )
        .subcommand(
            Command::new("list")
                .about("List posts, newest first")
                .arg(
                    Arg::new("by_category")
                        .long("by-category")
                        .help("Group posts by category")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print a parsed post as JSON")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn require_article_dir(s: &Context) -> anyhow::Result<()> {
    if !s.article_dir.exists() || !s.article_dir.is_dir() {
        bail!("article_dir({:?}) must be a directory.", s.article_dir);
    }
    Ok(())
}

fn run_check(matches: &ArgMatches) -> anyhow::Result<()> {
    let s = Context::instance();

    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("paths")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    let files = if paths.is_empty() {
        require_article_dir(s)?;
        collect::find_posts(&s.article_dir, &s.config.extensions)?
    } else {
        collect::expand_paths(&paths, &s.config.extensions)?
    };

    let today = chrono::Local::now().date_naive();
    let report = checker::check_files(&files, &s.config, today);
    println!("{}", report::render_report(&report));

    if let Some(report_path) = matches.get_one::<PathBuf>("report") {
        report::save_report(report_path, &report)
            .with_context(|| format!("while writing {report_path:?}"))?;
        info!("report written to {report_path:?}");
    }

    check_outcome(&report, matches.get_flag("deny_warnings"))
}

/// Errors always fail the run; warnings only under `--deny-warnings`.
fn check_outcome(report: &Report, deny_warnings: bool) -> anyhow::Result<()> {
    if report.errors > 0 {
        bail!("{} errors found.", report.errors);
    }
    if deny_warnings && report.warnings > 0 {
        bail!("{} warnings found.", report.warnings);
    }
    Ok(())
}

fn run_list(matches: &ArgMatches) -> anyhow::Result<()> {
    let s = Context::instance();
    require_article_dir(s)?;

    let files = collect::find_posts(&s.article_dir, &s.config.extensions)?;
    let posts = listing::load_metas(&files);
    print!(
        "{}",
        listing::render_list(&posts, &s.article_dir, matches.get_flag("by_category"))
    );
    Ok(())
}

fn run_show(matches: &ArgMatches) -> anyhow::Result<()> {
    let Some(file) = matches.get_one::<PathBuf>("file") else {
        bail!("no file given.");
    };
    let post = collect::load_post(file).with_context(|| format!("while loading {file:?}"))?;
    println!("{}", export::PostExport::from_post(&post)?.to_json()?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();

    let Some(article_dir) = matches.get_one::<PathBuf>("article_dir") else {
        bail!("article_dir is required.");
    };
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        bail!("config is required.");
    };
    let config = config::load_config(config_path)?;
    Context::init(article_dir.to_owned(), config)?;

    match matches.subcommand() {
        Some(("check", sub)) => run_check(sub),
        Some(("list", sub)) => run_list(sub),
        Some(("show", sub)) => run_show(sub),
        _ => unreachable!("subcommand is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_check_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "postlint",
                "--article-dir",
                "blog",
                "check",
                "a.md",
                "drafts",
                "--report",
                "out.json",
                "--deny-warnings",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("article_dir"),
            Some(&PathBuf::from("blog"))
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "check");
        let paths: Vec<_> = sub.get_many::<PathBuf>("paths").unwrap().cloned().collect();
        assert_eq!(paths, vec![PathBuf::from("a.md"), PathBuf::from("drafts")]);
        assert!(sub.get_flag("deny_warnings"));
    }

    fn report(errors: usize, warnings: usize) -> Report {
        Report {
            files: vec![],
            errors,
            warnings,
        }
    }

    #[test]
    fn errors_always_fail_the_check() {
        assert!(check_outcome(&report(0, 0), false).is_ok());
        assert!(check_outcome(&report(0, 0), true).is_ok());

        let err = check_outcome(&report(2, 0), false).unwrap_err();
        assert_eq!(err.to_string(), "2 errors found.");
        assert!(check_outcome(&report(1, 3), true).is_err());
    }

    #[test]
    fn warnings_fail_only_when_denied() {
        assert!(check_outcome(&report(0, 3), false).is_ok());

        let err = check_outcome(&report(0, 3), true).unwrap_err();
        assert_eq!(err.to_string(), "3 warnings found.");
    }

    #[test]
    fn subcommand_is_required() {
        assert!(cli().try_get_matches_from(["postlint"]).is_err());
    }
}
