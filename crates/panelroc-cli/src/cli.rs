use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to JSON run configuration file. Defaults are used when omitted.")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn train_data_arg() -> Arg {
    Arg::new("train_data")
        .short('d')
        .long("train_data")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help(
            "Path to the training table (*.csv or *.tsv, label in the last column). \
             Overrides the training data file specified in the configuration file.",
        )
        .value_hint(ValueHint::FilePath)
}

fn output_dir_arg() -> Arg {
    Arg::new("output_dir")
        .short('o')
        .long("output_dir")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help("Directory for results, report and configuration. Overrides the configuration file.")
        .value_hint(ValueHint::DirPath)
}

fn panel_size_arg() -> Arg {
    Arg::new("panel_size")
        .short('k')
        .long("panel_size")
        .value_parser(clap::value_parser!(usize))
        .help("Number of features per panel. Overrides the configuration file.")
}

fn seed_arg() -> Arg {
    Arg::new("seed")
        .long("seed")
        .value_parser(clap::value_parser!(u64))
        .help("Base random seed. A fresh seed is drawn when neither flag nor config sets one.")
}

fn methods_arg() -> Arg {
    Arg::new("methods")
        .long("methods")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help("Comma separated classifier catalog, e.g. 'lr,lsvc,rbfsvc,nb,dt,rf,et'")
}

fn no_report_arg() -> Arg {
    Arg::new("no_report")
        .long("no_report")
        .action(ArgAction::SetTrue)
        .help("Do not write the HTML report")
}

fn report_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("grid_size")
            .long("grid_size")
            .value_parser(clap::value_parser!(usize))
            .help("Bins per axis of the ROC confidence surfaces"),
    )
    .arg(
        Arg::new("confidence")
            .long("confidence")
            .value_parser(clap::value_parser!(f64))
            .help("Confidence level of the ROC regions, e.g. 0.95"),
    )
    .arg(
        Arg::new("hull_mode")
            .long("hull_mode")
            .value_parser(["per_point", "band"])
            .help("Draw one hull per ROC point or a connected confidence band"),
    )
    .arg(
        Arg::new("no_title")
            .long("no_title")
            .action(ArgAction::SetTrue)
            .help("Leave plot titles empty"),
    )
}

/// The `panelroc` command tree.
pub fn build_cli() -> Command {
    Command::new("panelroc")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("\u{1F9EC} panelroc - Biomarker panel discovery with nested leave-one-out and ROC confidence regions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(report_args(
            Command::new("cv")
                .about("Leave-one-out cross-validation of panel and model selection")
                .arg(config_arg())
                .arg(train_data_arg())
                .arg(output_dir_arg())
                .arg(panel_size_arg())
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_parser(clap::value_parser!(usize))
                        .help("Worker threads for the outer folds"),
                )
                .arg(seed_arg())
                .arg(methods_arg())
                .arg(no_report_arg()),
        ))
        .subcommand(report_args(
            Command::new("validate")
                .about("Select a panel and model on training data and score a validation set")
                .arg(config_arg())
                .arg(train_data_arg())
                .arg(
                    Arg::new("validation_data")
                        .short('v')
                        .long("validation_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the validation table. Overrides the validation data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(output_dir_arg())
                .arg(panel_size_arg())
                .arg(seed_arg())
                .arg(methods_arg())
                .arg(no_report_arg()),
        ))
        .subcommand(report_args(
            Command::new("report")
                .about("Render an HTML report from saved fold results")
                .arg(
                    Arg::new("results")
                        .help("Path to a results JSON file written by 'cv' or 'validate'")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("HTML file to write. Defaults to the results path with .html")
                        .value_hint(ValueHint::FilePath),
                ),
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
}
