use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use domos_feasibility::{
    ai::{AiService, ImagePayload},
    app, config,
    feasibility::{parse_amount, ProjectInputs},
    format::currency,
    i18n::{self, Translator},
    logging,
    project::ProjectStore,
    ui_cli,
};

/// Feasibility calculator for Greek residential plot development
#[derive(Debug, Parser)]
#[command(name = "domos_cli", version, about)]
struct Cli {
    /// Display language (auto/en/el)
    #[arg(long, short = 'L', global = true, default_value = "auto")]
    lang: String,
    /// Path to the config file
    #[arg(long, global = true, env = "DOMOS_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print the feasibility figures for the given inputs
    Calc {
        #[command(flatten)]
        inputs: InputArgs,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Save the inputs as a named project
    Save {
        name: String,
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// List saved projects with their ids, newest first
    List,
    /// Compare saved projects by investment, revenue, profit and margin
    Compare,
    /// Delete a saved project
    Delete { id: String },
    /// Show the figures of a saved project
    Show { id: String },
    /// Estimate the plot price with the AI service
    Estimate {
        location: String,
        #[arg(long, value_parser = amount, allow_negative_numbers = true)]
        plot_size: f64,
    },
    /// Write a short AI feasibility analysis
    Analyze {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Edit a photo of the plot with the AI service
    Visualize {
        image: PathBuf,
        #[arg(long, default_value = domos_feasibility::ai::prompt::DEFAULT_DESIGN_PROMPT)]
        prompt: String,
        #[arg(long)]
        out: PathBuf,
    },
}

// 설정의 기본 입력값 위에 덮어쓸 값들.
#[derive(Debug, Args)]
struct InputArgs {
    #[arg(long)]
    location: Option<String>,
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    plot_size: Option<f64>,
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    plot_price: Option<f64>,
    /// Building coefficient (Σ.Δ.)
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    coefficient: Option<f64>,
    /// Construction cost [€/m²]
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    construction_cost: Option<f64>,
    /// Sale price [€/m²]
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    sale_price: Option<f64>,
    #[arg(long, value_parser = amount, allow_negative_numbers = true)]
    misc_percent: Option<f64>,
    #[arg(long)]
    notes: Option<String>,
}

impl InputArgs {
    fn apply(self, base: &ProjectInputs) -> ProjectInputs {
        let mut inputs = base.clone();
        if let Some(v) = self.location {
            inputs.location = v;
        }
        if let Some(v) = self.plot_size {
            inputs.plot_size = v;
        }
        if let Some(v) = self.plot_price {
            inputs.plot_price = v;
        }
        if let Some(v) = self.coefficient {
            inputs.building_coefficient = v;
        }
        if let Some(v) = self.construction_cost {
            inputs.construction_cost_per_sqm = v;
        }
        if let Some(v) = self.sale_price {
            inputs.sale_price_per_sqm = v;
        }
        if let Some(v) = self.misc_percent {
            inputs.misc_costs_percent = v;
        }
        if self.notes.is_some() {
            inputs.owner_notes = self.notes;
        }
        inputs
    }
}

fn amount(s: &str) -> Result<f64, String> {
    Ok(parse_amount(s))
}

/// 프로그램의 엔트리 포인트. 설정을 로드한 뒤 명령 또는 대화형 메뉴를 실행한다.
fn main() {
    logging::init("warn");
    if let Err(err) = try_run() {
        tracing::error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let code = i18n::resolve_language(&cli.lang, Some(cfg.language.as_str()));
    let mut tr = Translator::new(&code);

    let Some(cmd) = cli.command else {
        app::run(&mut cfg, &cli.config, &mut tr)?;
        return Ok(());
    };

    match cmd {
        Cmd::Calc { inputs, json } => {
            let inputs = inputs.apply(&cfg.defaults);
            app::print_calculation(&tr, &inputs, json)?;
        }
        Cmd::Save { name, inputs } => {
            if name.trim().is_empty() {
                bail!("project name must not be empty");
            }
            let inputs = inputs.apply(&cfg.defaults);
            let mut store = app::open_store(&cfg);
            let saved = store.create(&name, &inputs)?;
            println!("{} ({})", tr.t("project.saved"), saved.id);
        }
        Cmd::List => {
            let store = app::open_store(&cfg);
            ui_cli::print_project_list(&tr, &store.list()?);
        }
        Cmd::Compare => {
            let store = app::open_store(&cfg);
            ui_cli::print_comparison(&tr, &store.list()?);
        }
        Cmd::Delete { id } => {
            let mut store = app::open_store(&cfg);
            store.delete(&id)?;
            println!("{}", tr.t("project.deleted"));
        }
        Cmd::Show { id } => {
            let store = app::open_store(&cfg);
            let project = store.get(&id)?;
            println!("{} ({})", project.name, project.created_at.format("%d/%m/%Y %H:%M"));
            ui_cli::print_report(&tr, &project.inputs, &project.inputs.results());
        }
        Cmd::Estimate {
            location,
            plot_size,
        } => {
            if location.trim().is_empty() {
                bail!(tr.t("ai.need_location"));
            }
            let ai = app::ai_service(&cfg.ai);
            let price = ai.estimate_plot_price(&location, plot_size)?;
            if price > 0.0 {
                println!("{}", currency(price));
            } else {
                println!("{}", tr.t("ai.estimate_failed"));
            }
        }
        Cmd::Analyze { inputs } => {
            let inputs = inputs.apply(&cfg.defaults);
            let ai = app::ai_service(&cfg.ai);
            let text = ai.analyze(&inputs, &inputs.results())?;
            println!("{text}");
        }
        Cmd::Visualize { image, prompt, out } => {
            let bytes =
                fs::read(&image).with_context(|| format!("reading {}", image.display()))?;
            let payload = ImagePayload::from_bytes(bytes)?;
            payload.decode()?;
            let ai = app::ai_service(&cfg.ai);
            let generated = ai.generate_visualization(&payload, &prompt)?;
            fs::write(&out, &generated.data)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{}", out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults_only_where_given() {
        let cli = Cli::parse_from([
            "domos_cli",
            "calc",
            "--plot-size",
            "400",
            "--sale-price",
            "€ 4 500",
            "--coefficient",
            "1,2",
        ]);
        let Some(Cmd::Calc { inputs, json }) = cli.command else {
            panic!("expected calc");
        };
        assert!(!json);
        let inputs = inputs.apply(&ProjectInputs::default());
        assert_eq!(inputs.plot_size, 400.0);
        assert_eq!(inputs.sale_price_per_sqm, 4500.0);
        assert_eq!(inputs.building_coefficient, 1.2);
        assert_eq!(inputs.plot_price, 150_000.0);
        assert_eq!(inputs.location, "Athens, Greece");
    }

    #[test]
    fn negative_amounts_are_accepted_as_values() {
        let cli = Cli::try_parse_from([
            "domos_cli",
            "calc",
            "--plot-size",
            "-100",
            "--misc-percent",
            "-2.5",
            "--json",
        ])
        .expect("negative values parse");
        let Some(Cmd::Calc { inputs, json }) = cli.command else {
            panic!("expected calc");
        };
        assert!(json);
        let inputs = inputs.apply(&ProjectInputs::default());
        assert_eq!(inputs.plot_size, -100.0);
        assert_eq!(inputs.misc_costs_percent, -2.5);
        assert!(!inputs.warnings().is_empty());

        let cli = Cli::try_parse_from(["domos_cli", "estimate", "Voula", "--plot-size", "-1"])
            .expect("negative plot size parses");
        assert!(matches!(cli.command, Some(Cmd::Estimate { plot_size, .. }) if plot_size == -1.0));
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::parse_from(["domos_cli", "--lang", "el"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.lang, "el");
    }
}
