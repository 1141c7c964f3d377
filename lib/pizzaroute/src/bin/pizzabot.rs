use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use structopt::StructOpt;
use tracing::*;

use pizzaroute::*;
use pizzaroute::data::*;
use pizzaroute::evaluate::{evaluate, Evaluation};
use pizzaroute::formulation::{Formulation, FormulationParams};
use pizzaroute::freshness::DecayCurve;
use pizzaroute::milp::{microlp::MicroLpSolver, SolveParams};
use pizzaroute::optimize::{optimize_heuristic, solve_formulation, Outcome};

mod common;
use common::*;

#[derive(Debug, StructOpt)]
struct CurveOptions {
    /// `linear` or `stepped:<steps>`
    #[structopt(long, default_value="linear")]
    curve: DecayCurve,
    /// Freshness horizon in minutes [default: the instance's HORIZON]
    #[structopt(long, validator=clap_range_validator(Some(1i64), None))]
    horizon: Option<Time>,
}

impl CurveOptions {
    fn curve_for(&self, data: &PizzaInstance) -> DecayCurve {
        self.curve.with_horizon(self.horizon.unwrap_or_else(|| data.horizon()))
    }
}

#[derive(Debug, StructOpt)]
struct SolveArgs {
    /// Instance files, dataset names or dataset indices
    #[structopt(required=true)]
    instances: Vec<String>,
    /// Use greedy insertion instead of the MILP solver
    #[structopt(long)]
    heuristic: bool,
    /// Solver time limit in seconds
    #[structopt(long, validator=clap_range_validator(Some(0.0f64), None))]
    time_limit: Option<f64>,
    /// Relative optimality gap
    #[structopt(long, validator=clap_range_validator(Some(0.0f64), Some(1.0f64)))]
    gap: Option<f64>,
    /// Leave orders unserved instead of reporting infeasibility
    #[structopt(long)]
    allow_unserved: bool,
    #[structopt(flatten)]
    curve: CurveOptions,
    /// Write the MILP in LP format (the instance id is appended when solving several instances)
    #[structopt(long)]
    model_file: Option<PathBuf>,
    /// Directory for solution files and reports
    #[structopt(long="output-dir", short="o")]
    output_dir: Option<PathBuf>,
    /// Also write bot instruction files
    #[structopt(long)]
    instructions: bool,
    #[structopt(long="format", short="f", default_value="text", possible_values=&OUTPUT_FORMAT_STRINGS)]
    fmt: OutputFormat,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
}

#[derive(Debug, StructOpt)]
struct EvaluateArgs {
    instance: String,
    solution: PathBuf,
    #[structopt(flatten)]
    curve: CurveOptions,
    #[structopt(flatten)]
    output: OutputOptions,
}

#[derive(Debug, StructOpt)]
struct InstructionArgs {
    instance: String,
    solution: PathBuf,
    /// Bot name; all bots if omitted
    bot: Option<String>,
    #[structopt(long="output", short="o")]
    file: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Optimize routes for one or more instances
    Solve(SolveArgs),
    /// Score an existing solution file
    Evaluate(EvaluateArgs),
    /// Print the instruction file for a solution
    Instructions(InstructionArgs),
}

#[derive(Debug, StructOpt)]
#[structopt(name="pizzabot")]
struct ClArgs {
    /// JSON log file
    #[structopt(long)]
    log: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

struct Run<'a> {
    data: &'a PizzaInstance,
    outcome: Outcome,
}

impl Printable for Run<'_> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        io::outcome_json(self.data, &self.outcome).write_pretty(&mut buf, 2)?;
        writeln!(buf)?;
        Ok(())
    }

    fn write_text(&self, buf: impl Write) -> Result<()> {
        io::outcome_text(buf, self.data, &self.outcome)?;
        Ok(())
    }
}

struct Scored<'a> {
    data: &'a PizzaInstance,
    evaluation: Evaluation,
}

impl Printable for Scored<'_> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        io::evaluation_report_json(self.data, &self.evaluation).write_pretty(&mut buf, 2)?;
        writeln!(buf)?;
        Ok(())
    }

    fn write_text(&self, buf: impl Write) -> Result<()> {
        io::evaluation_text(buf, self.data, &self.evaluation)?;
        Ok(())
    }
}

fn model_path(template: &Path, id: &str, several: bool) -> PathBuf {
    if !several {
        return template.to_path_buf();
    }
    let stem = template.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = template.extension().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "lp".to_string());
    template.with_file_name(format!("{}_{}.{}", stem, id, ext))
}

#[instrument(level="info", skip(args, solver))]
fn solve_one(args: &SolveArgs, solver: &MicroLpSolver, instance: &str) -> Result<String> {
    let data = load_instance(instance)?;
    let params = FormulationParams {
        curve: args.curve.curve_for(&data),
        allow_unserved: args.allow_unserved,
        tie_break: None,
    };

    let outcome = if args.heuristic {
        optimize_heuristic(&data, params)?
    } else {
        let form = Formulation::build(&data, params)?;
        if let Some(template) = &args.model_file {
            let path = model_path(template, data.id(), args.instances.len() > 1);
            form.model.save_lp(&path).with_context(|| format!("failed to write {:?}", path))?;
            info!(?path, "wrote model");
        }
        let solve_params = SolveParams {
            time_limit: args.time_limit.map(Duration::from_secs_f64),
            mip_gap: args.gap,
        };
        solve_formulation(&form, solver, &solve_params)?
    };

    let run = Run { data: &data, outcome };
    let summary = run.render(args.fmt)?;

    if let Some(dir) = &args.output_dir {
        let dir = ArtifactDir::new(dir)?;
        std::fs::write(dir.path(data.id(), &format!(".{}", args.fmt.extension())), &summary)?;
        if let Some(report) = run.outcome.report() {
            let mut w = dir.create(data.id(), ".sol")?;
            io::write_solution(&mut w, &data, &report.solution)?;
            w.flush()?;
            if args.instructions {
                let mut w = dir.create(data.id(), "-instructions.txt")?;
                io::write_all_instructions(&mut w, &data, &report.solution)?;
                w.flush()?;
            }
        }
    }
    Ok(String::from_utf8(summary)?)
}

fn solve(args: SolveArgs) -> Result<()> {
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global()?;
    let solver = MicroLpSolver::with_max_workers(args.cpus);
    let results: Vec<_> = args.instances.par_iter()
        .map(|instance| solve_one(&args, &solver, instance).with_context(|| format!("instance {}", instance)))
        .collect();
    solver.wait_idle();

    let mut failed = 0;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in results {
        match result {
            Ok(summary) => out.write_all(summary.as_bytes())?,
            Err(e) => {
                error!("{:#}", e);
                eprintln!("error: {:#}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(anyhow!("{} of {} instances failed", failed, args.instances.len()));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.log.clone())?;
    debug!(?args);

    match args.cmd {
        Command::Solve(args) => solve(args)?,
        Command::Evaluate(args) => {
            let data = load_instance(&args.instance)?;
            let solution = io::read_solution(&data, &args.solution)?;
            let evaluation = evaluate(&data, &solution, &args.curve.curve_for(&data))?;
            args.output.emit(Scored { data: &data, evaluation })?;
        },
        Command::Instructions(args) => {
            let data = load_instance(&args.instance)?;
            let solution = io::read_solution(&data, &args.solution)?;
            let bot = match &args.bot {
                Some(name) => Some(data.bot_index(name).ok_or_else(|| anyhow!("unknown bot {}", name))?),
                None => None,
            };
            let mut buf = Vec::new();
            match bot {
                Some(b) => io::write_instructions(&mut buf, &data, &solution, b)?,
                None => io::write_all_instructions(&mut buf, &data, &solution)?,
            }
            match &args.file {
                Some(path) => {
                    let mut w = create(path)?;
                    w.write_all(&buf)?;
                    w.flush()?;
                },
                None => std::io::stdout().write_all(&buf)?,
            }
        },
    }
    Ok(())
}
