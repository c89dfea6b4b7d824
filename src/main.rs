// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use function_plotter::{
    eval::Bindings,
    render,
    session::{ExpressionId, Session},
    shell::{self, Command},
    Number, PlotError, Point, ViewRect, Viewport,
};
use std::{
    fs::{File, OpenOptions},
    io::{self, stdin, stdout, BufRead, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const ZOOM_IN: Number = 0.9;
const ZOOM_OUT: Number = 1.1;
const MAX_OUTPUT_ATTEMPTS: u32 = 1000;

#[derive(Parser, Debug)]
#[command(name = "function_plotter")]
#[command(about = "Plot y = f(x) curves and g(x, y) = 0 relations to SVG", long_about = None)]
struct Args {
    /// Expressions to start with
    #[arg(default_values_t = [String::from("sin(x)"), String::from("x^2 + y^2 - 25")])]
    expressions: Vec<String>,

    /// Width of the drawing in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Height of the drawing in pixels
    #[arg(long, default_value_t = 700)]
    height: u32,

    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    x_min: Number,

    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    x_max: Number,

    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    y_min: Number,

    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    y_max: Number,

    /// Reject malformed expressions instead of plotting what parses
    #[arg(long)]
    strict: bool,

    /// Directory plots are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Write debug logs to the specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn output_svg_filename(now: DateTime<Local>, attempt: u32) -> String {
    let stamp = now.format("%Y-%m-%d_%H-%M-%S");
    if attempt == 0 {
        format!("{}_output-{stamp}.svg", env!("CARGO_PKG_NAME"))
    } else {
        format!("{}_output-{stamp}-{attempt}.svg", env!("CARGO_PKG_NAME"))
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = log {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(anyhow::Error::msg)
            .context("failed to install logger")?;
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .map_err(anyhow::Error::msg)
            .context("failed to install logger")?;
    }
    Ok(())
}

#[derive(Debug)]
struct State {
    session: Session,
    viewport: Viewport,
    output_dir: PathBuf,
}

impl State {
    fn center(&self) -> Point<Number> {
        Point::new(self.viewport.width() / 2.0, self.viewport.height() / 2.0)
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;
    tracing::info!("starting {}", env!("CARGO_PKG_NAME"));

    let viewport = Viewport::new(args.width, args.height)
        .context("width and height must be greater than zero")?;
    let rect = ViewRect::new(args.x_min, args.x_max, args.y_min, args.y_max)
        .context("window bounds must be finite with min < max")?;
    let mut state = State {
        session: Session::new(viewport)
            .with_strict(args.strict)
            .with_view(rect),
        viewport,
        output_dir: args.output_dir,
    };

    let mut stdout = BufWriter::new(stdout());
    for text in &args.expressions {
        add_expr(&mut stdout, &mut state, text)?;
    }

    let mut inp = stdin().lock();
    loop {
        writeln!(
            stdout,
            "{count} expression(s), window = {rect}",
            count = state.session.expressions().count(),
            rect = state.session.view().rect(),
        )?;

        let Some(mut try_cmd) = shell::input(&mut inp, &mut stdout, "> ")? else {
            writeln!(stdout)?;
            break;
        };
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Add => {
                    if let Some(text) = shell::input(&mut inp, &mut stdout, "expression = ")? {
                        if !text.is_empty() {
                            add_expr(&mut stdout, &mut state, &text)?;
                        }
                    }
                }

                Command::Remove => {
                    if let Some(id) = read_id(&mut inp, &mut stdout)? {
                        match state.session.remove(id) {
                            Ok(expr) => writeln!(stdout, "removed {id}: {}", expr.text)?,
                            Err(err) => report(&mut stdout, err)?,
                        }
                    }
                }

                Command::Clear => {
                    state.session.clear_all();
                    writeln!(stdout, "all expressions removed")?;
                }

                Command::List => shell::list_expressions(&mut stdout, state.session.expressions())?,

                Command::Window => set_win(&mut inp, &mut stdout, &mut state)?,

                Command::Pan => pan(&mut inp, &mut stdout, &mut state)?,

                Command::Zoom => zoom(&mut inp, &mut stdout, &mut state)?,

                Command::ZoomIn | Command::ZoomOut => {
                    let factor = if cmd == Command::ZoomIn {
                        ZOOM_IN
                    } else {
                        ZOOM_OUT
                    };
                    let center = state.center();
                    if let Err(err) = state.session.zoom(factor, center) {
                        report(&mut stdout, err)?;
                    }
                }

                Command::Reset => state.session.reset_view(),

                Command::Plot => plot(&mut stdout, &mut state)?,

                Command::PrintProg => {
                    if let Some(id) = read_id(&mut inp, &mut stdout)? {
                        if let Some(expr) = state.session.get(id) {
                            shell::dump_program(&mut stdout, &expr.program, format_args!("{id}"))?;
                        } else {
                            shell::expr_undefined(&mut stdout, id)?;
                        }
                    }
                }

                Command::Eval => eval_expr(&mut inp, &mut stdout, &state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
            if let Some(c) = Command::similar(&try_cmd) {
                writeln!(stdout, "note: command '{}' has a similar name", c.name())?;
            }
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    tracing::info!("exiting");
    Ok(())
}

/// Print a problem the user can fix; fail on anything else.
fn report<W: Write>(mut out: W, err: PlotError) -> anyhow::Result<()> {
    match err {
        PlotError::Parse(err) => shell::report_parse_err(&mut out, &err)?,
        PlotError::UnknownExpression(id) => shell::expr_undefined(&mut out, id)?,
        PlotError::Io(err) => return Err(err).context("failed to write output"),
        err @ (PlotError::EmptyExpression | PlotError::IdsExhausted | PlotError::View(_)) => {
            writeln!(out, "error: {err}")?
        }
    }
    Ok(())
}

fn add_expr<W: Write>(mut out: W, state: &mut State, text: &str) -> anyhow::Result<()> {
    match state.session.register_expression(text) {
        Ok(id) => {
            let color = state.session.get(id).map(|expr| expr.color);
            if let Some(color) = color {
                writeln!(out, "added {id} ({color}): {}", text.trim())?;
            }
        }
        Err(err) => report(&mut out, err)?,
    }
    Ok(())
}

fn read_id<R: BufRead, W: Write>(inp: R, out: W) -> anyhow::Result<Option<ExpressionId>> {
    match shell::read_fromstr::<_, _, ExpressionId>(inp, out, "?id = ", true)? {
        Ok(id) => Ok(id),
        Err(_) => Ok(None),
    }
}

/// Prompt for each value in turn, keeping the current one on blank input.
/// `None` if any entry fails to parse.
fn read_numbers<R: BufRead, W: Write, const N: usize>(
    mut inp: R,
    mut out: W,
    fields: [(&str, Number); N],
) -> anyhow::Result<Option<[Number; N]>> {
    let mut values = fields.map(|(_, cur)| cur);
    for ((name, cur), dst) in fields.iter().zip(values.iter_mut()) {
        match shell::read_fromstr::<_, _, Number>(
            &mut inp,
            &mut out,
            format_args!("?{name} (is {cur}) = "),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(None),
        }
    }
    Ok(Some(values))
}

fn set_win<R: BufRead, W: Write>(mut inp: R, mut out: W, state: &mut State) -> anyhow::Result<()> {
    let rect = state.session.view().rect();
    writeln!(out, "win = {rect}")?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let Some([x_min, x_max, y_min, y_max]) = read_numbers(
        &mut inp,
        &mut out,
        [
            ("x min", rect.x_min()),
            ("x max", rect.x_max()),
            ("y min", rect.y_min()),
            ("y max", rect.y_max()),
        ],
    )?
    else {
        return Ok(());
    };
    if let Err(err) = state.session.set_view(x_min, x_max, y_min, y_max) {
        report(&mut out, err)?;
    }
    Ok(())
}

fn pan<R: BufRead, W: Write>(mut inp: R, mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "note: positive dx drags right, positive dy drags down")?;
    let Some([dx, dy]) = read_numbers(&mut inp, &mut out, [("dx", 0.0), ("dy", 0.0)])? else {
        return Ok(());
    };
    if let Err(err) = state.session.pan(dx, dy) {
        report(&mut out, err)?;
    }
    Ok(())
}

fn zoom<R: BufRead, W: Write>(mut inp: R, mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "note: factors below 1 zoom in")?;
    let center = state.center();
    let Some([factor, x, y]) = read_numbers(
        &mut inp,
        &mut out,
        [("factor", ZOOM_IN), ("screen x", center.x), ("screen y", center.y)],
    )?
    else {
        return Ok(());
    };
    if let Err(err) = state.session.zoom(factor, Point::new(x, y)) {
        report(&mut out, err)?;
    }
    Ok(())
}

fn eval_expr<R: BufRead, W: Write>(mut inp: R, mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(id) = read_id(&mut inp, &mut out)? else {
        return Ok(());
    };
    let Some(expr) = state.session.get(id) else {
        shell::expr_undefined(&mut out, id)?;
        return Ok(());
    };
    let Some([x, y]) = read_numbers(&mut inp, &mut out, [("x", 0.0), ("y", 0.0)])? else {
        return Ok(());
    };

    let vars = Bindings::new(x, y);
    match expr.program.eval_strict(vars) {
        Ok(val) => writeln!(out, "{} = {val}", expr.text)?,
        Err(err) => {
            writeln!(out)?;
            shell::report_eval_err(&mut out, &expr.program, &err)?;
            writeln!(out, "plotted value: {}", expr.program.eval(vars))?;
        }
    }
    Ok(())
}

fn create_output(dir: &Path, now: DateTime<Local>) -> anyhow::Result<(PathBuf, File)> {
    for attempt in 0..MAX_OUTPUT_ATTEMPTS {
        let path = dir.join(output_svg_filename(now, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to open output file {}", path.display()))
            }
        }
    }
    anyhow::bail!("too many plots written in {} this second", dir.display())
}

fn plot<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let frame = state.session.compute_frame_geometry(state.viewport);
    let (path, file) = create_output(&state.output_dir, Local::now())?;

    let mut svg = BufWriter::new(file);
    render::write_svg(&mut svg, &frame, state.viewport)
        .and_then(|()| svg.flush())
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    drop(svg);

    let points: usize = frame.curves.iter().map(|c| c.shape.point_count()).sum();
    writeln!(
        out,
        "wrote {} ({} curve(s), {points} point(s))",
        path.display(),
        frame.curves.len(),
    )?;
    Ok(())
}
