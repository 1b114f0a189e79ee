use std::{
    ffi::OsString,
    io::{self, Write},
    process::ExitCode,
};

use clap::{CommandFactory, Parser};
use log::{debug, info};
use mergebin::{
    merge_files, parse_pad, parse_positionals, parse_size, AssemblyReport, InputSpec, Limits,
    MergeError, OutputSpec, Positionals,
};

/// Exit status for every failure, `-1` as a process status.
const EXIT_FAILURE: u8 = 255;

const NOTICE: &str = "\
Notice:
    Offset is an address or '+' (follow the previous file);
    Offsets start at 0x00000000 by default;
    Offsets MUST be given from low to high;

Example:
    mergebin 0x00000000@boot.bin 0x00002000@app.bin firmware.bin
    mergebin +@boot.bin +@app.bin firmware.bin";

/// Merge up to eight binary files into one image at fixed offsets
#[derive(Debug, Parser)]
#[command(name = "mergebin", version, after_help = NOTICE)]
struct Cli {
    /// Output file size, tail is padded up to it [default: not padded]
    #[arg(short, long, value_name = "SIZE", allow_hyphen_values = true)]
    size: Option<String>,

    /// Byte used to pad free space
    #[arg(
        short,
        long,
        value_name = "PADBYTE",
        default_value = "0xFF",
        allow_hyphen_values = true
    )]
    pad: String,

    /// Inputs as <offset>@<path>, then an optional output path [default: output.bin]
    #[arg(value_name = "OFFSET@INPUT")]
    files: Vec<OsString>,
}

impl Cli {
    /// Validates everything before any file is opened.
    fn into_job(self, limits: &Limits) -> Result<(Vec<InputSpec>, OutputSpec), MergeError> {
        let target_size = self
            .size
            .as_deref()
            .map(|s| parse_size(s, limits))
            .transpose()?;
        let pad_byte = parse_pad(&self.pad)?;
        let Positionals { inputs, output } = parse_positionals(&self.files, limits)?;

        debug!("size: {target_size:?}, pad: 0x{pad_byte:02x}, output: {}", output.display());

        let output = OutputSpec {
            path: output,
            target_size,
            pad_byte,
        };
        Ok((inputs, output))
    }
}

fn print_layout(report: &AssemblyReport) {
    info!("{:10} {:10} {:10} Input", "Offset", "End", "Size");
    for p in &report.placements {
        info!(
            "0x{:08x} 0x{:08x} 0x{:08x} {}",
            p.offset,
            p.offset + p.size,
            p.size,
            p.path.display()
        );
    }
    info!("Image size: 0x{:08x}", report.len);
}

fn run(cli: Cli, out: &mut impl Write) -> Result<(), MergeError> {
    let limits = Limits::default();
    let (inputs, output) = cli.into_job(&limits)?;

    let report = merge_files(&inputs, &output, &limits)?;
    if let Some(target) = report.target_exceeded {
        let _ = writeln!(
            out,
            "WARNING: Output file size is larger than expected ({} > {target} bytes)!",
            report.len
        );
    }
    print_layout(&report);

    Ok(())
}

/// Runs the tool on `args` (program name first), writing every message to
/// `out`, and returns the process exit status.
fn main_with<I, T>(args: I, out: &mut impl Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        let _ = Cli::command().write_help(out);
        return 0;
    }

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let rendered = e.render().to_string();
            let first = rendered.lines().next().unwrap_or_default();
            let _ = writeln!(
                out,
                "Illegal or unrecognized options: {}",
                first.trim_start_matches("error: ")
            );
            return EXIT_FAILURE;
        }
        Err(e) => {
            let _ = write!(out, "{}", e.render());
            return 0;
        }
    };

    match run(cli, out) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(out, "{e}");
            EXIT_FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    ExitCode::from(main_with(std::env::args_os(), &mut io::stdout().lock()))
}
