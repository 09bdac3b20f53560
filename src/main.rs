use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use volconv::{
    BatchReport, ByteFormat, ByteOrder, ConversionConfig, DataType, FileSystemIOManager,
    IOManager, Spacing, VolumeConverter, VtkEncoding,
};

#[derive(Parser, Debug)]
#[command(
    name = "volconv",
    version,
    about = "Convert microscopy TIFF stacks to raw and legacy VTK volumes."
)]
struct Cli {
    /// JSON configuration file; command line flags override its values
    #[arg(long, global = true, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stack a multi-page TIFF, or files sharing a prefix, into a raw file
    Stack2raw {
        /// Stack file, or filename prefix of the slice files
        input: PathBuf,

        /// Output file or directory
        output: Option<PathBuf>,

        /// Glob selecting slice files, relative to the prefix's directory
        glob: Option<String>,

        /// Byte order of the written elements
        #[arg(long, value_name = "little|big")]
        byte_order: Option<ByteOrder>,
    },

    /// Convert a TIFF stack, or every TIFF in a directory, to legacy VTK
    Tif2vtk {
        /// Stack file or directory of stack files
        input: PathBuf,

        /// Output file (or output directory in batch mode)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Voxel spacing
        #[arg(short, long, num_args = 3, value_names = ["SX", "SY", "SZ"])]
        spacing: Option<Vec<f64>>,

        /// Write an ASCII payload instead of binary
        #[arg(long)]
        ascii: bool,

        /// Horizontal shift per slice, in pixels (`-dskw K` is accepted too)
        #[arg(short, long, visible_alias = "dskw", allow_negative_numbers = true)]
        deskew: Option<f64>,

        /// Header title line
        #[arg(long)]
        title: Option<String>,
    },

    /// Convert a flat binary file between element formats
    Byteconv {
        #[arg(long)]
        input: Option<PathBuf>,

        /// Number of elements to convert
        #[arg(long)]
        count: Option<usize>,

        /// Source format: double, float, short, ushort, int or uint
        #[arg(long)]
        from: Option<ByteFormat>,

        /// Target format
        #[arg(long)]
        to: Option<ByteFormat>,

        /// Byte order of input and output
        #[arg(long, value_name = "little|big")]
        byte_order: Option<ByteOrder>,
    },

    /// Swap the byte order of a raw volume, writing SE_<filename>
    SwapEndian {
        x: usize,
        y: usize,
        z: usize,
        /// Element type, e.g. uint16 or float32
        dtype: DataType,
        /// Byte order of the input file
        endianness: ByteOrder,
        filename: PathBuf,
    },
}

enum Outcome {
    Done(PathBuf),
    Batch(BatchReport),
}

impl Outcome {
    fn status(&self) -> u8 {
        match self {
            Outcome::Done(_) => 0,
            Outcome::Batch(report) => report.exit_status(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_secs();
    builder.init();

    match run(cli).await {
        Ok(outcome) => {
            if let Outcome::Done(path) = &outcome {
                log::info!("Done: {}", path.display());
            }
            ExitCode::from(outcome.status())
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Rewrite the single-dash `-dskw` spelling to `--dskw`; clap would
/// otherwise read it as `-d skw`.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-dskw" { OsString::from("--dskw") } else { arg })
        .collect()
}

async fn run(cli: Cli) -> Result<Outcome> {
    let mut config = match &cli.config {
        Some(path) => ConversionConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConversionConfig::new(),
    };
    let io: Arc<dyn IOManager> = Arc::new(FileSystemIOManager::current_dir());

    match cli.command {
        Command::Stack2raw {
            input,
            output,
            glob,
            byte_order,
        } => {
            if let Some(order) = byte_order {
                config = config.with_raw_byte_order(order);
            }
            let converter = VolumeConverter::new(io, config);
            let path = converter
                .stack_to_raw(&input, output.as_deref(), glob.as_deref())
                .await
                .with_context(|| format!("converting {} to raw", input.display()))?;
            Ok(Outcome::Done(path))
        }

        Command::Tif2vtk {
            input,
            output,
            spacing,
            ascii,
            deskew,
            title,
        } => {
            if let Some(s) = spacing {
                config = config.with_spacing(Spacing::new(s[0], s[1], s[2]));
            }
            if ascii {
                config = config.with_vtk_encoding(VtkEncoding::Ascii);
            }
            if let Some(k) = deskew {
                config = config.with_deskew(k);
            }
            if let Some(title) = title {
                config = config.with_title(title);
            }
            config.validate()?;

            let is_dir = io.is_dir(&input).await?;
            let converter = VolumeConverter::new(io, config);
            if is_dir {
                let report = converter
                    .convert_directory(&input, output.as_deref())
                    .await
                    .with_context(|| format!("converting directory {}", input.display()))?;
                for (file, message) in &report.failed {
                    log::error!("{}: {}", file.display(), message);
                }
                Ok(Outcome::Batch(report))
            } else {
                let path = converter
                    .tif_to_vtk(&input, output.as_deref())
                    .await
                    .with_context(|| format!("converting {} to VTK", input.display()))?;
                Ok(Outcome::Done(path))
            }
        }

        Command::Byteconv {
            input,
            count,
            from,
            to,
            byte_order,
        } => {
            let input = match input {
                Some(p) => p,
                None => prompt("Input file")?,
            };
            let count = match count {
                Some(n) => n,
                None => prompt("Number of elements")?,
            };
            let from = match from {
                Some(f) => f,
                None => prompt("Source format (double, float, short, ushort, int, uint)")?,
            };
            let to = match to {
                Some(f) => f,
                None => prompt("Target format (double, float, short, ushort, int, uint)")?,
            };
            if let Some(order) = byte_order {
                config = config.with_byte_conv_order(order);
            }

            let converter = VolumeConverter::new(io, config);
            let path = converter
                .convert_bytes(&input, count, from, to)
                .await
                .with_context(|| format!("converting {} from {} to {}", input.display(), from, to))?;
            Ok(Outcome::Done(path))
        }

        Command::SwapEndian {
            x,
            y,
            z,
            dtype,
            endianness,
            filename,
        } => {
            let converter = VolumeConverter::new(io, config);
            let path = converter
                .swap_endian(&filename, (x, y, z), dtype, endianness)
                .await
                .with_context(|| format!("swapping byte order of {}", filename.display()))?;
            Ok(Outcome::Done(path))
        }
    }
}

/// Ask for a value on stdin
fn prompt<T>(label: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    print!("{}: ", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("no value given for {}", label.to_lowercase());
    }
    line.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {}: {}", label.to_lowercase(), e))
}
