use std::{
    io,
    num::NonZeroU64,
    path::{Path, PathBuf},
    process::exit,
};

use clap::{crate_version, Args, Parser};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use zonebench_core::{
    driver::{ExperimentDriver, Mode, RunSummary},
    fill::FillFraction,
    recorder::CsvRecorder,
    store::ZoneStore,
    zone::{ReportFilter, ZoneType},
    zoned_file::ZonedFile,
    Error,
    Result,
    ZoneT,
};

/// How to open the device.  Shared by every subcommand.
#[derive(Args, Clone, Debug)]
struct DeviceOpts {
    /// Emulate zones of this many MiB on devices without native zones
    #[clap(long, global = true, value_name = "MiB")]
    zone_size: Option<NonZeroU64>,
    /// Go through the page cache instead of using O_DIRECT
    #[clap(long, global = true)]
    buffered:  bool,
}

impl DeviceOpts {
    fn open(&self, device: &Path) -> Result<ZonedFile> {
        let sim_zone_size = self.zone_size
            .and_then(|mib| NonZeroU64::new(mib.get().saturating_mul(1 << 20)));
        ZonedFile::open(device, !self.buffered, sim_zone_size)
    }

    /// Run one experiment, appending its results to `result_file`.
    fn run(&self, device: &Path, request_size: usize, result_file: &Path,
           mode: &Mode) -> Result<RunSummary>
    {
        let zf = self.open(device)?;
        let recorder = CsvRecorder::open(result_file)?;
        let mut driver = ExperimentDriver::new(zf, recorder, request_size)?;
        let summary = driver.run(mode)?;
        println!("{summary}");
        Ok(summary)
    }
}

#[derive(Parser, Clone, Debug)]
/// Write one request to each of the first zones, then reset them all
struct Allocation {
    /// Zoned block device, or a file with --zone-size
    device:       PathBuf,
    /// Bytes per write request
    request_size: usize,
    /// Append results to this file
    result_file:  PathBuf,
    /// Percentage of the device's zones to allocate
    percentage:   FillFraction,
}

impl Allocation {
    fn main(self, opts: &DeviceOpts) -> Result<()> {
        let mode = Mode::Allocation{percent: self.percentage};
        opts.run(&self.device, self.request_size, &self.result_file, &mode)
            .map(drop)
    }
}

#[derive(Parser, Clone, Debug)]
/// Fill a single zone to some percentage of its capacity
struct Interference {
    /// Zoned block device, or a file with --zone-size
    device:       PathBuf,
    /// Bytes per write request
    request_size: usize,
    /// Index of the zone to fill
    zone_index:   ZoneT,
    /// Append results to this file
    result_file:  PathBuf,
    /// Percentage of the zone's capacity to fill
    percentage:   FillFraction,
}

impl Interference {
    fn main(self, opts: &DeviceOpts) -> Result<()> {
        let mode = Mode::Interference {
            zone: self.zone_index,
            percent: self.percentage
        };
        opts.run(&self.device, self.request_size, &self.result_file, &mode)
            .map(drop)
    }
}

#[derive(Parser, Clone, Debug)]
/// Fill successive zones to the given percentages, and time finishing each
struct Occupancy {
    /// Zoned block device, or a file with --zone-size
    device:       PathBuf,
    /// Bytes per write request
    request_size: usize,
    /// Append results to this file
    result_file:  PathBuf,
    /// Fill percentage for each zone, starting with zone 0
    #[clap(required(true), num_args(1..))]
    percentages:  Vec<FillFraction>,
}

impl Occupancy {
    fn main(self, opts: &DeviceOpts) -> Result<()> {
        let mode = Mode::Occupancy{percents: self.percentages};
        opts.run(&self.device, self.request_size, &self.result_file, &mode)
            .map(drop)
    }
}

#[derive(Parser, Clone, Debug)]
/// Print a device's zones
struct Report {
    #[clap(short = 'p', long, help = "Scriptable output")]
    parseable: bool,
    /// Only show zones in this condition: all, empty, imp-open, exp-open,
    /// closed, full, ro, offline, not-wp, or usable
    #[clap(short = 'f', long, default_value = "all")]
    filter:    ReportFilter,
    /// Zoned block device, or a file with --zone-size
    device:    PathBuf,
}

si_scale::scale_fn!(bibytes0,
                    base: B1024,
                    constraint: UnitAndAbove,
                    mantissa_fmt: "{:.0}",
                    groupings: '_',
                    unit: "B");

impl Report {
    fn main(self, opts: &DeviceOpts) -> Result<()> {
        let zf = opts.open(&self.device)?;
        let info = zf.info();
        let zones = zf.list_zones(self.filter)
            .map_err(Error::ZoneQueryFailed)?;
        info!(nr_zones = info.nr_zones, emulated = info.emulated,
              "Reporting {} zones", zones.len());

        if self.parseable {
            for z in zones.iter() {
                println!("{}\t{}\t{}\t{}\t{}\t{}\t{}",
                         info.zone_index(z), z.start, z.length, z.capacity,
                         z.write_pointer, z.zone_type, z.condition);
            }
        } else {
            let mut table = tabular::Table::new(
                "{:>}  {:>}  {:>}  {:>}  {:>}  {:<}  {:<}");
            table.add_row(tabular::Row::new()
                .with_cell("ZONE")
                .with_cell("START")
                .with_cell("LENGTH")
                .with_cell("CAPACITY")
                .with_cell("WP")
                .with_cell("TYPE")
                .with_cell("COND"));
            for z in zones.iter() {
                let wp = if z.zone_type == ZoneType::Conventional {
                    String::from("-")
                } else {
                    format!("{:#x}", z.write_pointer)
                };
                table.add_row(tabular::Row::new()
                    .with_cell(info.zone_index(z))
                    .with_cell(format!("{:#x}", z.start))
                    .with_cell(bibytes0(z.length as f64))
                    .with_cell(bibytes0(z.capacity as f64))
                    .with_cell(wp)
                    .with_cell(z.zone_type)
                    .with_cell(z.condition));
            }
            print!("{table}");
        }
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
enum SubCommand {
    Allocation(Allocation),
    Interference(Interference),
    Occupancy(Occupancy),
    Report(Report),
}

#[derive(Parser, Clone, Debug)]
#[clap(version = crate_version!())]
/// Benchmark zoned storage devices
struct Cli {
    #[clap(flatten)]
    dev: DeviceOpts,
    #[clap(subcommand)]
    cmd: SubCommand,
}

fn main() {
    tracing_subscriber::fmt()
        .pretty()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy())
        .init();
    let cli: Cli = Cli::parse();
    let r = match cli.cmd {
        SubCommand::Allocation(allocation) => allocation.main(&cli.dev),
        SubCommand::Interference(interference) => interference.main(&cli.dev),
        SubCommand::Occupancy(occupancy) => occupancy.main(&cli.dev),
        SubCommand::Report(report) => report.main(&cli.dev),
    };
    if let Err(e) = r {
        eprintln!("Error: {e}");
        exit(1);
    }
}
