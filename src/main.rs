use anyhow::{Context, Result};
use clap::Parser;
use euler_fluid_sim::{load_config, EulerSim, Field2};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Headless driver: steps the simulation at a fixed frame rate and dumps pressure frames.
#[derive(Parser, Debug)]
#[command(name = "euler-fluid", version, about = "Staggered-grid Euler fluid simulator")]
struct Cli {
    /// YAML configuration; defaults are used when the file does not exist
    #[arg(short, long, default_value = "euler.yaml")]
    config: PathBuf,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Override the configured cell size
    #[arg(long)]
    cell_size: Option<f32>,

    /// Override the configured relaxation sweeps per frame
    #[arg(long)]
    iterations: Option<usize>,

    /// Directory for PGM pressure frames; nothing is written when omitted
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write every n-th frame (0 writes only the last one)
    #[arg(long, default_value_t = 0)]
    every: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn pressure_to_luma(pressure: &Field2, out: &mut Vec<u8>) {
    let grid = pressure.grid();
    let width = grid.width();
    let height = grid.height();
    out.resize(width * height, 0);
    for y in 0..height {
        for x in 0..width {
            let t = pressure.get(x, y).clamp(0.0, 1.0);
            out[y * width + x] = (t * 255.0) as u8;
        }
    }
}

fn write_pgm(path: &Path, width: usize, height: usize, luma: &[u8]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write!(writer, "P5\n{width} {height}\n255\n")?;
    writer.write_all(luma)?;
    writer.flush()?;
    Ok(())
}

fn should_write(frame: u64, last: u64, every: u64) -> bool {
    if every == 0 {
        frame == last
    } else {
        frame % every == 0 || frame == last
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(cell_size) = cli.cell_size {
        config.cell_size = cell_size;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    let mut sim = EulerSim::new(&config).context("building simulation")?;

    if let Some(dir) = &cli.out {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut luma = Vec::new();
    for _ in 0..cli.frames {
        let report = sim
            .advance(cli.dt)
            .with_context(|| format!("advancing frame {}", sim.frame() + 1))?;
        if report.projection.skipped_cells > 0 && report.frame == 1 {
            log::warn!(
                "{} open cell(s) have no open neighbour and are never corrected",
                report.projection.skipped_cells
            );
        }
        let Some(dir) = &cli.out else {
            continue;
        };
        if !should_write(report.frame, cli.frames, cli.every) {
            continue;
        }
        let pressure = sim.pressure_field();
        pressure_to_luma(&pressure, &mut luma);
        let grid = pressure.grid();
        let path = dir.join(format!("pressure_{:05}.pgm", report.frame));
        write_pgm(&path, grid.width(), grid.height(), &luma)?;
        log::info!(
            "frame {} written to {} (max speed {:.2}, energy {:.3e})",
            report.frame,
            path.display(),
            report.max_speed,
            report.kinetic_energy,
        );
    }

    log::info!("simulated {} frame(s)", sim.frame());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use euler_fluid_sim::Grid2;

    #[test]
    fn luma_maps_unit_interval_to_bytes() {
        let grid = Grid2::new(3, 1, 1.0);
        let field = Field2::from_fn(grid, |x, _| x as f32 * 0.5);
        let mut luma = Vec::new();
        pressure_to_luma(&field, &mut luma);
        assert_eq!(luma, vec![0, 127, 255]);
    }

    #[test]
    fn write_schedule() {
        assert!(should_write(10, 10, 0));
        assert!(!should_write(5, 10, 0));
        assert!(should_write(4, 10, 2));
        assert!(!should_write(5, 10, 2));
        assert!(should_write(10, 10, 3));
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "euler-fluid",
            "--frames",
            "3",
            "--cell-size",
            "80",
            "--every",
            "2",
        ]);
        assert_eq!(cli.frames, 3);
        assert_eq!(cli.cell_size, Some(80.0));
        assert_eq!(cli.every, 2);
        assert_eq!(cli.out, None);
    }
}
