//! Start-up configuration and the immutable application context

use crate::chart::{self, ChartPlan, Figure, PointTable};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "bursts.csv";
pub const DEFAULT_PORT: u16 = 8001;
/// Spike shown before the user has interacted with the chart.
pub const DEFAULT_STARTING_SAMPLE: i64 = 4591;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    /// Directory spike images are served from. Defaults to the data file's directory.
    pub image_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub starting_sample: i64,
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            image_dir: None,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            starting_sample: DEFAULT_STARTING_SAMPLE,
            open_browser: true,
        }
    }
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn image_dir(&self) -> PathBuf {
        match &self.image_dir {
            Some(dir) => dir.clone(),
            None => self
                .data_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf(),
        }
    }
}

/// Everything the server needs, built once and then only borrowed.
#[derive(Debug)]
pub struct AppContext {
    config: Config,
    dataset: Dataset,
    chart: ChartPlan,
    starting_image: String,
}

impl AppContext {
    pub fn init(config: Config) -> Result<Self> {
        let dataset = Dataset::load(&config.data_path)?;
        Self::from_dataset(config, dataset)
    }

    pub fn from_dataset(config: Config, dataset: Dataset) -> Result<Self> {
        let starting_image = dataset
            .find_by_sample(config.starting_sample)
            .map(|row| row.pic.trim().to_string())
            .ok_or(Error::StartingSampleMissing {
                sample: config.starting_sample,
            })?;
        let chart = chart::build(&dataset);

        Ok(Self {
            config,
            dataset,
            chart,
            starting_image,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn figure(&self) -> &Figure {
        &self.chart.figure
    }

    pub fn points(&self) -> &PointTable {
        &self.chart.points
    }

    pub fn starting_image(&self) -> &str {
        &self.starting_image
    }
}
