//! burstweb - Interactive view of burst spiking
//!
//! Neurons often fire a burst of closely spaced spikes. Later spikes in a
//! burst can be much weaker when sensed extracellularly, which makes them
//! harder to detect. burstweb plots extracellular spike amplitude against
//! inter-spike interval and, when a point is hovered or clicked, shows the
//! intra- and extracellular recording of that spike next to the chart.
//!
//! Data: Allen, B.D., Moore-Kochlacs, C., Bernstein, J.G., et al. (2018).
//! Automated in vivo patch clamp evaluation of extracellular multielectrode
//! array spike recording capability. J Neurophysiol.
//!
//! # Quick Start
//!
//! ```no_run
//! use burstweb::{AppContext, Config, HoverEvent};
//!
//! let ctx = AppContext::init(Config::default())?;
//! println!("starting image: {}", ctx.starting_image());
//!
//! let pic = burstweb::resolve(ctx.points(), Some(&HoverEvent::at(2)))?;
//! println!("point 2 shows {:?}", pic);
//! # Ok::<(), burstweb::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: CSV loading into the immutable spike table
//! - [`chart`]: Plotly figure plus the point order it was built with
//! - [`resolver`]: hover/click event → image reference
//! - [`context`]: start-up configuration and the shared application context
//! - [`serve`]: HTTP front end

pub mod chart;
pub mod context;
pub mod dataset;
pub mod error;
pub mod page;
pub mod resolver;
pub mod serve;

pub use chart::{ChartPlan, Figure, PointTable};
pub use context::{AppContext, Config};
pub use dataset::{Dataset, MarkerColor, SpikeRow};
pub use error::{Error, Result};
pub use resolver::{parse_event, resolve, HoverEvent, HoverPoint};
