//! Plotly figure construction
//!
//! Builds the scatter figure the browser renders, and hands back the point
//! table it used so hover indices can be resolved against exactly the order
//! the markers were emitted in.

use crate::dataset::{Dataset, MarkerColor};
use serde::Serialize;

/// Seven-stop scale: non-burst spike (grey), then 1st..6th spike in a burst.
pub const COLORSCALE: [(f64, &str); 7] = [
    (0.0, "rgb(128,128,128)"),
    (0.10, "rgb(255,0,0)"),
    (0.25, "rgb(0,255,0)"),
    (0.45, "rgb(255,0,255)"),
    (0.65, "rgb(255,255,0)"),
    (0.85, "rgb(0,0,255)"),
    (1.0, "rgb(255,128,0)"),
];

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    /// Inter-spike interval, milliseconds. Missing values serialize as `null`.
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
    pub z: Vec<i64>,
    pub text: Vec<String>,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub colorscale: Vec<(f64, &'static str)>,
    pub line: Line,
    pub reversescale: bool,
    pub sizeref: f64,
    pub sizemode: &'static str,
    pub opacity: f64,
    pub size: Vec<Option<f64>>,
    pub color: Vec<Option<MarkerColor>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub font: Font,
    pub hovermode: &'static str,
    pub showlegend: bool,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub family: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
}

/// Image references in marker order. Index `i` is Plotly's `pointNumber`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTable {
    pics: Vec<String>,
}

impl PointTable {
    pub fn len(&self) -> usize {
        self.pics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pics.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.pics.get(index).map(String::as_str)
    }
}

impl FromIterator<String> for PointTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            pics: iter.into_iter().collect(),
        }
    }
}

/// A figure together with the point order it was built with.
#[derive(Debug, Clone)]
pub struct ChartPlan {
    pub figure: Figure,
    pub points: PointTable,
}

/// Build the ISI/amplitude scatter from the dataset.
pub fn build(dataset: &Dataset) -> ChartPlan {
    let n = dataset.len();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    let mut size = Vec::with_capacity(n);
    let mut color = Vec::with_capacity(n);
    let mut text = Vec::with_capacity(n);

    // Single pass: every per-point array and the point table share one order.
    for row in dataset.iter() {
        x.push(row.isi.map(|s| s * 1000.0));
        y.push(row.amp);
        z.push(row.sample);
        size.push(row.size);
        color.push(row.color.clone());
        text.push(row.pic.clone());
    }

    let points = text.iter().cloned().collect();

    let trace = Trace {
        kind: "scatter",
        mode: "markers",
        x,
        y,
        z,
        text,
        marker: Marker {
            colorscale: COLORSCALE.to_vec(),
            line: Line { color: "#444" },
            reversescale: false,
            sizeref: 45.0,
            sizemode: "diameter",
            opacity: 0.7,
            size,
            color,
        },
    };

    let layout = Layout {
        font: Font { family: "Raleway" },
        hovermode: "closest",
        showlegend: false,
        xaxis: Axis {
            kind: "log",
            title: "inter-spike interval (ms)",
        },
        yaxis: Axis {
            kind: "linear",
            title: "extracellular spike amplitude (μV)",
        },
    };

    ChartPlan {
        figure: Figure {
            data: vec![trace],
            layout,
        },
        points,
    }
}
