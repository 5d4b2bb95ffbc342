//! HTML page with the Plotly scatter and the spike image panel

use crate::context::AppContext;
use std::io::{self, Write};

pub const TITLE: &str = "Ground truth neurotechnology";

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const EXTERNAL_CSS: [&str; 4] = [
    "https://cdnjs.cloudflare.com/ajax/libs/skeleton/2.0.4/skeleton.min.css",
    "//fonts.googleapis.com/css?family=Dosis:400,300,600",
    "//fonts.googleapis.com/css?family=Dosis:Medium",
    "https://cdn.rawgit.com/plotly/dash-app-stylesheets/0e463810ed36927caf20372b6411690692f94819/dash-drug-discovery-demo-stylesheet.css",
];

pub fn render(ctx: &AppContext) -> io::Result<String> {
    let mut buf = Vec::new();
    write(&mut buf, ctx)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn write<W: Write>(writer: &mut W, ctx: &AppContext) -> io::Result<()> {
    let figure_json = script_safe(&serde_json::to_string(ctx.figure())?);
    let stylesheets: String = EXTERNAL_CSS
        .iter()
        .map(|href| format!("    <link rel=\"stylesheet\" href=\"{}\">\n", href))
        .collect();

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
{stylesheets}    <script src="{plotly}"></script>
    <style>
        h2.headline {{
            position: relative;
            top: 0px;
            left: 10px;
            font-family: 'Dosis';
            display: inline;
            font-size: 6.0rem;
            color: #4D637F;
        }}
        .image-panel {{ margin-top: 100px; }}
        .graph-panel {{ text-align: center; }}
        #clickable-graph {{ width: 600px; height: 600px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="row twelve columns" style="position: relative; right: 15px">
            <h2 class="headline">Burst firing: intra- and extracellular properties</h2>
        </div>
        <div class="row"><div class="twelve columns"></div></div>

        <div class="row">
            <div class="three columns image-panel">
                <img id="spike_img" src="{start}" width="300px" height="400px">
            </div>
            <div class="nine columns graph-panel">
                <div id="clickable-graph"></div>
            </div>
        </div>

        <div>
            <p>Many neurons fire a sequence of spikes, known as a burst, in response to stimuli. Waveforms of later spikes within a burst may be significantly less pronounced, making them harder to detect with an electrode placed near the neuron. This is an exploration of burst spikes as electrically sensed inside (intracellularly) and outside (extracellularly) of a single neuron, in vivo. Such recordings are rare, affording a unique opportunity to assess the limits of spike detectability with a given electrode. Mouse over the data points in the figure (right) to explore spikes (left) that occur at various positions within a burst.</p>
            <p>Left: Spikes as sensed intracellularly (top, with derivative of signal in middle), and extracellularly (bottom; filtered for spikes). Scalebar: 20ms (horiz.), 10mV/100&mu;V (vert., top/bottom)</p>
            <p>Right: Extracellular spike amplitude, colored by spike number within a burst, with respect to time since the previous spike (interspike interval). Key: non-burst spike (grey), 1st spike in burst (red), 2nd (green), 3rd (magenta), 4th (yellow), 5th (blue), 6th (orange). Hovering over a datapoint will show its corresponding spike (left; the particular spike will be centered in the x-axis)</p>
        </div>
        <p>Credit: Automated in vivo patch clamp evaluation of extracellular multielectrode array spike recording capability, by BD Allen, C Moore-Kochlacs, JG Bernstein, et al., 2018. J Neurophys: <a href="https://doi.org/10.1152/jn.00650.2017">Paper</a>. <a href="https://github.com/ewokdanceparty/burstWeb">Python source code</a>. <a href="https://github.com/ewokdanceparty/spikeval/tree/devel">Matlab source code for other paper analyses</a>.</p>
    </div>

    <script>
    const figure = {figure};
    const spikeImg = document.getElementById('spike_img');
    const graph = document.getElementById('clickable-graph');

    Plotly.newPlot(graph, figure.data, figure.layout, {{ displayModeBar: false, scrollZoom: false }});

    // Plotly point objects are cyclic; forward only the index.
    function showSpike(event) {{
        const points = (event && event.points)
            ? event.points.map(p => ({{ pointNumber: p.pointNumber }}))
            : [];
        fetch('/api/hover', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify({{ points: points }})
        }})
            .then(r => r.json())
            .then(res => {{
                if (res.ok && res.data && res.data.src) {{
                    spikeImg.src = res.data.src;
                }}
            }})
            .catch(() => {{}});
    }}

    graph.on('plotly_hover', showSpike);
    graph.on('plotly_click', showSpike);
    </script>
</body>
</html>
"#,
        title = html_escape(TITLE),
        stylesheets = stylesheets,
        plotly = PLOTLY_JS,
        start = html_escape(ctx.starting_image()),
        figure = figure_json,
    )?;

    Ok(())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Keep inline JSON from closing the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Config;
    use crate::dataset::Dataset;

    fn context(csv: &str) -> AppContext {
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        AppContext::from_dataset(Config::default(), ds).unwrap()
    }

    #[test]
    fn test_page_shows_starting_image() {
        let ctx = context("sample,isi,amp,SIZE,COLOR,PIC\n1,0.1,5,10,0,a.png\n4591,0.2,6,10,0,spike_4591.png\n");
        let html = render(&ctx).unwrap();
        assert!(html.contains(r#"<img id="spike_img" src="spike_4591.png""#));
        assert!(html.contains("<title>Ground truth neurotechnology</title>"));
    }

    #[test]
    fn test_credit_links() {
        let ctx = context("sample,isi,amp,SIZE,COLOR,PIC\n4591,0.2,6,10,0,spike_4591.png\n");
        let html = render(&ctx).unwrap();
        assert!(html.contains(r#"href="https://doi.org/10.1152/jn.00650.2017">Paper</a>"#));
        assert!(html.contains(">Python source code</a>"));
        assert!(html.contains(">Matlab source code for other paper analyses</a>"));
    }

    #[test]
    fn test_page_embeds_figure_and_wires_events() {
        let ctx = context("sample,isi,amp,SIZE,COLOR,PIC\n4591,0.2,6,10,0,spike_4591.png\n");
        let html = render(&ctx).unwrap();
        assert!(html.contains(r#""mode":"markers""#));
        assert!(html.contains("graph.on('plotly_hover', showSpike);"));
        assert!(html.contains("graph.on('plotly_click', showSpike);"));
        assert!(html.contains("fetch('/api/hover'"));
    }

    #[test]
    fn test_pic_cannot_break_out_of_markup() {
        let ctx = context("sample,isi,amp,SIZE,COLOR,PIC\n4591,0.2,6,10,0,\"x\"\"><script>.png\"\n");
        let html = render(&ctx).unwrap();
        assert!(html.contains(r#"src="x&quot;&gt;&lt;script&gt;.png""#));
    }

    #[test]
    fn test_script_safe() {
        assert_eq!(script_safe(r#"{"t":"</script>"}"#), r#"{"t":"<\/script>"}"#);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
