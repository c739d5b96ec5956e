use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Serialize;

use crate::{
    error::Result,
    http,
    model::{ChartImage, ForecastSeries},
};

use super::{ChartRenderer, ProviderId};

const PROVIDER: ProviderId = ProviderId::QuickChart;
const PNG: &str = "image/png";

#[derive(Debug, Clone)]
pub struct QuickChartRenderer {
    base_url: String,
    http: Client,
}

impl QuickChartRenderer {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { base_url, http }
    }
}

#[derive(Debug, Serialize)]
struct QcRequest<'a> {
    chart: QcChart<'a>,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct QcChart<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: QcData<'a>,
    options: QcOptions<'a>,
}

#[derive(Debug, Serialize)]
struct QcData<'a> {
    labels: Vec<String>,
    datasets: Vec<QcDataset<'a>>,
}

#[derive(Debug, Serialize)]
struct QcDataset<'a> {
    label: &'a str,
    data: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct QcOptions<'a> {
    title: QcTitle<'a>,
}

#[derive(Debug, Serialize)]
struct QcTitle<'a> {
    display: bool,
    text: &'a str,
}

fn line_chart<'a>(title: &'a str, series: &ForecastSeries) -> QcRequest<'a> {
    QcRequest {
        chart: QcChart {
            kind: "line",
            data: QcData {
                labels: series.labels(),
                datasets: vec![QcDataset { label: "Temperatures", data: series.temperatures() }],
            },
            options: QcOptions { title: QcTitle { display: true, text: title } },
        },
        format: "png",
    }
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn render_line(&self, title: &str, series: &ForecastSeries) -> Result<ChartImage> {
        let url = format!("{}/chart", self.base_url.trim_end_matches('/'));
        let request = self.http.post(url).json(&line_chart(title, series));

        let res = http::send(PROVIDER, "chart", request).await?;
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or(PNG)
            .to_string();

        let bytes = http::success_body(PROVIDER, "chart", res).await?;

        Ok(ChartImage { content_type, bytes })
    }
}
