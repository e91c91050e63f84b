use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use edgeclass_core::ModelArtifact;
use edgeclass_runtime::{ChannelOrder, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "edgeclass", version, about = "Classify one image on an inference accelerator")]
pub struct Cli {
    /// Network topology (OpenVINO IR .xml)
    #[arg(long, default_value = "graph1.xml")]
    pub model: PathBuf,

    /// Network weights (OpenVINO IR .bin)
    #[arg(long, default_value = "graph1.bin")]
    pub weights: PathBuf,

    /// Image to classify
    #[arg(long, default_value = "input_image.jpg")]
    pub image: PathBuf,

    /// Accelerator to run on (MYRIAD, CPU, GPU, ...)
    #[arg(long, default_value = "MYRIAD")]
    pub device: String,

    /// Number of ranked classes to print
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    /// Order of colour planes in the input tensor (bgr or rgb)
    #[arg(long, default_value = "bgr")]
    pub channel_order: ChannelOrder,

    /// Give up waiting for the device after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level (RUST_LOG)
    #[arg(long, default_value = "warn")]
    pub log: String,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            artifact: ModelArtifact::new(&self.model, &self.weights),
            image: self.image.clone(),
            device: self.device.clone(),
            top_k: self.top_k,
            channel_order: self.channel_order,
            wait_timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}
