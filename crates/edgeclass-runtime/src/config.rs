use std::path::PathBuf;
use std::time::Duration;

use edgeclass_core::ModelArtifact;

use crate::ChannelOrder;

/// Everything one run needs to know.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub artifact: ModelArtifact,
    pub image: PathBuf,
    pub device: String,
    pub top_k: usize,
    pub channel_order: ChannelOrder,
    /// `None` waits for the device without limit.
    pub wait_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact: ModelArtifact::new("graph1.xml", "graph1.bin"),
            image: PathBuf::from("input_image.jpg"),
            device: "MYRIAD".to_string(),
            top_k: 5,
            channel_order: ChannelOrder::Bgr,
            wait_timeout: None,
        }
    }
}
