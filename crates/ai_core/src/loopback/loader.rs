//! Artifact loader with synthetic download progress

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use domain::{ProgressEvent, VariantProfile};
use tracing::{debug, instrument};

use super::{LoopbackConfig, LoopbackModel, LoopbackTokenizer};
use crate::{
    error::InferenceError,
    ports::{ArtifactLoader, CausalModel, ComputeAdapter, ProgressCallback, Tokenizer},
};

const TOKENIZER_FILES: [&str; 2] = ["tokenizer.json", "tokenizer_config.json"];
const SIMULATED_FILE_SIZE: u64 = 4096;
const PROGRESS_STEPS: u64 = 4;

/// Hands out loopback tokenizers and models, reporting per-file progress
#[derive(Debug)]
pub struct LoopbackLoader {
    config: LoopbackConfig,
    model_loads: AtomicUsize,
}

impl LoopbackLoader {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            model_loads: AtomicUsize::new(0),
        }
    }

    /// Number of model loads performed so far
    pub fn model_loads(&self) -> usize {
        self.model_loads.load(Ordering::SeqCst)
    }

    /// Files fetched for a model, in order
    pub fn model_files(profile: &VariantProfile) -> Vec<String> {
        let graph = format!("onnx/model_{}.onnx", profile.quantization);
        let mut files = vec!["config.json".to_string(), graph.clone()];
        if profile.use_external_data_format {
            files.push(format!("{graph}_data"));
        }
        files
    }

    fn report_file(progress: &ProgressCallback, name: &str, file: &str) {
        let (name, file) = (name.to_string(), file.to_string());
        progress(ProgressEvent::Initiate {
            name: name.clone(),
            file: file.clone(),
        });
        progress(ProgressEvent::Download {
            name: name.clone(),
            file: file.clone(),
        });
        for step in 1..=PROGRESS_STEPS {
            let loaded = SIMULATED_FILE_SIZE * step / PROGRESS_STEPS;
            progress(ProgressEvent::Progress {
                name: name.clone(),
                file: file.clone(),
                progress: loaded as f64 / SIMULATED_FILE_SIZE as f64 * 100.0,
                loaded,
                total: SIMULATED_FILE_SIZE,
            });
        }
        progress(ProgressEvent::Done { name, file });
    }

    async fn simulate_fetch(&self) {
        if self.config.load_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.load_delay_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ArtifactLoader for LoopbackLoader {
    #[instrument(skip(self, profile, progress), fields(model_id = profile.model_id))]
    async fn load_tokenizer(
        &self,
        profile: &VariantProfile,
        progress: ProgressCallback,
    ) -> Result<Arc<dyn Tokenizer>, InferenceError> {
        for file in TOKENIZER_FILES {
            Self::report_file(&progress, profile.model_id, file);
        }
        self.simulate_fetch().await;
        debug!("Tokenizer ready");
        Ok(Arc::new(LoopbackTokenizer))
    }

    #[instrument(skip(self, profile, progress), fields(model_id = profile.model_id, adapter = %adapter))]
    async fn load_model(
        &self,
        profile: &VariantProfile,
        adapter: &ComputeAdapter,
        progress: ProgressCallback,
    ) -> Result<Arc<dyn CausalModel>, InferenceError> {
        for file in Self::model_files(profile) {
            Self::report_file(&progress, profile.model_id, &file);
        }
        self.simulate_fetch().await;
        self.model_loads.fetch_add(1, Ordering::SeqCst);
        debug!("Model ready");
        Ok(Arc::new(LoopbackModel::new(
            self.config.reply_prefix.clone(),
            Duration::from_millis(self.config.token_delay_ms),
        )))
    }
}
