#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to spawn detection worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("start called from the detection worker while it is stopping")]
    StartFromWorker,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
