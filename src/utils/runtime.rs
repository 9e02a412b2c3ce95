use anyhow::Result;

/// Everything in playtrack is cooperative, one thread is plenty.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
