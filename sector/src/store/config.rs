use std::path::PathBuf;

/// Configuration for the [Dispatcher](super::Dispatcher) and its [Store](super::Store).
#[derive(Clone, Debug)]
pub struct Config {
    /// The number of completions buffered for each subscription (at least one).
    ///
    /// Once a subscription's buffer is full, dispatch stalls until the subscriber catches up.
    pub subscription_size: usize,

    /// The directory pieces are staged in before being handed to the sealer.
    pub temp_dir: PathBuf,

    /// The prefix of staged piece files.
    pub temp_prefix: String,
}
