//! Stage a piece on disk for the duration of a single operation.

use super::Error;
use futures::io::{copy, AllowStdIo, AsyncRead};
use std::{
    future::Future,
    path::{Path, PathBuf},
};
use tracing::{trace, warn};

/// Copy `reader` into a fresh temporary file in `dir` and run `f` with the path of that file.
///
/// `size` is the expected length of `reader`. It is only used to flag mismatches.
///
/// The file is closed before `f` runs and removed once `f` completes, regardless of its outcome.
/// If staging the piece fails, `f` is never run and the partially written file is discarded.
///
/// The error of `f` is returned unchanged. Failing to remove the file after `f` succeeds is
/// reported as [Error::Io], while failing to remove it after `f` fails is only logged.
pub(crate) async fn with_temp<R, F, Fut, T>(
    dir: &Path,
    prefix: &str,
    reader: R,
    size: u64,
    f: F,
) -> Result<T, Error>
where
    R: AsyncRead,
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    // Dropping the file at any point before `into_temp_path` removes it
    let mut file = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
    let copied = copy(reader, &mut AllowStdIo::new(file.as_file_mut())).await?;
    let path = file.into_temp_path();
    if copied != size {
        warn!(path = ?&*path, copied, size, "staged piece size mismatch");
    } else {
        trace!(path = ?&*path, copied, "staged piece");
    }

    // Run the operation and cleanup
    let result = f(path.to_path_buf()).await;
    match result {
        Ok(value) => {
            path.close()?;
            Ok(value)
        }
        Err(err) => {
            let staged = path.to_path_buf();
            if let Err(cleanup) = path.close() {
                warn!(path = ?staged, ?cleanup, "failed to remove staged piece");
            }
            Err(err)
        }
    }
}
